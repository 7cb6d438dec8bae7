// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{CompanyId, Employee, EmployeeId};
use lunchegram_persistence::Persistence;
use tracing::debug;

use crate::error::PipelineError;

/// Returns the company's employees flagged available.
///
/// Employees without a chat identity are included; probing demotes them.
pub(crate) fn eligible_employees(
    store: &mut Persistence,
    company_id: CompanyId,
) -> Result<Vec<Employee>, PipelineError> {
    let employees: Vec<Employee> = store.list_available_employees(company_id)?;
    debug!(
        company_id = company_id.value(),
        eligible = employees.len(),
        "Filtered eligible employees"
    );
    Ok(employees)
}

/// Ids of the employees that can be matched: available and reachable by chat.
pub(crate) fn matching_pool(employees: &[Employee]) -> Vec<EmployeeId> {
    employees
        .iter()
        .filter(|employee| employee.is_available() && employee.chat.is_some())
        .map(|employee| employee.employee_id)
        .collect()
}
