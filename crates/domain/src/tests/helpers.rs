// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    AvailabilityState, ChatIdentity, CompanyId, DirectoryLinkage, Employee, EmployeeId,
};

pub fn ids(raw: &[i64]) -> Vec<EmployeeId> {
    raw.iter().copied().map(EmployeeId::new).collect()
}

pub fn create_test_employee(id: i64, first_name: &str, last_name: &str) -> Employee {
    Employee {
        employee_id: EmployeeId::new(id),
        company_id: CompanyId::new(1),
        state: AvailabilityState::Available,
        username: None,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        chat: Some(ChatIdentity::new(1000 + id)),
        directory: DirectoryLinkage::default(),
    }
}

pub fn with_username(mut employee: Employee, username: &str) -> Employee {
    employee.username = Some(username.to_string());
    employee
}
