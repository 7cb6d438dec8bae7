// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Company, person and employee mutations.

use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use lunchegram_domain::{AvailabilityState, CompanyId, DirectorySyncPlan, EmployeeId};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::DirectorySyncSummary;
use crate::diesel_schema::{companies, employees, lunch_group_members, persons};
use crate::error::PersistenceError;

backend_fn! {
/// Creates a company.
///
/// # Errors
///
/// Returns an error if the name is taken or the insert fails.
pub fn create_company(conn: &mut _, name: &str) -> Result<CompanyId, PersistenceError> {
    diesel::insert_into(companies::table)
        .values(companies::name.eq(name))
        .execute(conn)?;

    let company_id: i64 = conn.get_last_insert_rowid()?;
    info!(company_id, name, "Created company");
    Ok(CompanyId::new(company_id))
}
}

backend_fn! {
/// Creates a person.
///
/// `chat_id` binds the person's chat account; `None` means the bot cannot
/// reach them yet.
///
/// # Errors
///
/// Returns an error if the chat id is already bound or the insert fails.
pub fn create_person(
    conn: &mut _,
    username: Option<&str>,
    first_name: &str,
    last_name: &str,
    chat_id: Option<i64>,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(persons::table)
        .values((
            persons::username.eq(username),
            persons::first_name.eq(first_name),
            persons::last_name.eq(last_name),
            persons::chat_id.eq(chat_id),
        ))
        .execute(conn)?;

    let person_id: i64 = conn.get_last_insert_rowid()?;
    debug!(person_id, "Created person");
    Ok(person_id)
}
}

backend_fn! {
/// Makes a person an employee of a company.
///
/// # Errors
///
/// Returns an error if the person already works there or the insert fails.
pub fn add_employee(
    conn: &mut _,
    company_id: CompanyId,
    person_id: i64,
) -> Result<EmployeeId, PersistenceError> {
    diesel::insert_into(employees::table)
        .values((
            employees::company_id.eq(company_id.value()),
            employees::person_id.eq(person_id),
            employees::state.eq(AvailabilityState::Available.as_str()),
        ))
        .execute(conn)?;

    let employee_id: i64 = conn.get_last_insert_rowid()?;
    info!(employee_id, company_id = company_id.value(), "Added employee");
    Ok(EmployeeId::new(employee_id))
}
}

backend_fn! {
/// Sets an employee's availability.
///
/// # Errors
///
/// Returns an error if the employee does not exist or the update fails.
pub fn set_employee_state(
    conn: &mut _,
    employee_id: EmployeeId,
    state: AvailabilityState,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(employees::table)
        .filter(employees::employee_id.eq(employee_id.value()))
        .set(employees::state.eq(state.as_str()))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!("Employee {employee_id}")));
    }

    debug!(employee_id = employee_id.value(), state = state.as_str(), "Employee state updated");
    Ok(())
}
}

backend_fn! {
/// Applies a directory sync plan in one transaction.
///
/// Linkage updates are written as planned. A removed employee without any
/// lunch membership is deleted; one with memberships is deactivated instead
/// (state `unavailable`, linkage cleared) so pair history stays intact.
/// Employees that vanished since planning are skipped.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is applied in that case.
pub fn apply_directory_sync(
    conn: &mut _,
    plan: &DirectorySyncPlan,
) -> Result<DirectorySyncSummary, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut summary: DirectorySyncSummary = DirectorySyncSummary::default();

        for update in &plan.updates {
            summary.updated += diesel::update(employees::table)
                .filter(employees::employee_id.eq(update.employee_id.value()))
                .set((
                    employees::directory_id.eq(update.linkage.external_id.as_deref()),
                    employees::directory_first_name.eq(update.linkage.first_name.as_deref()),
                    employees::directory_last_name.eq(update.linkage.last_name.as_deref()),
                ))
                .execute(conn)?;
        }

        for &employee_id in &plan.removals {
            let memberships: i64 = lunch_group_members::table
                .filter(lunch_group_members::employee_id.eq(employee_id.value()))
                .count()
                .get_result(conn)?;

            if memberships == 0 {
                summary.deleted += diesel::delete(employees::table)
                    .filter(employees::employee_id.eq(employee_id.value()))
                    .execute(conn)?;
            } else {
                summary.deactivated += diesel::update(employees::table)
                    .filter(employees::employee_id.eq(employee_id.value()))
                    .set((
                        employees::state.eq(AvailabilityState::Unavailable.as_str()),
                        employees::directory_id.eq(None::<String>),
                        employees::directory_first_name.eq(None::<String>),
                        employees::directory_last_name.eq(None::<String>),
                    ))
                    .execute(conn)?;
            }
        }

        info!(
            updated = summary.updated,
            deleted = summary.deleted,
            deactivated = summary.deactivated,
            "Applied directory sync"
        );
        Ok(summary)
    })
}
}
