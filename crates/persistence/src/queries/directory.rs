// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Company and employee queries.

use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use lunchegram_domain::{
    AvailabilityState, ChatIdentity, CompanyId, DirectoryLinkage, Employee, EmployeeId,
};
use tracing::debug;

use crate::data_models::CompanyData;
use crate::diesel_schema::{companies, employees, persons};
use crate::error::PersistenceError;

/// Employee columns.
#[derive(Queryable, Selectable)]
#[diesel(table_name = employees)]
pub(crate) struct EmployeeRow {
    employee_id: i64,
    company_id: i64,
    state: String,
    directory_id: Option<String>,
    directory_first_name: Option<String>,
    directory_last_name: Option<String>,
}

/// Person columns an employee needs.
#[derive(Queryable, Selectable)]
#[diesel(table_name = persons)]
pub(crate) struct PersonRow {
    username: Option<String>,
    first_name: String,
    last_name: String,
    chat_id: Option<i64>,
}

/// An employee joined with its person.
#[derive(Queryable, Selectable)]
#[diesel(table_name = employees)]
pub(crate) struct EmployeeWithPersonRow {
    #[diesel(embed)]
    employee: EmployeeRow,
    #[diesel(embed)]
    person: PersonRow,
}

impl TryFrom<EmployeeWithPersonRow> for Employee {
    type Error = PersistenceError;

    fn try_from(row: EmployeeWithPersonRow) -> Result<Self, Self::Error> {
        let EmployeeWithPersonRow { employee, person } = row;
        Ok(Self {
            employee_id: EmployeeId::new(employee.employee_id),
            company_id: CompanyId::new(employee.company_id),
            state: employee.state.parse::<AvailabilityState>()?,
            username: person.username,
            first_name: person.first_name,
            last_name: person.last_name,
            chat: person.chat_id.map(ChatIdentity::new),
            directory: DirectoryLinkage {
                external_id: employee.directory_id,
                first_name: employee.directory_first_name,
                last_name: employee.directory_last_name,
            },
        })
    }
}

pub(crate) fn into_employees(rows: Vec<EmployeeWithPersonRow>) -> Result<Vec<Employee>, PersistenceError> {
    rows.into_iter().map(Employee::try_from).collect()
}

backend_fn! {
/// Lists all companies in id order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_companies(conn: &mut _) -> Result<Vec<CompanyData>, PersistenceError> {
    let rows: Vec<(i64, String)> = companies::table
        .select((companies::company_id, companies::name))
        .order(companies::company_id.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(company_id, name)| CompanyData {
            company_id: CompanyId::new(company_id),
            name,
        })
        .collect())
}
}

backend_fn! {
/// Retrieves an employee by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the employee does not exist.
pub fn get_employee(
    conn: &mut _,
    employee_id: EmployeeId,
) -> Result<Option<Employee>, PersistenceError> {
    debug!(employee_id = employee_id.value(), "Looking up employee");

    let row: Option<EmployeeWithPersonRow> = employees::table
        .inner_join(persons::table)
        .filter(employees::employee_id.eq(employee_id.value()))
        .select(EmployeeWithPersonRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Employee::try_from).transpose()
}
}

backend_fn! {
/// Lists a company's employees in id order.
///
/// With `available_only`, only employees whose state is `available` are
/// returned; this is the eligibility filter.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_employees(
    conn: &mut _,
    company_id: CompanyId,
    available_only: bool,
) -> Result<Vec<Employee>, PersistenceError> {
    let mut query = employees::table
        .inner_join(persons::table)
        .filter(employees::company_id.eq(company_id.value()))
        .into_boxed();
    if available_only {
        query = query.filter(employees::state.eq(AvailabilityState::Available.as_str()));
    }

    let rows: Vec<EmployeeWithPersonRow> = query
        .order(employees::employee_id.asc())
        .select(EmployeeWithPersonRow::as_select())
        .load(conn)?;

    into_employees(rows)
}
}

backend_fn! {
/// Lists every employee of every company in id order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_all_employees(conn: &mut _) -> Result<Vec<Employee>, PersistenceError> {
    let rows: Vec<EmployeeWithPersonRow> = employees::table
        .inner_join(persons::table)
        .order(employees::employee_id.asc())
        .select(EmployeeWithPersonRow::as_select())
        .load(conn)?;

    into_employees(rows)
}
}
