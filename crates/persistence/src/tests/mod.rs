// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod job_queue_tests;

use lunchegram_domain::{CompanyId, Date, EmployeeId};
use time::macros::date;

use crate::Persistence;

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_company(persistence: &mut Persistence, name: &str) -> CompanyId {
    persistence
        .create_company(name)
        .expect("Failed to create company")
}

/// Creates an employee whose chat id is `1000 + n` and username `user{n}`.
pub fn create_test_employee(
    persistence: &mut Persistence,
    company_id: CompanyId,
    n: i64,
) -> EmployeeId {
    let username: String = format!("user{n}");
    let person_id: i64 = persistence
        .create_person(
            Some(&username),
            &format!("First{n}"),
            &format!("Last{n}"),
            Some(1000 + n),
        )
        .expect("Failed to create person");
    persistence
        .add_employee(company_id, person_id)
        .expect("Failed to add employee")
}

/// Creates a company with `count` employees.
pub fn seed_company(persistence: &mut Persistence, count: i64) -> (CompanyId, Vec<EmployeeId>) {
    let company_id: CompanyId = create_test_company(persistence, "Acme");
    let employees: Vec<EmployeeId> = (1..=count)
        .map(|n| create_test_employee(persistence, company_id, n))
        .collect();
    (company_id, employees)
}

pub const fn test_lunch_date() -> Date {
    date!(2026 - 03 - 02)
}
