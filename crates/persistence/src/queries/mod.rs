// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `directory` — companies and employees
//! - `lunches` — lunches, groups, memberships, pair history
//! - `jobs` — the task queue
//!
//! Every query is generated as a `_sqlite` function and, with the `mysql`
//! feature, a `_mysql` function. The `Persistence` adapter in `lib.rs`
//! dispatches to the one matching the active connection.

pub mod directory;
pub mod jobs;
pub mod lunches;

pub use directory::{
    get_employee_sqlite, list_all_employees_sqlite, list_companies_sqlite, list_employees_sqlite,
};
#[cfg(feature = "mysql")]
pub use directory::{
    get_employee_mysql, list_all_employees_mysql, list_companies_mysql, list_employees_mysql,
};
pub use jobs::{count_open_jobs_sqlite, list_jobs_sqlite};
#[cfg(feature = "mysql")]
pub use jobs::{count_open_jobs_mysql, list_jobs_mysql};
pub use lunches::{
    find_lunch_sqlite, get_membership_sqlite, list_group_partners_sqlite, list_lunch_groups_sqlite,
    list_lunches_sqlite, list_unnotified_members_sqlite, load_pair_history_sqlite,
};
#[cfg(feature = "mysql")]
pub use lunches::{
    find_lunch_mysql, get_membership_mysql, list_group_partners_mysql, list_lunch_groups_mysql,
    list_lunches_mysql, list_unnotified_members_mysql, load_pair_history_mysql,
};
