// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! ## Module Organization
//!
//! - `directory` — companies, persons, employees and directory sync
//! - `lunches` — lunch materialization and notification bookkeeping
//! - `jobs` — the task queue
//!
//! Backend-specific helpers (e.g., `get_last_insert_rowid()`) come from the
//! `PersistenceBackend` trait. All other code uses Diesel DSL exclusively.

pub mod directory;
pub mod jobs;
pub mod lunches;

pub use directory::{
    add_employee_sqlite, apply_directory_sync_sqlite, create_company_sqlite, create_person_sqlite,
    set_employee_state_sqlite,
};
#[cfg(feature = "mysql")]
pub use directory::{
    add_employee_mysql, apply_directory_sync_mysql, create_company_mysql, create_person_mysql,
    set_employee_state_mysql,
};
pub use jobs::{
    claim_jobs_sqlite, enqueue_batch_sqlite, enqueue_job_sqlite, requeue_stale_jobs_sqlite,
    settle_job_sqlite,
};
#[cfg(feature = "mysql")]
pub use jobs::{
    claim_jobs_mysql, enqueue_batch_mysql, enqueue_job_mysql, requeue_stale_jobs_mysql,
    settle_job_mysql,
};
pub use lunches::{mark_member_notified_sqlite, materialize_lunch_sqlite};
#[cfg(feature = "mysql")]
pub use lunches::{mark_member_notified_mysql, materialize_lunch_mysql};
