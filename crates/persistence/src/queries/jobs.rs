// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Job queue queries.

use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;

use crate::data_models::{JobRecord, JobStatus};
use crate::diesel_schema::jobs;
use crate::error::PersistenceError;

/// Diesel Queryable struct for job rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = jobs)]
pub(crate) struct JobRow {
    job_id: i64,
    payload: String,
    status: String,
    attempts: i32,
    max_attempts: i32,
    batch_id: Option<i64>,
    last_error: Option<String>,
    dedupe_key: Option<String>,
}

impl TryFrom<JobRow> for JobRecord {
    type Error = PersistenceError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            job_id: row.job_id,
            payload: row.payload,
            status: row
                .status
                .parse::<JobStatus>()
                .map_err(PersistenceError::InvalidData)?,
            attempts: row.attempts,
            max_attempts: row.max_attempts,
            batch_id: row.batch_id,
            last_error: row.last_error,
            dedupe_key: row.dedupe_key,
        })
    }
}

pub(crate) fn into_job_records(rows: Vec<JobRow>) -> Result<Vec<JobRecord>, PersistenceError> {
    rows.into_iter().map(JobRecord::try_from).collect()
}

backend_fn! {
/// Lists jobs in id order, optionally restricted to one status.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_jobs(
    conn: &mut _,
    status: Option<JobStatus>,
) -> Result<Vec<JobRecord>, PersistenceError> {
    let mut query = jobs::table.into_boxed();
    if let Some(status) = status {
        query = query.filter(jobs::status.eq(status.as_str()));
    }

    let rows: Vec<JobRow> = query
        .order(jobs::job_id.asc())
        .select(JobRow::as_select())
        .load(conn)?;

    into_job_records(rows)
}
}

backend_fn! {
/// Counts jobs that still have work to do (pending or running).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_open_jobs(conn: &mut _) -> Result<i64, PersistenceError> {
    Ok(jobs::table
        .filter(jobs::status.eq_any([JobStatus::Pending.as_str(), JobStatus::Running.as_str()]))
        .count()
        .get_result(conn)?)
}
}
