// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable task queue mutations.
//!
//! Payloads are opaque text; the pipeline decides what they mean.
//!
//! ## Lifecycle
//!
//! `pending → running → done`, or back to `pending` on a failure while
//! attempts remain, or `dead` once they are exhausted.
//!
//! ## Batches
//!
//! A batch counts its members that have not reached a terminal state. When
//! the last member ends (done or dead) the batch continuation is enqueued in
//! the same transaction, so a join fires exactly once.
//!
//! ## Dedupe keys
//!
//! A job may carry a dedupe key. While a pending or running job holds a key,
//! further jobs with that key are dropped at enqueue time. A follow-up
//! enqueued by the settlement of the holder may reuse its key, since the
//! holder is already terminal by then.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Text;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use tracing::{debug, error, info, warn};

use crate::backend::PersistenceBackend;
use crate::data_models::{FollowUp, JobRecord, JobSettlement, JobStatus, NewJob};
use crate::diesel_schema::{job_batches, jobs};
use crate::error::PersistenceError;
use crate::queries::jobs::{JobRow, into_job_records};

/// Inserts a follow-up inside the caller's transaction.
///
/// Jobs whose dedupe key is held by an open job, or by an earlier job of the
/// same follow-up, are dropped before the batch is sized. Evaluates to the id
/// of the batch created for a join, if any.
macro_rules! insert_follow_up {
    ($conn:ident, $follow_up:expr, $max_attempts:expr) => {{
        let follow_up: FollowUp<'_> = $follow_up;
        let max_attempts: i32 = $max_attempts;

        let mut fresh: Vec<&NewJob> = Vec::with_capacity(follow_up.jobs.len());
        for job in follow_up.jobs {
            if let Some(key) = job.dedupe_key.as_deref() {
                let open: i64 = jobs::table
                    .filter(jobs::dedupe_key.eq(key))
                    .filter(
                        jobs::status
                            .eq_any([JobStatus::Pending.as_str(), JobStatus::Running.as_str()]),
                    )
                    .count()
                    .get_result($conn)?;
                if open > 0 || fresh.iter().any(|f| f.dedupe_key.as_deref() == Some(key)) {
                    debug!(dedupe_key = key, "Equivalent job already open; not enqueued");
                    continue;
                }
            }
            fresh.push(job);
        }

        let batch_id: Option<i64> = match follow_up.join {
            Some(join) if fresh.is_empty() => {
                diesel::insert_into(jobs::table)
                    .values((
                        jobs::payload.eq(join),
                        jobs::status.eq(JobStatus::Pending.as_str()),
                        jobs::max_attempts.eq(max_attempts),
                    ))
                    .execute($conn)?;
                None
            }
            Some(join) => {
                let remaining: i32 = i32::try_from(fresh.len())
                    .map_err(|_| PersistenceError::InvalidData(String::from("batch too large")))?;
                diesel::insert_into(job_batches::table)
                    .values((
                        job_batches::remaining.eq(remaining),
                        job_batches::continuation.eq(Some(join)),
                        job_batches::max_attempts.eq(max_attempts),
                    ))
                    .execute($conn)?;
                Some($conn.get_last_insert_rowid()?)
            }
            None => None,
        };

        for job in fresh {
            diesel::insert_into(jobs::table)
                .values((
                    jobs::payload.eq(job.payload.as_str()),
                    jobs::status.eq(JobStatus::Pending.as_str()),
                    jobs::max_attempts.eq(max_attempts),
                    jobs::batch_id.eq(batch_id),
                    jobs::dedupe_key.eq(job.dedupe_key.as_deref()),
                ))
                .execute($conn)?;
        }

        batch_id
    }};
}

backend_fn! {
/// Enqueues one job.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn enqueue_job(
    conn: &mut _,
    payload: &str,
    max_attempts: i32,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(jobs::table)
        .values((
            jobs::payload.eq(payload),
            jobs::status.eq(JobStatus::Pending.as_str()),
            jobs::max_attempts.eq(max_attempts),
        ))
        .execute(conn)?;

    let job_id: i64 = conn.get_last_insert_rowid()?;
    debug!(job_id, "Enqueued job");
    Ok(job_id)
}
}

backend_fn! {
/// Enqueues a batch of jobs whose `continuation` runs once all of them ended.
///
/// An empty batch enqueues the continuation right away, as does one whose
/// jobs were all dropped as duplicates of open jobs.
///
/// # Returns
///
/// The batch id, or `None` when no join had to be tracked.
///
/// # Errors
///
/// Returns an error if any insert fails; nothing is enqueued in that case.
pub fn enqueue_batch(
    conn: &mut _,
    new_jobs: &[NewJob],
    continuation: Option<&str>,
    max_attempts: i32,
) -> Result<Option<i64>, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let batch_id: Option<i64> =
            insert_follow_up!(conn, FollowUp::batch(new_jobs, continuation), max_attempts);
        debug!(?batch_id, jobs = new_jobs.len(), "Enqueued batch");
        Ok(batch_id)
    })
}
}

backend_fn! {
/// Moves up to `limit` pending jobs to `running`, oldest first, and returns them.
///
/// Each claim counts as one attempt.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn claim_jobs(conn: &mut _, limit: i64) -> Result<Vec<JobRecord>, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let ids: Vec<i64> = jobs::table
            .filter(jobs::status.eq(JobStatus::Pending.as_str()))
            .order(jobs::job_id.asc())
            .limit(limit)
            .select(jobs::job_id)
            .load(conn)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        diesel::update(jobs::table)
            .filter(jobs::job_id.eq_any(&ids))
            .filter(jobs::status.eq(JobStatus::Pending.as_str()))
            .set((
                jobs::status.eq(JobStatus::Running.as_str()),
                jobs::attempts.eq(jobs::attempts + 1),
                jobs::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
            ))
            .execute(conn)?;

        let rows: Vec<JobRow> = jobs::table
            .filter(jobs::job_id.eq_any(&ids))
            .filter(jobs::status.eq(JobStatus::Running.as_str()))
            .order(jobs::job_id.asc())
            .select(JobRow::as_select())
            .load(conn)?;

        into_job_records(rows)
    })
}
}

backend_fn! {
/// Records how a running job ended.
///
/// A completed job is marked `done` and its follow-up is enqueued with the
/// same attempt budget. A retryable failure goes back to `pending` while
/// attempts remain; otherwise the job is marked `dead`. When the job reaches a
/// terminal state its batch is settled. Settling a job that is not running
/// is a no-op.
///
/// # Returns
///
/// The job's new status, or `None` if it was not running.
///
/// # Errors
///
/// Returns an error if any statement fails; nothing is recorded in that case.
pub fn settle_job(
    conn: &mut _,
    job_id: i64,
    settlement: JobSettlement<'_>,
) -> Result<Option<JobStatus>, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let job: Option<(i32, i32, Option<i64>)> = jobs::table
            .filter(jobs::job_id.eq(job_id))
            .filter(jobs::status.eq(JobStatus::Running.as_str()))
            .select((jobs::attempts, jobs::max_attempts, jobs::batch_id))
            .first(conn)
            .optional()?;
        let Some((attempts, max_attempts, batch_id)) = job else {
            warn!(job_id, "Settling a job that is not running; ignored");
            return Ok(None);
        };

        let status: JobStatus = match settlement {
            JobSettlement::Completed { follow_up } => {
                diesel::update(jobs::table)
                    .filter(jobs::job_id.eq(job_id))
                    .set((
                        jobs::status.eq(JobStatus::Done.as_str()),
                        jobs::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
                    ))
                    .execute(conn)?;

                let _: Option<i64> = insert_follow_up!(conn, follow_up, max_attempts);
                JobStatus::Done
            }
            JobSettlement::Failed { error: message, retryable } => {
                let status: JobStatus = if retryable && attempts < max_attempts {
                    JobStatus::Pending
                } else {
                    JobStatus::Dead
                };
                diesel::update(jobs::table)
                    .filter(jobs::job_id.eq(job_id))
                    .set((
                        jobs::status.eq(status.as_str()),
                        jobs::last_error.eq(message),
                        jobs::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
                    ))
                    .execute(conn)?;

                if status == JobStatus::Dead {
                    error!(job_id, attempts, retryable, error = message, "Job is dead");
                } else {
                    warn!(job_id, attempts, max_attempts, error = message, "Job failed; will retry");
                }
                status
            }
        };

        if let Some(batch_id) = batch_id.filter(|_| status.is_terminal()) {
            diesel::update(job_batches::table)
                .filter(job_batches::batch_id.eq(batch_id))
                .filter(job_batches::remaining.gt(0))
                .set(job_batches::remaining.eq(job_batches::remaining - 1))
                .execute(conn)?;

            let (remaining, continuation, batch_max_attempts): (i32, Option<String>, i32) =
                job_batches::table
                    .filter(job_batches::batch_id.eq(batch_id))
                    .select((
                        job_batches::remaining,
                        job_batches::continuation,
                        job_batches::max_attempts,
                    ))
                    .first(conn)?;

            if remaining == 0 {
                if let Some(continuation) = continuation {
                    diesel::insert_into(jobs::table)
                        .values((
                            jobs::payload.eq(&continuation),
                            jobs::status.eq(JobStatus::Pending.as_str()),
                            jobs::max_attempts.eq(batch_max_attempts),
                        ))
                        .execute(conn)?;
                }
                debug!(batch_id, "Batch joined");
            }
        }

        Ok(Some(status))
    })
}
}

backend_fn! {
/// Returns jobs left `running` by a stopped worker to `pending`.
///
/// The interrupted attempt still counts.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn requeue_stale_jobs(conn: &mut _) -> Result<usize, PersistenceError> {
    let requeued: usize = diesel::update(jobs::table)
        .filter(jobs::status.eq(JobStatus::Running.as_str()))
        .set((
            jobs::status.eq(JobStatus::Pending.as_str()),
            jobs::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    if requeued > 0 {
        info!(requeued, "Requeued jobs interrupted by a previous worker");
    }
    Ok(requeued)
}
}
