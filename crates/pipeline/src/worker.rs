// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Job worker.
//!
//! ```text
//! Worker
//!     │
//!     ├─► claim up to `concurrency` jobs
//!     ├─► run each as its own tokio task
//!     └─► settle each job; follow-ups are enqueued in the same transaction
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lunchegram_persistence::{FollowUp, JobRecord, JobSettlement, JobStatus, NewJob, Persistence};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::channel::ChatChannel;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stages::{self, StageContext};
use crate::tasks::{Completion, JobEnvelope};

/// Encoded follow-up of a successful job.
struct Outcome {
    spawn: Vec<NewJob>,
    join: Option<String>,
}

/// Runs queued jobs.
pub struct Worker {
    ctx: StageContext,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    /// Creates a worker.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the configuration is invalid.
    pub fn new(
        store: Arc<Mutex<Persistence>>,
        channel: Arc<dyn ChatChannel>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            ctx: StageContext {
                store,
                channel,
                config: Arc::new(config),
            },
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that stops [`Worker::run`] when set to `true`.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Asks [`Worker::run`] to stop after the current round.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Returns jobs a previous worker left running to the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated.
    pub async fn requeue_stale(&self) -> Result<usize, PipelineError> {
        Ok(self.ctx.store.lock().await.requeue_stale_jobs()?)
    }

    /// Claims one round of jobs, runs them concurrently and settles them.
    ///
    /// # Returns
    ///
    /// The number of jobs claimed; zero means the queue was empty.
    ///
    /// # Errors
    ///
    /// Returns an error if jobs cannot be claimed. Failures of individual
    /// jobs are recorded on the jobs, not returned.
    pub async fn run_round(&self) -> Result<usize, PipelineError> {
        let jobs: Vec<JobRecord> = self
            .ctx
            .store
            .lock()
            .await
            .claim_jobs(self.ctx.config.claim_limit())?;
        if jobs.is_empty() {
            return Ok(0);
        }
        debug!(count = jobs.len(), "Claimed jobs");

        let claimed: usize = jobs.len();
        let mut unsettled: BTreeSet<i64> = jobs.iter().map(|job| job.job_id).collect();
        let mut running: JoinSet<(i64, Result<Outcome, PipelineError>)> = JoinSet::new();
        for job in jobs {
            let ctx: StageContext = self.ctx.clone();
            running.spawn(async move {
                let result = run_job(&ctx, &job).await;
                (job.job_id, result)
            });
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((job_id, result)) => {
                    unsettled.remove(&job_id);
                    self.settle(job_id, result).await;
                }
                Err(e) => error!(error = %e, "Job task did not finish"),
            }
        }

        // Jobs whose task panicked or was cancelled.
        for job_id in unsettled {
            self.settle(job_id, Err(PipelineError::Join(String::from("job task aborted"))))
                .await;
        }

        Ok(claimed)
    }

    /// Runs rounds until the queue is empty.
    ///
    /// # Returns
    ///
    /// The total number of jobs run.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub async fn run_until_idle(&self) -> Result<usize, PipelineError> {
        self.requeue_stale().await?;

        let mut total: usize = 0;
        loop {
            let ran: usize = self.run_round().await?;
            if ran == 0 {
                debug!(total, "Queue drained");
                return Ok(total);
            }
            total += ran;
        }
    }

    /// Runs until shutdown is requested, polling while the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if stale jobs cannot be requeued at start. Later
    /// queue errors are logged and retried.
    pub async fn run(&self) -> Result<(), PipelineError> {
        let requeued: usize = self.requeue_stale().await?;
        info!(
            concurrency = self.ctx.config.concurrency,
            requeued, "Worker starting"
        );

        while !self.is_shutdown_requested() {
            match self.run_round().await {
                Ok(0) => tokio::time::sleep(self.ctx.config.idle_poll_interval).await,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Failed to claim jobs");
                    tokio::time::sleep(self.ctx.config.idle_poll_interval).await;
                }
            }
        }

        info!("Worker stopped");
        Ok(())
    }

    async fn settle(&self, job_id: i64, result: Result<Outcome, PipelineError>) {
        let mut store = self.ctx.store.lock().await;
        let settled = match &result {
            Ok(outcome) => store.settle_job(
                job_id,
                JobSettlement::Completed {
                    follow_up: FollowUp::batch(&outcome.spawn, outcome.join.as_deref()),
                },
            ),
            Err(e) => {
                let message: String = e.to_string();
                store.settle_job(
                    job_id,
                    JobSettlement::Failed {
                        error: &message,
                        retryable: e.is_retryable(),
                    },
                )
            }
        };

        match settled {
            Ok(Some(JobStatus::Done)) => debug!(job_id, "Job done"),
            Ok(Some(status)) => debug!(job_id, status = status.as_str(), "Job settled"),
            Ok(None) => warn!(job_id, "Job was no longer running when settled"),
            Err(e) => error!(job_id, error = %e, "Failed to settle job"),
        }
    }
}

/// Decodes and runs one job.
///
/// The job's continuation, if its output releases one, is enqueued alongside
/// the spawned jobs.
async fn run_job(ctx: &StageContext, job: &JobRecord) -> Result<Outcome, PipelineError> {
    let envelope: JobEnvelope = JobEnvelope::decode(&job.payload)?;
    debug!(
        job_id = job.job_id,
        attempt = job.attempts,
        task = envelope.task.name(),
        "Running job"
    );

    let Completion {
        output,
        mut spawn,
        join,
    } = stages::execute(ctx, envelope.task).await?;

    if let Some(next) = envelope.then.and_then(|then| then.resolve(output)) {
        spawn.push(JobEnvelope::new(next));
    }

    Ok(Outcome {
        spawn: spawn
            .iter()
            .map(JobEnvelope::to_new_job)
            .collect::<Result<Vec<NewJob>, PipelineError>>()?,
        join: join.as_ref().map(JobEnvelope::encode).transpose()?,
    })
}
