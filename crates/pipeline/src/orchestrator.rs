// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Scheduling ticks and the per-company run.
//!
//! A company's run moves through
//! `start → filtered → probed → matched & materialized → dispatched`, each
//! arrow a queued job. Companies are independent: nothing here waits for
//! another company or for deliveries to finish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lunchegram_domain::{CompanyId, Date, Employee, local_date};
use lunchegram_persistence::{CompanyData, Persistence};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stages::{StageContext, eligible_employees, sweep_unnotified};
use crate::tasks::{Completion, JobEnvelope, Task};

/// Turns scheduling ticks into queued lunch runs.
pub struct Orchestrator {
    store: Arc<Mutex<Persistence>>,
    config: Arc<PipelineConfig>,
}

impl Orchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the configuration is invalid.
    pub fn new(store: Arc<Mutex<Persistence>>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    /// The configuration this orchestrator was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handles one scheduling tick.
    ///
    /// The lunch date is `now` in the configured time zone.
    ///
    /// # Returns
    ///
    /// The id of the queued root job.
    ///
    /// # Errors
    ///
    /// Returns an error if the date cannot be computed or the job cannot be
    /// enqueued.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<i64, PipelineError> {
        let date: Date = local_date(self.config.time_zone, now)?;
        self.schedule(date).await
    }

    /// Queues a lunch run for `date`.
    ///
    /// Scheduling the same date twice is harmless: companies that already
    /// have a lunch only get their unnotified members re-dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be enqueued.
    pub async fn schedule(&self, date: Date) -> Result<i64, PipelineError> {
        let payload: String = JobEnvelope::new(Task::CreateLunchGroups { date }).encode()?;
        let job_id: i64 = self
            .store
            .lock()
            .await
            .enqueue_job(&payload, self.config.max_attempts)?;
        info!(job_id, %date, "Scheduled lunch run");
        Ok(job_id)
    }
}

/// Fans a tick out to every company.
pub(crate) async fn create_lunch_groups(
    ctx: &StageContext,
    date: Date,
) -> Result<Completion, PipelineError> {
    let companies: Vec<CompanyData> = ctx.store.lock().await.list_companies()?;
    info!(%date, companies = companies.len(), "Starting lunch run");

    Ok(Completion::spawn(
        companies
            .iter()
            .map(|company| {
                JobEnvelope::new(Task::CreateLunchGroupsForCompany {
                    company_id: company.company_id,
                    date,
                })
            })
            .collect(),
    ))
}

/// Starts one company's run: probe every eligible employee, then match.
///
/// A company that already has a lunch on `date` is not probed again; its
/// unnotified members are re-dispatched instead.
pub(crate) async fn create_lunch_groups_for_company(
    ctx: &StageContext,
    company_id: CompanyId,
    date: Date,
) -> Result<Completion, PipelineError> {
    let mut store = ctx.store.lock().await;

    if let Some(lunch_id) = store.find_lunch(company_id, date)? {
        info!(
            company_id = company_id.value(),
            lunch_id = lunch_id.value(),
            "Lunch already exists; sweeping unnotified members"
        );
        return sweep_unnotified(&mut store, lunch_id);
    }

    let employees: Vec<Employee> = eligible_employees(&mut store, company_id)?;
    if employees.is_empty() {
        info!(company_id = company_id.value(), "No eligible employees; nothing to do");
        return Ok(Completion::done());
    }

    info!(
        company_id = company_id.value(),
        probes = employees.len(),
        "Probing eligible employees"
    );
    let probes: Vec<JobEnvelope> = employees
        .iter()
        .map(|employee| {
            JobEnvelope::new(Task::ProbeEmployee {
                employee_id: employee.employee_id,
            })
        })
        .collect();

    Ok(Completion::batch(
        probes,
        JobEnvelope::new(Task::MatchCompany { company_id, date }),
    ))
}
