// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Task handlers.
//!
//! Each handler reads what it needs under the store lock, releases the lock
//! before touching the network and returns a [`Completion`] describing the
//! work that follows. Handlers never enqueue anything themselves; the worker
//! records the follow-up in the same transaction that settles the job, so a
//! replayed job cannot enqueue twice.

mod dispatch;
mod eligibility;
mod matching;
mod probe;

pub(crate) use dispatch::{notify_jobs, sweep_unnotified};
pub(crate) use eligibility::{eligible_employees, matching_pool};

use std::sync::Arc;

use lunchegram_domain::{AvailabilityState, EmployeeId};
use lunchegram_persistence::{Persistence, PersistenceError};
use tokio::sync::Mutex;
use tracing::debug;

use crate::channel::ChatChannel;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::orchestrator;
use crate::tasks::{Completion, Task};

/// Everything a handler may use.
#[derive(Clone)]
pub(crate) struct StageContext {
    pub store: Arc<Mutex<Persistence>>,
    pub channel: Arc<dyn ChatChannel>,
    pub config: Arc<PipelineConfig>,
}

/// Runs one task.
pub(crate) async fn execute(ctx: &StageContext, task: Task) -> Result<Completion, PipelineError> {
    match task {
        Task::CreateLunchGroups { date } => orchestrator::create_lunch_groups(ctx, date).await,
        Task::CreateLunchGroupsForCompany { company_id, date } => {
            orchestrator::create_lunch_groups_for_company(ctx, company_id, date).await
        }
        Task::ProbeEmployee { employee_id } => probe::probe_employee(ctx, employee_id).await,
        Task::MatchCompany { company_id, date } => {
            matching::match_company(ctx, company_id, date).await
        }
        Task::NotifyMember { member_id } => dispatch::notify_member(ctx, member_id).await,
        Task::DeliverNotification {
            member_id,
            chat_id,
            text,
            format,
        } => dispatch::deliver_notification(ctx, member_id, chat_id, &text, format).await,
        Task::MarkNotified {
            member_id,
            message_id,
        } => dispatch::mark_notified(ctx, member_id, message_id).await,
    }
}

/// Marks an employee unavailable.
///
/// An employee removed by a directory sync in the meantime is skipped.
pub(crate) async fn demote(ctx: &StageContext, employee_id: EmployeeId) -> Result<(), PipelineError> {
    let result = ctx
        .store
        .lock()
        .await
        .set_employee_state(employee_id, AvailabilityState::Unavailable);

    match result {
        Ok(()) => Ok(()),
        Err(PersistenceError::NotFound(_)) => {
            debug!(employee_id = employee_id.value(), "Employee vanished before demotion");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
