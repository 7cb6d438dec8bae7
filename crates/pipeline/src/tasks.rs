// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Units of queued work.
//!
//! ```text
//! CreateLunchGroups
//!   └─ CreateLunchGroupsForCompany        (one per company)
//!        ├─ ProbeEmployee …                (batch, joined by)
//!        └─ MatchCompany                   (match + materialize)
//!             └─ NotifyMember …            (one per membership, no join)
//!                  └─ DeliverNotification  (then MarkNotified with its message id)
//! ```
//!
//! Every job is stored as a JSON [`JobEnvelope`]. A continuation rides along
//! with the job that produces its input and becomes a task of its own once
//! that job completed.

use lunchegram_domain::{CompanyId, Date, EmployeeId, MemberId, MessageFormat};
use lunchegram_persistence::NewJob;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

time::serde::format_description!(lunch_date, Date, "[year]-[month]-[day]");

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    /// Scheduling tick: start a run for every company.
    CreateLunchGroups {
        #[serde(with = "lunch_date")]
        date: Date,
    },
    /// Start one company's run.
    CreateLunchGroupsForCompany {
        company_id: CompanyId,
        #[serde(with = "lunch_date")]
        date: Date,
    },
    /// Check that an eligible employee can still be reached.
    ProbeEmployee { employee_id: EmployeeId },
    /// Match the probed pool and materialize the lunch.
    MatchCompany {
        company_id: CompanyId,
        #[serde(with = "lunch_date")]
        date: Date,
    },
    /// Compose the announcement for one membership.
    NotifyMember { member_id: MemberId },
    /// Send a composed announcement.
    DeliverNotification {
        member_id: MemberId,
        chat_id: i64,
        text: String,
        format: MessageFormat,
    },
    /// Record a delivered announcement.
    MarkNotified { member_id: MemberId, message_id: i64 },
}

impl Task {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateLunchGroups { .. } => "create_lunch_groups",
            Self::CreateLunchGroupsForCompany { .. } => "create_lunch_groups_for_company",
            Self::ProbeEmployee { .. } => "probe_employee",
            Self::MatchCompany { .. } => "match_company",
            Self::NotifyMember { .. } => "notify_member",
            Self::DeliverNotification { .. } => "deliver_notification",
            Self::MarkNotified { .. } => "mark_notified",
        }
    }
}

/// What a completed task hands to its continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOutput {
    #[default]
    Nothing,
    /// Provider id of a delivered message.
    MessageId(i64),
}

/// The second half of a two-stage chain, waiting for the first half's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "continuation", rename_all = "snake_case")]
pub enum Continuation {
    /// Becomes [`Task::MarkNotified`] with the delivered message id.
    MarkNotified { member_id: MemberId },
}

impl Continuation {
    /// Builds the continuation task from its input.
    ///
    /// Returns `None` when the first half produced nothing to continue with,
    /// e.g. a delivery skipped because the member was already notified.
    #[must_use]
    pub const fn resolve(self, output: TaskOutput) -> Option<Task> {
        match (self, output) {
            (Self::MarkNotified { member_id }, TaskOutput::MessageId(message_id)) => {
                Some(Task::MarkNotified {
                    member_id,
                    message_id,
                })
            }
            (Self::MarkNotified { .. }, TaskOutput::Nothing) => None,
        }
    }
}

/// The stored form of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Continuation>,
}

impl JobEnvelope {
    /// Wraps a task with no continuation.
    #[must_use]
    pub const fn new(task: Task) -> Self {
        Self { task, then: None }
    }

    /// Wraps a task whose output feeds `then`.
    #[must_use]
    pub const fn chain(task: Task, then: Continuation) -> Self {
        Self {
            task,
            then: Some(then),
        }
    }

    /// Queue dedupe key: at most one open job may hold it.
    ///
    /// Every step of a membership's notification shares one key, so a sweep
    /// cannot start a second announcement while the first is still in flight.
    #[must_use]
    pub fn dedupe_key(&self) -> Option<String> {
        match &self.task {
            Task::NotifyMember { member_id }
            | Task::DeliverNotification { member_id, .. }
            | Task::MarkNotified { member_id, .. } => Some(format!("notify-member:{member_id}")),
            Task::CreateLunchGroups { .. }
            | Task::CreateLunchGroupsForCompany { .. }
            | Task::ProbeEmployee { .. }
            | Task::MatchCompany { .. } => None,
        }
    }

    /// Encodes the envelope together with its dedupe key.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Payload`] if serialization fails.
    pub fn to_new_job(&self) -> Result<NewJob, PipelineError> {
        let payload: String = self.encode()?;
        Ok(match self.dedupe_key() {
            Some(key) => NewJob::deduplicated(payload, key),
            None => NewJob::new(payload),
        })
    }

    /// Serializes the envelope for the queue.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Payload`] if serialization fails.
    pub fn encode(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a queued payload.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Payload`] if the payload is not an envelope.
    pub fn decode(payload: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(payload)?)
    }
}

impl From<Task> for JobEnvelope {
    fn from(task: Task) -> Self {
        Self::new(task)
    }
}

/// Result of running one task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Input for the job's continuation, if it has one.
    pub output: TaskOutput,
    /// Jobs to enqueue.
    pub spawn: Vec<JobEnvelope>,
    /// Job to run once every spawned job ended.
    pub join: Option<JobEnvelope>,
}

impl Completion {
    /// Nothing further to do.
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    /// Hands `output` to the continuation.
    #[must_use]
    pub fn with_output(output: TaskOutput) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    /// Fire-and-forget fan-out.
    #[must_use]
    pub fn spawn(jobs: Vec<JobEnvelope>) -> Self {
        Self {
            spawn: jobs,
            ..Self::default()
        }
    }

    /// Fan-out joined by `join`.
    #[must_use]
    pub fn batch(jobs: Vec<JobEnvelope>, join: JobEnvelope) -> Self {
        Self {
            spawn: jobs,
            join: Some(join),
            ..Self::default()
        }
    }
}
