// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{CompanyId, Date, EmployeeId, LunchGroupId, LunchId, MemberId};
use serde::{Deserialize, Serialize};

/// A company as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyData {
    pub company_id: CompanyId,
    pub name: String,
}

/// A lunch as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchData {
    pub lunch_id: LunchId,
    pub company_id: CompanyId,
    pub lunch_date: Date,
}

/// One lunch group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipData {
    pub member_id: MemberId,
    pub lunch_group_id: LunchGroupId,
    pub employee_id: EmployeeId,
    /// RFC 3339 timestamp of the notification, if sent.
    pub notified_at: Option<String>,
    pub notification_message_id: Option<i64>,
}

impl MembershipData {
    /// Returns true once the member was notified.
    #[must_use]
    pub const fn is_notified(&self) -> bool {
        self.notified_at.is_some()
    }
}

/// A lunch group and its memberships, in member id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunchGroupData {
    pub lunch_group_id: LunchGroupId,
    pub lunch_id: LunchId,
    pub members: Vec<MembershipData>,
}

/// What a successful materialization created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedLunch {
    pub lunch_id: LunchId,
    /// Every membership created, in insertion order.
    pub members: Vec<MemberId>,
}

/// Lifecycle of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Dead,
}

impl JobStatus {
    /// Converts this status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Dead => "dead",
        }
    }

    /// Returns true for statuses a job never leaves.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Dead)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "dead" => Ok(Self::Dead),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

/// A queued job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: i64,
    pub payload: String,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub batch_id: Option<i64>,
    pub last_error: Option<String>,
    pub dedupe_key: Option<String>,
}

/// A job about to be enqueued.
///
/// A job with a `dedupe_key` is dropped at enqueue time while another pending
/// or running job carries the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub payload: String,
    pub dedupe_key: Option<String>,
}

impl NewJob {
    /// A job without a dedupe key.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            dedupe_key: None,
        }
    }

    /// A job that is not enqueued while an open job shares `dedupe_key`.
    #[must_use]
    pub fn deduplicated(payload: impl Into<String>, dedupe_key: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            dedupe_key: Some(dedupe_key.into()),
        }
    }
}

/// Jobs released when another job completes.
///
/// `jobs` are enqueued right away. `join`, when present, runs once every job
/// in `jobs` reached a terminal state, or right away if `jobs` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowUp<'a> {
    pub jobs: &'a [NewJob],
    pub join: Option<&'a str>,
}

impl<'a> FollowUp<'a> {
    /// Releases nothing.
    pub const NONE: Self = Self {
        jobs: &[],
        join: None,
    };

    /// Independent jobs with no join.
    #[must_use]
    pub const fn jobs(jobs: &'a [NewJob]) -> Self {
        Self { jobs, join: None }
    }

    /// A batch of jobs followed by `join`.
    #[must_use]
    pub const fn batch(jobs: &'a [NewJob], join: Option<&'a str>) -> Self {
        Self { jobs, join }
    }

    /// Returns true if nothing is released.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.join.is_none()
    }
}

/// How a claimed job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSettlement<'a> {
    /// The job succeeded; its follow-up is enqueued in the same transaction.
    Completed { follow_up: FollowUp<'a> },
    /// The job failed. A retryable failure is retried while attempts remain;
    /// any other failure kills the job at once.
    Failed { error: &'a str, retryable: bool },
}

/// Counts of what a directory sync changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectorySyncSummary {
    pub updated: usize,
    pub deleted: usize,
    pub deactivated: usize,
}
