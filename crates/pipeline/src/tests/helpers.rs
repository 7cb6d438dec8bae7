// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test fixtures: a recording chat channel, a fixed directory and a harness
//! wiring both to an in-memory store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use lunchegram_domain::{
    AvailabilityState, ChatIdentity, CompanyId, Date, DirectoryRecord, Employee, EmployeeId,
    MessageFormat,
};
use lunchegram_persistence::{JobRecord, JobStatus, Persistence};
use time::macros::date;
use tokio::sync::Mutex;

use crate::channel::{ChatChannel, DeliveryError};
use crate::directory::{DirectoryClient, DirectoryClientError};
use crate::{Orchestrator, PipelineConfig, Worker};

pub const ANNOUNCEMENT_PREFIX: &str = "Hello! Your next random lunch";

/// A message accepted by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub format: MessageFormat,
    pub message_id: i64,
}

impl SentMessage {
    pub fn is_announcement(&self) -> bool {
        self.text.starts_with(ANNOUNCEMENT_PREFIX)
    }
}

/// Chat channel double.
///
/// Records accepted messages. Chats can be made unreachable after a number
/// of accepted messages, or made to fail a number of sends transiently.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: StdMutex<Vec<SentMessage>>,
    unreachable_after: StdMutex<BTreeMap<i64, usize>>,
    failures: StdMutex<BTreeMap<i64, usize>>,
    attempts: StdMutex<BTreeMap<i64, usize>>,
    next_message_id: AtomicI64,
}

impl RecordingChannel {
    /// `chat_id` accepts `accepted` messages, then reports unreachable.
    pub fn unreachable_after(&self, chat_id: i64, accepted: usize) {
        self.unreachable_after
            .lock()
            .expect("channel state poisoned")
            .insert(chat_id, accepted);
    }

    /// The next `count` sends to `chat_id` fail transiently.
    pub fn fail_next(&self, chat_id: i64, count: usize) {
        self.failures.lock().expect("channel state poisoned").insert(chat_id, count);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("channel state poisoned").clone()
    }

    pub fn announcements(&self) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(SentMessage::is_announcement)
            .collect()
    }

    pub fn announcements_to(&self, chat_id: i64) -> Vec<SentMessage> {
        self.announcements()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn probes(&self) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| !m.is_announcement())
            .collect()
    }

    /// Sends attempted to `chat_id`, failed ones included.
    pub fn attempts_to(&self, chat_id: i64) -> usize {
        self.attempts
            .lock()
            .expect("channel state poisoned")
            .get(&chat_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    async fn send(
        &self,
        recipient: &ChatIdentity,
        text: &str,
        format: MessageFormat,
    ) -> Result<i64, DeliveryError> {
        let chat_id: i64 = recipient.chat_id;
        *self.attempts.lock().expect("channel state poisoned").entry(chat_id).or_insert(0) += 1;

        if let Some(remaining) = self.failures.lock().expect("channel state poisoned").get_mut(&chat_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DeliveryError::Failed(String::from("timed out")));
            }
        }

        let accepted: usize = self
            .sent
            .lock()
            .expect("channel state poisoned")
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .count();
        if let Some(&limit) = self.unreachable_after.lock().expect("channel state poisoned").get(&chat_id) {
            if accepted >= limit {
                return Err(DeliveryError::Unreachable(String::from(
                    "bot was blocked by the user",
                )));
            }
        }

        let message_id: i64 = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().expect("channel state poisoned").push(SentMessage {
            chat_id,
            text: text.to_string(),
            format,
            message_id,
        });
        Ok(message_id)
    }
}

/// Directory double returning a fixed list.
pub struct FixedDirectory {
    pub result: Result<Vec<DirectoryRecord>, DirectoryClientError>,
}

#[async_trait]
impl DirectoryClient for FixedDirectory {
    async fn list_users(&self) -> Result<Vec<DirectoryRecord>, DirectoryClientError> {
        self.result.clone()
    }
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        concurrency: 4,
        max_attempts: 3,
        idle_poll_interval: Duration::from_millis(10),
        ..PipelineConfig::default()
    }
}

pub const fn lunch_date() -> Date {
    date!(2026 - 03 - 02)
}

/// Store, channel, orchestrator and worker sharing one in-memory database.
pub struct Harness {
    pub store: Arc<Mutex<Persistence>>,
    pub channel: Arc<RecordingChannel>,
    pub orchestrator: Orchestrator,
    pub worker: Worker,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let store: Arc<Mutex<Persistence>> = Arc::new(Mutex::new(
            Persistence::new_in_memory().expect("Failed to create in-memory persistence"),
        ));
        let channel: Arc<RecordingChannel> = Arc::new(RecordingChannel::default());
        let orchestrator: Orchestrator =
            Orchestrator::new(Arc::clone(&store), config.clone()).expect("valid config");
        let worker: Worker = Worker::new(
            Arc::clone(&store),
            Arc::clone(&channel) as Arc<dyn ChatChannel>,
            config,
        )
        .expect("valid config");
        Self {
            store,
            channel,
            orchestrator,
            worker,
        }
    }

    pub async fn create_company(&self, name: &str) -> CompanyId {
        self.store
            .lock()
            .await
            .create_company(name)
            .expect("Failed to create company")
    }

    /// Adds employee `n`: `First{n} Last{n}`, username `user{n}`, chat id
    /// `chat_id(n)` when `with_chat`.
    pub async fn add_employee(&self, company_id: CompanyId, n: i64, with_chat: bool) -> EmployeeId {
        let mut store = self.store.lock().await;
        let person_id: i64 = store
            .create_person(
                Some(&format!("user{n}")),
                &format!("First{n}"),
                &format!("Last{n}"),
                with_chat.then_some(chat_id(n)),
            )
            .expect("Failed to create person");
        store
            .add_employee(company_id, person_id)
            .expect("Failed to add employee")
    }

    /// Creates a company with employees `1..=count`, all reachable.
    pub async fn seed_company(&self, name: &str, count: i64) -> (CompanyId, Vec<EmployeeId>) {
        let company_id: CompanyId = self.create_company(name).await;
        let mut employees: Vec<EmployeeId> = Vec::new();
        for n in 1..=count {
            employees.push(self.add_employee(company_id, n, true).await);
        }
        (company_id, employees)
    }

    /// Schedules a run for [`lunch_date`] and drains the queue.
    pub async fn run_lunch(&self) {
        self.orchestrator
            .schedule(lunch_date())
            .await
            .expect("Failed to schedule");
        self.worker
            .run_until_idle()
            .await
            .expect("Worker failed");
    }

    pub async fn employee(&self, employee_id: EmployeeId) -> Employee {
        self.store
            .lock()
            .await
            .get_employee(employee_id)
            .expect("Failed to load employee")
            .expect("Employee missing")
    }

    pub async fn state(&self, employee_id: EmployeeId) -> AvailabilityState {
        self.employee(employee_id).await.state
    }

    pub async fn jobs(&self, status: JobStatus) -> Vec<JobRecord> {
        self.store
            .lock()
            .await
            .list_jobs(Some(status))
            .expect("Failed to list jobs")
    }

    /// Employee ids grouped per lunch group of the company's lunch on
    /// [`lunch_date`], with each membership's notification flag.
    pub async fn lunch_groups(&self, company_id: CompanyId) -> Vec<Vec<(EmployeeId, bool)>> {
        self.lunch_groups_on(company_id, lunch_date()).await
    }

    pub async fn lunch_groups_on(
        &self,
        company_id: CompanyId,
        date: Date,
    ) -> Vec<Vec<(EmployeeId, bool)>> {
        let mut store = self.store.lock().await;
        let Some(lunch_id) = store
            .find_lunch(company_id, date)
            .expect("Failed to find lunch")
        else {
            return Vec::new();
        };
        store
            .list_lunch_groups(lunch_id)
            .expect("Failed to list groups")
            .into_iter()
            .map(|group| {
                group
                    .members
                    .iter()
                    .map(|m| (m.employee_id, m.is_notified()))
                    .collect()
            })
            .collect()
    }
}

pub const fn chat_id(n: i64) -> i64 {
    5000 + n
}
