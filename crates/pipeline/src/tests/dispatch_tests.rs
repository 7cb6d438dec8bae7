// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{
    AvailabilityState, CompanyId, DirectoryLinkage, DirectorySyncPlan, DirectoryUpdate, EmployeeId,
    MatchedGroup, MemberId, MessageFormat,
};
use lunchegram_persistence::{MaterializedLunch, MembershipData, NewJob};

use super::helpers::{Harness, chat_id, lunch_date, test_config};
use crate::PipelineConfig;
use crate::tasks::{Continuation, JobEnvelope, Task};

async fn materialize(h: &Harness, company_id: CompanyId, members: Vec<EmployeeId>) -> Vec<MemberId> {
    let lunch: MaterializedLunch = h
        .store
        .lock()
        .await
        .materialize_lunch(company_id, lunch_date(), &[MatchedGroup::new(members)])
        .expect("Failed to materialize lunch");
    lunch.members
}

async fn membership(h: &Harness, member_id: MemberId) -> MembershipData {
    h.store
        .lock()
        .await
        .get_membership(member_id)
        .expect("Failed to load membership")
        .expect("Membership missing")
}

async fn enqueue(h: &Harness, envelope: &JobEnvelope) {
    let payload: String = envelope.encode().expect("Failed to encode");
    h.store
        .lock()
        .await
        .enqueue_job(&payload, 3)
        .expect("Failed to enqueue");
}

async fn enqueue_keyed(h: &Harness, envelope: &JobEnvelope) {
    let job: NewJob = envelope.to_new_job().expect("Failed to encode");
    h.store
        .lock()
        .await
        .enqueue_batch(&[job], None, 3)
        .expect("Failed to enqueue");
}

fn deliver(member_id: MemberId, n: i64) -> JobEnvelope {
    JobEnvelope::chain(
        Task::DeliverNotification {
            member_id,
            chat_id: chat_id(n),
            text: String::from("Hello! Your next random lunch partner is here: test"),
            format: MessageFormat::Markdown,
        },
        Continuation::MarkNotified { member_id },
    )
}

#[tokio::test]
async fn test_member_without_chat_is_never_delivered_to_or_marked() {
    let h = Harness::new();
    let company_id = h.create_company("Acme").await;
    let a = h.add_employee(company_id, 1, true).await;
    let b = h.add_employee(company_id, 2, false).await;
    let members: Vec<MemberId> = materialize(&h, company_id, vec![a, b]).await;

    // The lunch exists, so the run only sweeps its unnotified members.
    h.run_lunch().await;

    assert!(membership(&h, members[0]).await.is_notified());
    let unreached: MembershipData = membership(&h, members[1]).await;
    assert!(!unreached.is_notified());
    assert!(unreached.notification_message_id.is_none());

    assert!(h.channel.probes().is_empty());
    let sent = h.channel.announcements();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, chat_id(1));
    assert!(sent[0].text.contains("First2 Last2"));
    assert_eq!(h.state(b).await, AvailabilityState::Available);
}

#[tokio::test]
async fn test_delivery_is_skipped_for_notified_member() {
    let h = Harness::new();
    let (company_id, employees) = h.seed_company("Acme", 2).await;
    let members: Vec<MemberId> = materialize(&h, company_id, employees).await;
    h.store
        .lock()
        .await
        .mark_member_notified(members[0], 77, "2026-03-02T09:00:00Z")
        .expect("Failed to mark");

    enqueue(&h, &deliver(members[0], 1)).await;
    h.worker.run_until_idle().await.expect("Worker failed");

    assert!(h.channel.sent().is_empty());
    assert_eq!(
        membership(&h, members[0]).await.notification_message_id,
        Some(77)
    );
}

#[tokio::test]
async fn test_mark_notified_keeps_first_write() {
    let h = Harness::new();
    let (company_id, employees) = h.seed_company("Acme", 2).await;
    let members: Vec<MemberId> = materialize(&h, company_id, employees).await;

    for message_id in [10, 20] {
        enqueue(
            &h,
            &JobEnvelope::new(Task::MarkNotified {
                member_id: members[1],
                message_id,
            }),
        )
        .await;
    }
    h.worker.run_until_idle().await.expect("Worker failed");

    let marked: MembershipData = membership(&h, members[1]).await;
    assert_eq!(marked.notification_message_id, Some(10));
    assert!(marked.notified_at.is_some());
    assert!(!membership(&h, members[0]).await.is_notified());
}

#[tokio::test]
async fn test_delivery_interrupted_by_a_crash_is_replayed_once() {
    let h = Harness::new();
    let (company_id, employees) = h.seed_company("Acme", 2).await;
    let members: Vec<MemberId> = materialize(&h, company_id, employees).await;
    enqueue(&h, &deliver(members[0], 1)).await;

    // A worker claims the job and dies before settling it.
    let claimed = h.store.lock().await.claim_jobs(1).expect("Failed to claim");
    assert_eq!(claimed.len(), 1);

    h.worker.run_until_idle().await.expect("Worker failed");

    assert_eq!(h.channel.sent().len(), 1);
    let marked: MembershipData = membership(&h, members[0]).await;
    assert_eq!(marked.notification_message_id, Some(h.channel.sent()[0].message_id));
}

#[tokio::test]
async fn test_notify_member_composes_singular_announcement_with_profile_link() {
    let config = PipelineConfig {
        profile_url_template: Some(String::from("https://hr.example.com/people/{id}")),
        ..test_config()
    };
    let h = Harness::with_config(config);
    let (company_id, employees) = h.seed_company("Acme", 2).await;
    let plan = DirectorySyncPlan {
        updates: vec![DirectoryUpdate {
            employee_id: employees[1],
            linkage: DirectoryLinkage {
                external_id: Some(String::from("42")),
                first_name: Some(String::from("Grace")),
                last_name: Some(String::from("Hopper")),
            },
        }],
        removals: Vec::new(),
    };
    h.store
        .lock()
        .await
        .apply_directory_sync(&plan)
        .expect("Failed to apply plan");
    materialize(&h, company_id, employees).await;

    h.run_lunch().await;

    let to_first = h.channel.announcements_to(chat_id(1));
    assert_eq!(to_first.len(), 1);
    assert_eq!(
        to_first[0].text,
        format!(
            "Hello! Your next random lunch partner is here: [Grace Hopper](tg://user?id={}) \
             ([profile](https://hr.example.com/people/42)) (@user2)",
            chat_id(2)
        )
    );
}

#[tokio::test]
async fn test_sweep_skips_member_with_delivery_in_flight() {
    let h = Harness::new();
    let (company_id, employees) = h.seed_company("Acme", 2).await;
    let members: Vec<MemberId> = materialize(&h, company_id, employees).await;
    enqueue_keyed(&h, &deliver(members[0], 1)).await;

    // The lunch exists, so this run sweeps while the delivery is still queued.
    h.run_lunch().await;

    assert_eq!(h.channel.announcements_to(chat_id(1)).len(), 1);
    assert_eq!(h.channel.announcements_to(chat_id(2)).len(), 1);
    assert!(membership(&h, members[0]).await.is_notified());
    assert!(membership(&h, members[1]).await.is_notified());
}
