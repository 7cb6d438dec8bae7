// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{CompanyId, DomainError, MemberId, MessageFormat};
use lunchegram_persistence::PersistenceError;
use time::macros::date;

use crate::channel::DeliveryError;
use crate::error::PipelineError;
use crate::tasks::{Continuation, JobEnvelope, Task, TaskOutput};

#[test]
fn test_envelope_payload_is_readable_json() {
    let payload: String = JobEnvelope::new(Task::MatchCompany {
        company_id: CompanyId::new(3),
        date: date!(2026 - 03 - 02),
    })
    .encode()
    .expect("Failed to encode");

    let value: serde_json::Value = serde_json::from_str(&payload).expect("valid JSON");
    assert_eq!(
        value,
        serde_json::json!({
            "task": {"task": "match_company", "company_id": 3, "date": "2026-03-02"}
        })
    );
}

#[test]
fn test_chained_envelope_survives_the_queue() {
    let envelope: JobEnvelope = JobEnvelope::chain(
        Task::DeliverNotification {
            member_id: MemberId::new(7),
            chat_id: 5001,
            text: String::from("hi"),
            format: MessageFormat::Markdown,
        },
        Continuation::MarkNotified {
            member_id: MemberId::new(7),
        },
    );

    let payload: String = envelope.encode().expect("Failed to encode");
    assert!(payload.contains("\"then\":{\"continuation\":\"mark_notified\",\"member_id\":7}"));
    assert_eq!(JobEnvelope::decode(&payload).expect("Failed to decode"), envelope);
}

#[test]
fn test_continuation_needs_a_message_id() {
    let then: Continuation = Continuation::MarkNotified {
        member_id: MemberId::new(7),
    };

    assert_eq!(then.resolve(TaskOutput::Nothing), None);
    assert_eq!(
        then.resolve(TaskOutput::MessageId(99)),
        Some(Task::MarkNotified {
            member_id: MemberId::new(7),
            message_id: 99,
        })
    );
}

#[test]
fn test_notification_steps_share_one_dedupe_key() {
    let member_id: MemberId = MemberId::new(7);
    let steps: [JobEnvelope; 3] = [
        JobEnvelope::new(Task::NotifyMember { member_id }),
        JobEnvelope::chain(
            Task::DeliverNotification {
                member_id,
                chat_id: 5001,
                text: String::from("hi"),
                format: MessageFormat::Markdown,
            },
            Continuation::MarkNotified { member_id },
        ),
        JobEnvelope::new(Task::MarkNotified {
            member_id,
            message_id: 1,
        }),
    ];

    for step in &steps {
        assert_eq!(step.dedupe_key().as_deref(), Some("notify-member:7"));
        let job = step.to_new_job().expect("Failed to encode");
        assert_eq!(job.dedupe_key.as_deref(), Some("notify-member:7"));
        assert_eq!(job.payload, step.encode().expect("Failed to encode"));
    }
    assert_ne!(
        JobEnvelope::new(Task::NotifyMember {
            member_id: MemberId::new(8)
        })
        .dedupe_key(),
        steps[0].dedupe_key()
    );
}

#[test]
fn test_run_steps_carry_no_dedupe_key() {
    let envelope: JobEnvelope = JobEnvelope::new(Task::MatchCompany {
        company_id: CompanyId::new(3),
        date: date!(2026 - 03 - 02),
    });
    assert_eq!(envelope.dedupe_key(), None);
    assert_eq!(
        envelope.to_new_job().expect("Failed to encode").dedupe_key,
        None
    );
}

#[test]
fn test_unknown_task_is_a_payload_error() {
    let err: PipelineError =
        JobEnvelope::decode("{\"task\":{\"task\":\"bake_cake\"}}").expect_err("should fail");
    assert!(matches!(err, PipelineError::Payload(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_retryable_classification() {
    assert!(PipelineError::from(DeliveryError::Failed(String::from("timeout"))).is_retryable());
    assert!(!PipelineError::from(DomainError::InvalidGroupSize { size: 4 }).is_retryable());
    assert!(
        !PipelineError::from(PersistenceError::InvalidData(
            String::from("bad row")
        ))
        .is_retryable()
    );
    assert!(
        PipelineError::from(PersistenceError::DatabaseError(
            String::from("locked")
        ))
        .is_retryable()
    );
}
