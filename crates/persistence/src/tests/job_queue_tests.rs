// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable task queue tests.

use crate::tests::create_test_persistence;
use crate::{FollowUp, JobRecord, JobSettlement, JobStatus, NewJob, Persistence};

fn payloads(names: &[&str]) -> Vec<NewJob> {
    names.iter().map(|name| NewJob::new(*name)).collect()
}

fn claim_one(persistence: &mut Persistence) -> JobRecord {
    let mut claimed = persistence.claim_jobs(1).unwrap();
    assert_eq!(claimed.len(), 1, "expected exactly one claimable job");
    claimed.remove(0)
}

fn complete(persistence: &mut Persistence, job_id: i64) -> Option<JobStatus> {
    persistence
        .settle_job(job_id, JobSettlement::Completed {
            follow_up: FollowUp::NONE,
        })
        .unwrap()
}

#[test]
fn test_claim_returns_oldest_first_and_counts_attempt() {
    let mut persistence = create_test_persistence();
    let first = persistence.enqueue_job("first", 3).unwrap();
    let second = persistence.enqueue_job("second", 3).unwrap();

    let claimed = persistence.claim_jobs(10).unwrap();

    assert_eq!(
        claimed.iter().map(|j| j.job_id).collect::<Vec<_>>(),
        vec![first, second]
    );
    assert!(claimed.iter().all(|j| j.status == JobStatus::Running));
    assert!(claimed.iter().all(|j| j.attempts == 1));
    assert!(persistence.claim_jobs(10).unwrap().is_empty());
}

#[test]
fn test_claim_respects_limit() {
    let mut persistence = create_test_persistence();
    for n in 0..5 {
        persistence.enqueue_job(&format!("job{n}"), 3).unwrap();
    }

    assert_eq!(persistence.claim_jobs(2).unwrap().len(), 2);
    assert_eq!(persistence.claim_jobs(10).unwrap().len(), 3);
}

#[test]
fn test_completed_job_enqueues_follow_up() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("step-1", 4).unwrap();
    let job = claim_one(&mut persistence);
    let next_steps = payloads(&["step-2"]);

    let status = persistence
        .settle_job(
            job.job_id,
            JobSettlement::Completed {
                follow_up: FollowUp::jobs(&next_steps),
            },
        )
        .unwrap();
    assert_eq!(status, Some(JobStatus::Done));

    let next = claim_one(&mut persistence);
    assert_eq!(next.payload, "step-2");
    assert_eq!(next.max_attempts, 4);
    assert_eq!(next.attempts, 1);
}

#[test]
fn test_failed_job_is_retried_until_dead() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("flaky", 2).unwrap();

    let job = claim_one(&mut persistence);
    let status = persistence
        .settle_job(
            job.job_id,
            JobSettlement::Failed {
                error: "boom",
                retryable: true,
            },
        )
        .unwrap();
    assert_eq!(status, Some(JobStatus::Pending));

    let retry = claim_one(&mut persistence);
    assert_eq!(retry.job_id, job.job_id);
    assert_eq!(retry.attempts, 2);
    assert_eq!(retry.last_error.as_deref(), Some("boom"));

    let status = persistence
        .settle_job(
            retry.job_id,
            JobSettlement::Failed {
                error: "boom again",
                retryable: true,
            },
        )
        .unwrap();
    assert_eq!(status, Some(JobStatus::Dead));

    assert!(persistence.claim_jobs(10).unwrap().is_empty());
    let dead = persistence.list_jobs(Some(JobStatus::Dead)).unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].last_error.as_deref(), Some("boom again"));
    assert_eq!(persistence.count_open_jobs().unwrap(), 0);
}

#[test]
fn test_settling_job_that_is_not_running_is_ignored() {
    let mut persistence = create_test_persistence();
    let job_id = persistence.enqueue_job("pending", 3).unwrap();

    assert_eq!(complete(&mut persistence, job_id), None);
    assert_eq!(
        persistence.list_jobs(Some(JobStatus::Pending)).unwrap().len(),
        1
    );

    let job = claim_one(&mut persistence);
    assert_eq!(complete(&mut persistence, job.job_id), Some(JobStatus::Done));
    assert_eq!(complete(&mut persistence, job.job_id), None);
}

#[test]
fn test_batch_continuation_runs_after_all_members_finish() {
    let mut persistence = create_test_persistence();
    let batch_id = persistence
        .enqueue_batch(&payloads(&["a", "b", "c"]), Some("join"), 3)
        .unwrap();
    assert!(batch_id.is_some());

    let claimed = persistence.claim_jobs(10).unwrap();
    assert_eq!(claimed.len(), 3);
    assert!(claimed.iter().all(|j| j.batch_id == batch_id));

    complete(&mut persistence, claimed[0].job_id);
    complete(&mut persistence, claimed[1].job_id);
    assert!(
        persistence.claim_jobs(10).unwrap().is_empty(),
        "continuation must wait for the last member"
    );

    complete(&mut persistence, claimed[2].job_id);
    let join = claim_one(&mut persistence);
    assert_eq!(join.payload, "join");
    assert_eq!(join.batch_id, None);
}

#[test]
fn test_dead_member_still_releases_batch() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&payloads(&["ok", "doomed"]), Some("join"), 1)
        .unwrap();
    let claimed = persistence.claim_jobs(10).unwrap();

    complete(&mut persistence, claimed[0].job_id);
    let status = persistence
        .settle_job(
            claimed[1].job_id,
            JobSettlement::Failed {
                error: "gone",
                retryable: true,
            },
        )
        .unwrap();
    assert_eq!(status, Some(JobStatus::Dead));

    assert_eq!(claim_one(&mut persistence).payload, "join");
}

#[test]
fn test_retried_member_does_not_release_batch_early() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&payloads(&["a", "b"]), Some("join"), 3)
        .unwrap();
    let claimed = persistence.claim_jobs(10).unwrap();

    complete(&mut persistence, claimed[0].job_id);
    persistence
        .settle_job(
            claimed[1].job_id,
            JobSettlement::Failed {
                error: "retry me",
                retryable: true,
            },
        )
        .unwrap();

    let retry = claim_one(&mut persistence);
    assert_eq!(retry.payload, "b");
    complete(&mut persistence, retry.job_id);

    let join = claim_one(&mut persistence);
    assert_eq!(join.payload, "join");
    assert!(persistence.claim_jobs(10).unwrap().is_empty());
}

#[test]
fn test_empty_batch_enqueues_continuation_immediately() {
    let mut persistence = create_test_persistence();

    let batch_id = persistence.enqueue_batch(&[], Some("join"), 3).unwrap();

    assert_eq!(batch_id, None);
    assert_eq!(claim_one(&mut persistence).payload, "join");
}

#[test]
fn test_batch_without_continuation() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&payloads(&["only"]), None, 3)
        .unwrap();

    let job = claim_one(&mut persistence);
    complete(&mut persistence, job.job_id);

    assert_eq!(persistence.count_open_jobs().unwrap(), 0);
}

#[test]
fn test_stale_running_jobs_are_requeued() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("interrupted", 3).unwrap();
    persistence.enqueue_job("waiting", 3).unwrap();
    let job = claim_one(&mut persistence);

    assert_eq!(persistence.requeue_stale_jobs().unwrap(), 1);

    let claimed = persistence.claim_jobs(10).unwrap();
    assert_eq!(claimed.len(), 2);
    let requeued = claimed.iter().find(|j| j.job_id == job.job_id).unwrap();
    assert_eq!(requeued.attempts, 2);
}

#[test]
fn test_list_jobs_filters_by_status() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("one", 3).unwrap();
    persistence.enqueue_job("two", 3).unwrap();
    let job = claim_one(&mut persistence);
    complete(&mut persistence, job.job_id);

    assert_eq!(persistence.list_jobs(None).unwrap().len(), 2);
    assert_eq!(persistence.list_jobs(Some(JobStatus::Done)).unwrap().len(), 1);
    assert_eq!(persistence.list_jobs(Some(JobStatus::Pending)).unwrap().len(), 1);
    assert_eq!(persistence.count_open_jobs().unwrap(), 1);
}

#[test]
fn test_non_retryable_failure_kills_job_at_once() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("broken", 5).unwrap();
    let job = claim_one(&mut persistence);

    let status = persistence
        .settle_job(
            job.job_id,
            JobSettlement::Failed {
                error: "invalid partition",
                retryable: false,
            },
        )
        .unwrap();

    assert_eq!(status, Some(JobStatus::Dead));
    assert!(persistence.claim_jobs(10).unwrap().is_empty());
}

#[test]
fn test_completed_job_releases_batch_with_join() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("fan-out", 3).unwrap();
    let job = claim_one(&mut persistence);
    let probes = payloads(&["probe-1", "probe-2"]);

    persistence
        .settle_job(
            job.job_id,
            JobSettlement::Completed {
                follow_up: FollowUp::batch(&probes, Some("match")),
            },
        )
        .unwrap();

    let claimed = persistence.claim_jobs(10).unwrap();
    assert_eq!(
        claimed.iter().map(|j| j.payload.as_str()).collect::<Vec<_>>(),
        vec!["probe-1", "probe-2"]
    );
    assert!(claimed.iter().all(|j| j.batch_id.is_some()));

    for probe in &claimed {
        complete(&mut persistence, probe.job_id);
    }
    assert_eq!(claim_one(&mut persistence).payload, "match");
}

#[test]
fn test_completed_job_with_empty_batch_releases_join_immediately() {
    let mut persistence = create_test_persistence();
    persistence.enqueue_job("fan-out", 3).unwrap();
    let job = claim_one(&mut persistence);

    persistence
        .settle_job(
            job.job_id,
            JobSettlement::Completed {
                follow_up: FollowUp::batch(&[], Some("match")),
            },
        )
        .unwrap();

    let next = claim_one(&mut persistence);
    assert_eq!(next.payload, "match");
    assert_eq!(next.batch_id, None);
}

#[test]
fn test_job_with_open_dedupe_key_is_dropped() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&[NewJob::deduplicated("notify-a", "member:1")], None, 3)
        .unwrap();
    persistence
        .enqueue_batch(
            &[
                NewJob::deduplicated("notify-a-again", "member:1"),
                NewJob::deduplicated("notify-b", "member:2"),
                NewJob::deduplicated("notify-b-again", "member:2"),
            ],
            None,
            3,
        )
        .unwrap();

    let open = persistence.list_jobs(Some(JobStatus::Pending)).unwrap();
    assert_eq!(
        open.iter().map(|j| j.payload.as_str()).collect::<Vec<_>>(),
        vec!["notify-a", "notify-b"]
    );
    assert_eq!(open[0].dedupe_key.as_deref(), Some("member:1"));
}

#[test]
fn test_running_job_holds_its_dedupe_key() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&[NewJob::deduplicated("deliver", "member:1")], None, 3)
        .unwrap();
    let running = claim_one(&mut persistence);

    persistence
        .enqueue_batch(&[NewJob::deduplicated("sweep", "member:1")], None, 3)
        .unwrap();
    assert_eq!(persistence.count_open_jobs().unwrap(), 1);

    complete(&mut persistence, running.job_id);
    persistence
        .enqueue_batch(&[NewJob::deduplicated("sweep", "member:1")], None, 3)
        .unwrap();
    assert_eq!(claim_one(&mut persistence).payload, "sweep");
}

#[test]
fn test_follow_up_may_reuse_the_settled_jobs_key() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&[NewJob::deduplicated("notify", "member:1")], None, 3)
        .unwrap();
    let job = claim_one(&mut persistence);
    let chained = [NewJob::deduplicated("deliver", "member:1")];

    persistence
        .settle_job(
            job.job_id,
            JobSettlement::Completed {
                follow_up: FollowUp::jobs(&chained),
            },
        )
        .unwrap();

    let next = claim_one(&mut persistence);
    assert_eq!(next.payload, "deliver");
    assert_eq!(next.dedupe_key.as_deref(), Some("member:1"));
}

#[test]
fn test_batch_of_only_duplicates_releases_join_immediately() {
    let mut persistence = create_test_persistence();
    persistence
        .enqueue_batch(&[NewJob::deduplicated("probe", "employee:1")], None, 3)
        .unwrap();

    let batch_id = persistence
        .enqueue_batch(&[NewJob::deduplicated("probe", "employee:1")], Some("join"), 3)
        .unwrap();

    assert_eq!(batch_id, None);
    let claimed = persistence.claim_jobs(10).unwrap();
    assert_eq!(
        claimed.iter().map(|j| j.payload.as_str()).collect::<Vec<_>>(),
        vec!["probe", "join"]
    );
}
