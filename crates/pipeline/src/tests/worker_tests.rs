// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use lunchegram_persistence::{JobStatus, Persistence};
use tokio::sync::Mutex;

use super::helpers::{Harness, RecordingChannel, lunch_date, test_config};
use crate::{ChatChannel, Orchestrator, PipelineConfig, PipelineError, Worker};

#[tokio::test]
async fn test_run_until_idle_on_empty_queue_runs_nothing() {
    let h = Harness::new();
    assert_eq!(h.worker.run_until_idle().await.expect("Worker failed"), 0);
}

#[tokio::test]
async fn test_run_until_idle_counts_every_job() {
    let h = Harness::new();
    h.seed_company("Acme", 2).await;
    h.orchestrator
        .schedule(lunch_date())
        .await
        .expect("Failed to schedule");

    let ran: usize = h.worker.run_until_idle().await.expect("Worker failed");

    // root, company, 2 probes, match, 2 × (notify, deliver, mark)
    assert_eq!(ran, 11);
    assert_eq!(h.jobs(JobStatus::Done).await.len(), 11);
}

#[tokio::test]
async fn test_undecodable_payload_dies_without_retry() {
    let h = Harness::new();
    h.store
        .lock()
        .await
        .enqueue_job("{\"task\":\"bake_cake\"}", 3)
        .expect("Failed to enqueue");

    h.worker.run_until_idle().await.expect("Worker failed");

    let dead = h.jobs(JobStatus::Dead).await;
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].attempts, 1);
    assert!(
        dead[0]
            .last_error
            .as_deref()
            .is_some_and(|e| e.starts_with("Invalid job payload"))
    );
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let store: Arc<Mutex<Persistence>> = Arc::new(Mutex::new(
        Persistence::new_in_memory().expect("Failed to create in-memory persistence"),
    ));
    let channel: Arc<dyn ChatChannel> = Arc::new(RecordingChannel::default());
    let config: PipelineConfig = PipelineConfig {
        concurrency: 0,
        ..test_config()
    };

    assert!(matches!(
        Worker::new(Arc::clone(&store), channel, config.clone()),
        Err(PipelineError::Config(_))
    ));
    assert!(matches!(
        Orchestrator::new(store, config),
        Err(PipelineError::Config(_))
    ));
}

#[tokio::test]
async fn test_run_stops_on_shutdown_request() {
    let h = Harness::new();
    let (company_id, _) = h.seed_company("Acme", 2).await;
    h.orchestrator
        .schedule(lunch_date())
        .await
        .expect("Failed to schedule");

    let shutdown = h.worker.shutdown_handle();
    let store = Arc::clone(&h.store);
    let watcher = async move {
        loop {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let open: i64 = store.lock().await.count_open_jobs().expect("Failed to count");
            if open == 0 {
                break;
            }
        }
        shutdown.store(true, Ordering::SeqCst);
    };

    let (result, ()) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(h.worker.run(), watcher) },
    )
    .await
    .expect("Worker did not stop");
    result.expect("Worker failed");

    assert_eq!(h.lunch_groups(company_id).await.len(), 1);
    assert_eq!(h.channel.announcements().len(), 2);
}
