// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The Lunchegram pairing and notification pipeline.
//!
//! A scheduling tick queues a lunch run. For every company the run probes the
//! available employees, matches the reachable ones into groups of two or
//! three, stores the lunch and announces each member's partners exactly once.
//!
//! ## Components
//!
//! - [`Orchestrator`] — turns ticks into queued runs
//! - [`Worker`] — claims and runs queued jobs
//! - [`ChatChannel`] — message delivery ([`TelegramChannel`], [`LoggingChannel`])
//! - [`DirectoryClient`] — the HR directory ([`HrDirectoryClient`], [`sync_directory`])
//!
//! ## Retry Safety
//!
//! Every job may run more than once. Replays are made harmless by:
//!
//! - the company step and the match step both checking for an existing lunch
//! - the dispatch steps re-reading the membership before sending
//! - marking a membership notified only once
//! - follow-up jobs being enqueued in the transaction that settles a job

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

pub mod channel;
mod config;
pub mod directory;
mod error;
mod orchestrator;
mod stages;
pub mod tasks;
mod worker;

#[cfg(test)]
mod tests;

pub use channel::{ChatChannel, DeliveryError, LoggingChannel, TelegramChannel};
pub use config::PipelineConfig;
pub use directory::{DirectoryClient, DirectoryClientError, HrDirectoryClient, sync_directory};
pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use worker::Worker;
