// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{DEFAULT_PROBE_MESSAGE, MessageFormat, Tz};
use std::time::Duration;

use crate::error::PipelineError;

/// Settings for one pipeline instance.
///
/// Built once at startup and handed to the [`crate::Orchestrator`] and the
/// [`crate::Worker`]; nothing reads configuration from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Time between scheduling ticks.
    pub tick_interval: Duration,
    /// Zone in which lunch dates are computed.
    pub time_zone: Tz,
    /// Jobs claimed and run concurrently per worker round.
    pub concurrency: usize,
    /// Attempts a job gets before it is marked dead.
    pub max_attempts: i32,
    /// Sleep between polls when the queue is empty.
    pub idle_poll_interval: Duration,
    /// External profile link template with an `{id}` placeholder.
    pub profile_url_template: Option<String>,
    /// Text of the reachability probe.
    pub probe_message: String,
    /// Rendering of partner announcements.
    pub message_format: MessageFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(24 * 60 * 60),
            time_zone: Tz::UTC,
            concurrency: 8,
            max_attempts: 5,
            idle_poll_interval: Duration::from_secs(1),
            profile_url_template: None,
            probe_message: DEFAULT_PROBE_MESSAGE.to_string(),
            message_format: MessageFormat::Markdown,
        }
    }
}

impl PipelineConfig {
    /// Checks that the settings can drive a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.concurrency == 0 {
            return Err(PipelineError::Config(String::from(
                "concurrency must be at least 1",
            )));
        }
        if self.max_attempts < 1 {
            return Err(PipelineError::Config(String::from(
                "max attempts must be at least 1",
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(PipelineError::Config(String::from(
                "tick interval must be positive",
            )));
        }
        if self.probe_message.trim().is_empty() {
            return Err(PipelineError::Config(String::from(
                "probe message must not be blank",
            )));
        }
        Ok(())
    }

    /// Claim size for one worker round.
    pub(crate) fn claim_limit(&self) -> i64 {
        i64::try_from(self.concurrency).unwrap_or(i64::MAX)
    }
}
