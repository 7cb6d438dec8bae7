// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::DomainError;
use lunchegram_persistence::PersistenceError;

use crate::channel::DeliveryError;
use crate::directory::DirectoryClientError;

/// Errors raised while running a pipeline step.
#[derive(Debug)]
pub enum PipelineError {
    /// The store failed.
    Persistence(PersistenceError),
    /// A domain rule was violated.
    Domain(DomainError),
    /// The chat channel failed to deliver.
    Delivery(DeliveryError),
    /// The HR directory could not be read.
    Directory(DirectoryClientError),
    /// A queued payload could not be encoded or decoded.
    Payload(String),
    /// The configuration is unusable.
    Config(String),
    /// A spawned step panicked or was cancelled.
    Join(String),
}

impl PipelineError {
    /// Returns true if running the step again may succeed.
    ///
    /// Contract violations (an invalid partition, an undecodable payload) are
    /// never retried; the company's run is abandoned instead.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(e) => !matches!(e, PersistenceError::InvalidData(_)),
            Self::Delivery(_) | Self::Directory(_) | Self::Join(_) => true,
            Self::Domain(_) | Self::Payload(_) | Self::Config(_) => false,
        }
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(e) => write!(f, "Persistence error: {e}"),
            Self::Domain(e) => write!(f, "Domain error: {e}"),
            Self::Delivery(e) => write!(f, "Delivery error: {e}"),
            Self::Directory(e) => write!(f, "Directory error: {e}"),
            Self::Payload(msg) => write!(f, "Invalid job payload: {msg}"),
            Self::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::Join(msg) => write!(f, "Job task failed: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            Self::Domain(e) => Some(e),
            Self::Delivery(e) => Some(e),
            Self::Directory(e) => Some(e),
            Self::Payload(_) | Self::Config(_) | Self::Join(_) => None,
        }
    }
}

impl From<PersistenceError> for PipelineError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<DomainError> for PipelineError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<DeliveryError> for PipelineError {
    fn from(err: DeliveryError) -> Self {
        Self::Delivery(err)
    }
}

impl From<DirectoryClientError> for PipelineError {
    fn from(err: DirectoryClientError) -> Self {
        Self::Directory(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
