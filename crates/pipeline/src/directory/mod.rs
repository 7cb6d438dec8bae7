// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HR directory synchronization.
//!
//! The directory is the source of truth for who still works at the company
//! and for the names shown to partners. A sync reads every directory record,
//! plans the changes against the stored employees and applies the plan in
//! one transaction.

mod hr;

pub use hr::{HR_API_URL, HrDirectoryClient};

use async_trait::async_trait;
use lunchegram_domain::{DirectoryRecord, DirectorySyncPlan, Employee, plan_directory_sync};
use lunchegram_persistence::{DirectorySyncSummary, Persistence};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::PipelineError;

/// Errors returned by the HR directory API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryClientError {
    #[error("bad request ({code}): {message}")]
    BadRequest { code: u16, message: String },
    #[error("unauthorized ({code}): {message}")]
    Unauthorized { code: u16, message: String },
    #[error("not found ({code}): {message}")]
    NotFound { code: u16, message: String },
    #[error("server error ({code}): {message}")]
    Server { code: u16, message: String },
    #[error("unexpected status ({code}): {message}")]
    Unknown { code: u16, message: String },
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl DirectoryClientError {
    /// Maps a non-success HTTP status to an error.
    #[must_use]
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            400 => Self::BadRequest { code, message },
            401 => Self::Unauthorized { code, message },
            404 => Self::NotFound { code, message },
            500 => Self::Server { code, message },
            _ => Self::Unknown { code, message },
        }
    }
}

/// Reads the HR directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Lists every directory record.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    async fn list_users(&self) -> Result<Vec<DirectoryRecord>, DirectoryClientError>;
}

/// Brings stored employees in line with the directory.
///
/// The directory is read before the store is locked.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or the plan cannot be
/// applied; nothing is changed in that case.
pub async fn sync_directory(
    store: &Mutex<Persistence>,
    client: &dyn DirectoryClient,
) -> Result<DirectorySyncSummary, PipelineError> {
    let records: Vec<DirectoryRecord> = client.list_users().await?;

    let mut persistence = store.lock().await;
    let employees: Vec<Employee> = persistence.list_all_employees()?;
    let plan: DirectorySyncPlan = plan_directory_sync(&records, &employees);
    if plan.is_empty() {
        info!(records = records.len(), "Directory sync: nothing to change");
        return Ok(DirectorySyncSummary::default());
    }

    let summary: DirectorySyncSummary = persistence.apply_directory_sync(&plan)?;
    info!(
        records = records.len(),
        updated = summary.updated,
        deleted = summary.deleted,
        deactivated = summary.deactivated,
        "Directory sync complete"
    );
    Ok(summary)
}
