// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Planning of the HR directory synchronization.
//!
//! The HR directory is the source of truth for who still works at the
//! company and for the names shown to partners. Planning is pure: it compares
//! directory records with the stored employees and says what to change. The
//! store applies the plan in one transaction.
//!
//! ## Rules
//!
//! - Records and employees are correlated by chat username, compared after
//!   trimming, stripping a leading `@` and lowercasing.
//! - Records without a chat username are ignored. When two records share a
//!   username the later one wins.
//! - An employee whose record exists with a non-fired status gets its linkage
//!   refreshed (only if it changed).
//! - An employee with no record, or whose record carries a fired status, is
//!   removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{DirectoryLinkage, Employee, EmployeeId};

/// Directory statuses that mean the person no longer works at the company.
pub const FIRED_STATUSES: [&str; 3] = ["NEVER_WORK", "IN_DISMISS", "DISMISSED"];

/// Employment status of a directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStatus {
    /// Status code, e.g. `WORKING` or `DISMISSED`.
    pub id: String,
}

/// One person as listed by the HR directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Directory id of the person.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// First name, if recorded.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name, if recorded.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Chat username, with or without a leading `@`.
    #[serde(default)]
    pub telegram: Option<String>,
    /// Employment status.
    pub status: DirectoryStatus,
}

impl DirectoryRecord {
    /// Returns true if the record's status is one of [`FIRED_STATUSES`].
    #[must_use]
    pub fn is_fired(&self) -> bool {
        FIRED_STATUSES.contains(&self.status.id.as_str())
    }

    /// The linkage an employee matched to this record should carry.
    #[must_use]
    pub fn linkage(&self) -> DirectoryLinkage {
        DirectoryLinkage {
            external_id: Some(self.id.clone()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Directory ids arrive as numbers or strings depending on the endpoint.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Normalizes a chat username for comparison.
///
/// Returns `None` if nothing is left after trimming.
#[must_use]
pub fn normalize_username(username: &str) -> Option<String> {
    let normalized: String = username.trim().trim_start_matches('@').to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// A linkage refresh for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUpdate {
    /// The employee to update.
    pub employee_id: EmployeeId,
    /// The new linkage.
    pub linkage: DirectoryLinkage,
}

/// Changes produced by comparing the directory with the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectorySyncPlan {
    /// Employees whose linkage changed, in id order.
    pub updates: Vec<DirectoryUpdate>,
    /// Employees to remove, in id order.
    pub removals: Vec<EmployeeId>,
}

impl DirectorySyncPlan {
    /// Returns true if the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.removals.is_empty()
    }
}

/// Compares directory records with stored employees.
#[must_use]
pub fn plan_directory_sync(records: &[DirectoryRecord], employees: &[Employee]) -> DirectorySyncPlan {
    let by_username: BTreeMap<String, &DirectoryRecord> = records
        .iter()
        .filter_map(|record| {
            record
                .telegram
                .as_deref()
                .and_then(normalize_username)
                .map(|username| (username, record))
        })
        .collect();

    let mut sorted: Vec<&Employee> = employees.iter().collect();
    sorted.sort_by_key(|employee| employee.employee_id);

    let mut plan: DirectorySyncPlan = DirectorySyncPlan::default();
    for employee in sorted {
        let record: Option<&DirectoryRecord> = employee
            .username
            .as_deref()
            .and_then(normalize_username)
            .and_then(|username| by_username.get(&username).copied());

        match record {
            Some(record) if !record.is_fired() => {
                let linkage: DirectoryLinkage = record.linkage();
                if linkage != employee.directory {
                    plan.updates.push(DirectoryUpdate {
                        employee_id: employee.employee_id,
                        linkage,
                    });
                }
            }
            _ => plan.removals.push(employee.employee_id),
        }
    }
    plan
}
