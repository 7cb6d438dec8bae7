// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::EmployeeId;

/// Errors that can occur while applying domain rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The availability state string is not recognized.
    InvalidAvailabilityState(String),
    /// The time zone name is not a known IANA zone.
    InvalidTimezone(String),
    /// A date could not be converted between calendar representations.
    DateConversion {
        /// Description of the conversion that failed.
        reason: String,
    },
    /// A matched group has a size outside of 2..=3.
    InvalidGroupSize {
        /// The offending group size.
        size: usize,
    },
    /// An employee appears in more than one group.
    DuplicateGroupMember {
        /// The duplicated employee.
        employee_id: EmployeeId,
    },
    /// An employee of the pool is not covered by any group.
    UncoveredEmployee {
        /// The employee left out of the partition.
        employee_id: EmployeeId,
    },
    /// A group references an employee that is not part of the pool.
    UnknownGroupMember {
        /// The unknown employee.
        employee_id: EmployeeId,
    },
    /// The number of three-person groups does not match the pool parity.
    UnexpectedTriadCount {
        /// Size of the matched pool.
        pool_size: usize,
        /// Number of three-person groups produced.
        triads: usize,
    },
    /// The matching solver produced an inconsistent result.
    MatchingInconsistent(String),
    /// A partner announcement was requested for a group without partners.
    NoPartners,
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAvailabilityState(state) => {
                write!(f, "Invalid availability state: {state}")
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid time zone: {tz}"),
            Self::DateConversion { reason } => write!(f, "Date conversion failed: {reason}"),
            Self::InvalidGroupSize { size } => {
                write!(f, "Invalid group size: {size}. Groups must have 2 or 3 members")
            }
            Self::DuplicateGroupMember { employee_id } => {
                write!(f, "Employee {employee_id} appears in more than one group")
            }
            Self::UncoveredEmployee { employee_id } => {
                write!(f, "Employee {employee_id} is not covered by any group")
            }
            Self::UnknownGroupMember { employee_id } => {
                write!(f, "Employee {employee_id} is not part of the matched pool")
            }
            Self::UnexpectedTriadCount { pool_size, triads } => {
                write!(
                    f,
                    "Pool of {pool_size} employees produced {triads} groups of three"
                )
            }
            Self::MatchingInconsistent(msg) => write!(f, "Matching is inconsistent: {msg}"),
            Self::NoPartners => write!(f, "Group has no partners to announce"),
        }
    }
}

impl std::error::Error for DomainError {}
