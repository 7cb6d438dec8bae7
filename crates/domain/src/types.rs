// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Generates a copyable numeric identifier newtype.
///
/// Identifiers are assigned by the store and ordered by their numeric value,
/// which is also the tie-break key used wherever the domain needs a stable order.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies a company.
    CompanyId
);
id_type!(
    /// Identifies an employee (a person's affiliation with one company).
    EmployeeId
);
id_type!(
    /// Identifies a lunch (one per company and date).
    LunchId
);
id_type!(
    /// Identifies a lunch group.
    LunchGroupId
);
id_type!(
    /// Identifies a lunch group membership.
    MemberId
);

/// Whether an employee takes part in the next matching cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AvailabilityState {
    /// The employee is eligible for matching.
    #[default]
    Available,
    /// The employee is skipped, either by choice or because the bot cannot reach them.
    Unavailable,
}

impl AvailabilityState {
    /// Converts this state to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        }
    }
}

impl FromStr for AvailabilityState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(DomainError::InvalidAvailabilityState(s.to_string())),
        }
    }
}

impl std::fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The chat account a person is reachable at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatIdentity {
    /// The provider's numeric user id.
    pub chat_id: i64,
}

impl ChatIdentity {
    /// Creates a chat identity for the given provider user id.
    #[must_use]
    pub const fn new(chat_id: i64) -> Self {
        Self { chat_id }
    }

    /// Returns a deep link that opens a chat with this account.
    #[must_use]
    pub fn deep_link(&self) -> String {
        format!("tg://user?id={}", self.chat_id)
    }
}

/// Fields maintained by the external HR directory sync.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectoryLinkage {
    /// The employee's id in the external directory.
    pub external_id: Option<String>,
    /// First name as recorded in the external directory.
    pub first_name: Option<String>,
    /// Last name as recorded in the external directory.
    pub last_name: Option<String>,
}

impl DirectoryLinkage {
    /// Returns true if the directory supplied at least one non-blank name part.
    #[must_use]
    pub fn has_name(&self) -> bool {
        [&self.first_name, &self.last_name]
            .into_iter()
            .flatten()
            .any(|part| !part.trim().is_empty())
    }
}

/// A person's affiliation with a company, with everything the pipeline needs
/// to match and address them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// The employee identifier.
    pub employee_id: EmployeeId,
    /// The company the employee belongs to.
    pub company_id: CompanyId,
    /// Current availability.
    pub state: AvailabilityState,
    /// The person's login name (used to correlate with the HR directory).
    pub username: Option<String>,
    /// The person's own profile first name.
    pub first_name: String,
    /// The person's own profile last name.
    pub last_name: String,
    /// Bound chat account, if any.
    pub chat: Option<ChatIdentity>,
    /// External directory linkage.
    pub directory: DirectoryLinkage,
}

impl Employee {
    /// Returns true if the employee is flagged available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state == AvailabilityState::Available
    }

    /// Resolves the name shown to partners.
    ///
    /// Directory names win over profile names when the directory supplied any.
    /// Parts are trimmed, blank parts dropped, and the rest joined by one space.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: [Option<&str>; 2] = if self.directory.has_name() {
            [
                self.directory.first_name.as_deref(),
                self.directory.last_name.as_deref(),
            ]
        } else {
            [Some(self.first_name.as_str()), Some(self.last_name.as_str())]
        };

        parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// A set of employees chosen to have lunch together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedGroup {
    members: Vec<EmployeeId>,
}

impl MatchedGroup {
    /// Creates a group; members are kept in ascending id order.
    #[must_use]
    pub fn new(mut members: Vec<EmployeeId>) -> Self {
        members.sort_unstable();
        Self { members }
    }

    /// Returns the members in ascending id order.
    #[must_use]
    pub fn members(&self) -> &[EmployeeId] {
        &self.members
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
