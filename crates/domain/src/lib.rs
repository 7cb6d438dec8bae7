// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod calendar;
mod directory;
mod error;
mod history;
mod matching;
mod message;
mod types;

#[cfg(test)]
mod tests;

pub use calendar::{format_date, local_date, parse_date, parse_timezone};
pub use directory::{
    DirectoryRecord, DirectoryStatus, DirectorySyncPlan, DirectoryUpdate, FIRED_STATUSES,
    normalize_username, plan_directory_sync,
};
pub use history::{
    NEVER_PAIRED_WEIGHT, PairHistory, PairRecord, RECENCY_HORIZON_DAYS, RECENCY_PENALTY_PER_DAY,
    REPEAT_BASE_WEIGHT, REPEAT_PENALTY, pair_weight,
};
pub use matching::blossom::max_weight_matching;
pub use matching::{MAX_GROUP_SIZE, MIN_GROUP_SIZE, match_groups, validate_partition};
pub use message::{
    DEFAULT_PROBE_MESSAGE, MessageFormat, PROFILE_ID_PLACEHOLDER, compose_partner_announcement,
    escape_markdown, markdown_link_label, markdown_link_target, partner_card, profile_url,
};

// Re-export public types
pub use error::DomainError;
pub use types::{
    AvailabilityState, ChatIdentity, CompanyId, DirectoryLinkage, Employee, EmployeeId, LunchGroupId,
    LunchId, MatchedGroup, MemberId,
};
pub use chrono_tz::Tz;
pub use time::Date;
