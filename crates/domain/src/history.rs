// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pairing history and the edge weights derived from it.
//!
//! History is never stored on its own; it is rebuilt from past lunch group
//! memberships every time a company is matched.

use std::collections::BTreeMap;
use time::Date;

use crate::types::EmployeeId;

/// Weight of an edge between two employees who have never shared a group.
pub const NEVER_PAIRED_WEIGHT: i64 = 1_000_000;

/// Starting weight of an edge between employees who shared a group before.
///
/// Kept well below [`NEVER_PAIRED_WEIGHT`] so any fresh pairing beats any repeat.
pub const REPEAT_BASE_WEIGHT: i64 = 500_000;

/// Weight removed for every previous shared group.
pub const REPEAT_PENALTY: i64 = 10_000;

/// Window, in days, during which a previous pairing is considered recent.
pub const RECENCY_HORIZON_DAYS: i64 = 365;

/// Weight removed per day of recency inside the horizon.
pub const RECENCY_PENALTY_PER_DAY: i64 = 100;

/// How often and how recently two employees shared a lunch group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRecord {
    /// Number of lunches the pair shared a group in.
    pub count: u32,
    /// Date of the most recent shared lunch.
    pub last_paired: Date,
}

/// Co-membership history for the employees of one company.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairHistory {
    pairs: BTreeMap<(EmployeeId, EmployeeId), PairRecord>,
}

impl PairHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from past groups, given as `(lunch date, members)`.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (Date, Vec<EmployeeId>)>,
    {
        let mut history: Self = Self::new();
        for (date, members) in groups {
            for (index, &a) in members.iter().enumerate() {
                for &b in &members[index + 1..] {
                    history.record(a, b, date);
                }
            }
        }
        history
    }

    /// Records one shared lunch between `a` and `b`.
    pub fn record(&mut self, a: EmployeeId, b: EmployeeId, date: Date) {
        if a == b {
            return;
        }
        self.pairs
            .entry(Self::key(a, b))
            .and_modify(|record| {
                record.count += 1;
                if date > record.last_paired {
                    record.last_paired = date;
                }
            })
            .or_insert(PairRecord {
                count: 1,
                last_paired: date,
            });
    }

    /// Returns the record for the pair, if they ever shared a group.
    #[must_use]
    pub fn get(&self, a: EmployeeId, b: EmployeeId) -> Option<&PairRecord> {
        self.pairs.get(&Self::key(a, b))
    }

    /// Number of distinct pairs with history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pair has history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Computes the matching weight of the pair as of `today`.
    #[must_use]
    pub fn weight(&self, a: EmployeeId, b: EmployeeId, today: Date) -> i64 {
        pair_weight(self.get(a, b), today)
    }

    fn key(a: EmployeeId, b: EmployeeId) -> (EmployeeId, EmployeeId) {
        if a < b { (a, b) } else { (b, a) }
    }
}

/// Weight of an edge given its history.
///
/// Decreases with the number of previous pairings and with their recency,
/// floored at 1. Any pair with history weighs less than [`NEVER_PAIRED_WEIGHT`].
#[must_use]
pub fn pair_weight(record: Option<&PairRecord>, today: Date) -> i64 {
    let Some(record) = record else {
        return NEVER_PAIRED_WEIGHT;
    };

    let days_since: i64 = (today - record.last_paired).whole_days().max(0);
    let recency_penalty: i64 =
        (RECENCY_HORIZON_DAYS - days_since).max(0) * RECENCY_PENALTY_PER_DAY;
    let repeat_penalty: i64 = i64::from(record.count) * REPEAT_PENALTY;

    (REPEAT_BASE_WEIGHT - repeat_penalty - recency_penalty).max(1)
}
