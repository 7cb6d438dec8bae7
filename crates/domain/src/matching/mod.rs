// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The matching engine.
//!
//! Partitions a company's post-probe pool into groups of two, plus exactly one
//! group of three when the pool is odd, maximizing total pair weight so that
//! employees who lunched together before are kept apart.
//!
//! ## Contract
//!
//! - The pool is deduplicated and ordered by employee id before anything else;
//!   vertex `i` is the `i`-th smallest id. Every tie in the solver and in the
//!   leftover fold therefore resolves by id order.
//! - The pairing is an exact maximum-weight maximum-cardinality matching
//!   (see [`blossom`]), never a greedy approximation.
//! - Pools of size 0 or 1 produce no groups.
//! - The result is validated with [`validate_partition`] before it is
//!   returned; callers never see an invalid partition.

pub mod blossom;

use std::collections::BTreeSet;
use time::Date;

use crate::error::DomainError;
use crate::history::PairHistory;
use crate::types::{EmployeeId, MatchedGroup};

/// Minimum number of members in a group.
pub const MIN_GROUP_SIZE: usize = 2;

/// Maximum number of members in a group.
pub const MAX_GROUP_SIZE: usize = 3;

/// Computes the lunch groups for a pool.
///
/// # Arguments
///
/// * `pool` - Employees to partition (order and duplicates are irrelevant)
/// * `history` - Prior co-membership of the company's employees
/// * `today` - The lunch date, used for recency weighting
///
/// # Returns
///
/// Groups ordered by their smallest member id, each with members in id order.
///
/// # Errors
///
/// Returns an error if the solver result cannot be turned into a valid
/// partition. This is a contract violation and must abort the company's run.
pub fn match_groups(
    pool: &[EmployeeId],
    history: &PairHistory,
    today: Date,
) -> Result<Vec<MatchedGroup>, DomainError> {
    let vertices: Vec<EmployeeId> = pool
        .iter()
        .copied()
        .collect::<BTreeSet<EmployeeId>>()
        .into_iter()
        .collect();

    if vertices.len() < MIN_GROUP_SIZE {
        return Ok(Vec::new());
    }

    let mut edges: Vec<(usize, usize, i64)> = Vec::new();
    for i in 0..vertices.len() {
        for j in (i + 1)..vertices.len() {
            edges.push((i, j, history.weight(vertices[i], vertices[j], today)));
        }
    }

    let mates: Vec<Option<usize>> = blossom::max_weight_matching(vertices.len(), &edges, true);

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut single: Vec<usize> = Vec::new();
    for (i, mate) in mates.iter().enumerate() {
        match *mate {
            Some(j) if mates.get(j).copied().flatten() != Some(i) => {
                return Err(DomainError::MatchingInconsistent(format!(
                    "vertex {i} is matched to {j} but not the other way round"
                )));
            }
            Some(j) if i < j => pairs.push((i, j)),
            Some(_) => {}
            None => single.push(i),
        }
    }

    if single.len() != vertices.len() % 2 {
        return Err(DomainError::MatchingInconsistent(format!(
            "{} vertices left unmatched in a pool of {}",
            single.len(),
            vertices.len()
        )));
    }

    let mut groups: Vec<Vec<usize>> = pairs.into_iter().map(|(i, j)| vec![i, j]).collect();
    if let Some(&leftover) = single.first() {
        let target: usize = best_fold_target(&groups, leftover, &vertices, history, today)
            .ok_or_else(|| DomainError::MatchingInconsistent(String::from("no group to fold into")))?;
        groups[target].push(leftover);
    }

    let mut matched: Vec<MatchedGroup> = groups
        .into_iter()
        .map(|group| MatchedGroup::new(group.into_iter().map(|v| vertices[v]).collect()))
        .collect();
    matched.sort_by_key(|group| group.members().first().copied());

    validate_partition(&vertices, &matched)?;
    Ok(matched)
}

/// Picks the pair the leftover vertex joins.
///
/// Maximizes the weakest edge the fold introduces, then the sum of both added
/// edges. The first (lowest-index) candidate wins ties.
fn best_fold_target(
    groups: &[Vec<usize>],
    leftover: usize,
    vertices: &[EmployeeId],
    history: &PairHistory,
    today: Date,
) -> Option<usize> {
    let mut best: Option<(usize, (i64, i64))> = None;
    for (index, group) in groups.iter().enumerate() {
        let added: Vec<i64> = group
            .iter()
            .map(|&member| history.weight(vertices[leftover], vertices[member], today))
            .collect();
        let score: (i64, i64) = (
            added.iter().copied().min().unwrap_or(0),
            added.iter().sum(),
        );
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Checks that `groups` is a valid partition of `pool`.
///
/// Valid means: every group has 2 or 3 members, no employee is in two groups,
/// every employee of the pool is covered, no group references an employee
/// outside the pool, and there is exactly one group of three iff the pool is odd.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate_partition(pool: &[EmployeeId], groups: &[MatchedGroup]) -> Result<(), DomainError> {
    let expected: BTreeSet<EmployeeId> = pool.iter().copied().collect();
    let mut seen: BTreeSet<EmployeeId> = BTreeSet::new();
    let mut triads: usize = 0;

    for group in groups {
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&group.len()) {
            return Err(DomainError::InvalidGroupSize { size: group.len() });
        }
        if group.len() == MAX_GROUP_SIZE {
            triads += 1;
        }
        for &employee_id in group.members() {
            if !expected.contains(&employee_id) {
                return Err(DomainError::UnknownGroupMember { employee_id });
            }
            if !seen.insert(employee_id) {
                return Err(DomainError::DuplicateGroupMember { employee_id });
            }
        }
    }

    if expected.len() < MIN_GROUP_SIZE {
        return Ok(());
    }

    if let Some(&employee_id) = expected.difference(&seen).next() {
        return Err(DomainError::UncoveredEmployee { employee_id });
    }

    if triads != expected.len() % 2 {
        return Err(DomainError::UnexpectedTriadCount {
            pool_size: expected.len(),
            triads,
        });
    }

    Ok(())
}
