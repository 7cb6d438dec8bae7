// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Date;
use time::macros::date;

use super::helpers::ids;
use crate::{
    EmployeeId, NEVER_PAIRED_WEIGHT, PairHistory, PairRecord, REPEAT_BASE_WEIGHT, REPEAT_PENALTY,
    pair_weight,
};

const TODAY: Date = date!(2026 - 03 - 02);

#[test]
fn test_never_paired_weight_is_the_maximum() {
    assert_eq!(pair_weight(None, TODAY), NEVER_PAIRED_WEIGHT);
}

#[test]
fn test_old_single_repeat_loses_only_the_repeat_penalty() {
    let record: PairRecord = PairRecord {
        count: 1,
        last_paired: date!(2024 - 01 - 01),
    };
    assert_eq!(
        pair_weight(Some(&record), TODAY),
        REPEAT_BASE_WEIGHT - REPEAT_PENALTY
    );
}

#[test]
fn test_weight_decreases_with_count_and_recency() {
    let old_once: PairRecord = PairRecord {
        count: 1,
        last_paired: date!(2025 - 06 - 01),
    };
    let old_twice: PairRecord = PairRecord {
        count: 2,
        last_paired: date!(2025 - 06 - 01),
    };
    let recent_once: PairRecord = PairRecord {
        count: 1,
        last_paired: date!(2026 - 02 - 23),
    };

    let w_old_once: i64 = pair_weight(Some(&old_once), TODAY);
    assert!(pair_weight(Some(&old_twice), TODAY) < w_old_once);
    assert!(pair_weight(Some(&recent_once), TODAY) < w_old_once);
    assert!(w_old_once < NEVER_PAIRED_WEIGHT);
}

#[test]
fn test_weight_is_floored_at_one() {
    let record: PairRecord = PairRecord {
        count: 1_000,
        last_paired: TODAY,
    };
    assert_eq!(pair_weight(Some(&record), TODAY), 1);
}

#[test]
fn test_history_from_groups_counts_every_pair_of_a_triad() {
    let history: PairHistory = PairHistory::from_groups(vec![
        (date!(2026 - 02 - 16), ids(&[1, 2, 3])),
        (date!(2026 - 02 - 23), ids(&[2, 1])),
    ]);

    assert_eq!(history.len(), 3);
    let one_two: &PairRecord = history
        .get(EmployeeId::new(2), EmployeeId::new(1))
        .unwrap();
    assert_eq!(one_two.count, 2);
    assert_eq!(one_two.last_paired, date!(2026 - 02 - 23));

    let two_three: &PairRecord = history
        .get(EmployeeId::new(2), EmployeeId::new(3))
        .unwrap();
    assert_eq!(two_three.count, 1);
    assert_eq!(two_three.last_paired, date!(2026 - 02 - 16));
}

#[test]
fn test_record_keeps_latest_date_when_replayed_out_of_order() {
    let mut history: PairHistory = PairHistory::new();
    history.record(EmployeeId::new(1), EmployeeId::new(2), date!(2026 - 02 - 23));
    history.record(EmployeeId::new(1), EmployeeId::new(2), date!(2025 - 02 - 23));

    let record: &PairRecord = history.get(EmployeeId::new(1), EmployeeId::new(2)).unwrap();
    assert_eq!(record.count, 2);
    assert_eq!(record.last_paired, date!(2026 - 02 - 23));
}

#[test]
fn test_self_pairs_are_not_recorded() {
    let mut history: PairHistory = PairHistory::new();
    history.record(EmployeeId::new(4), EmployeeId::new(4), TODAY);
    assert!(history.is_empty());
}

#[test]
fn test_unknown_pair_weight_from_history() {
    let history: PairHistory = PairHistory::new();
    assert_eq!(
        history.weight(EmployeeId::new(1), EmployeeId::new(2), TODAY),
        NEVER_PAIRED_WEIGHT
    );
}
