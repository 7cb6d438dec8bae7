// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Matching and materialization of one company's lunch.

use lunchegram_domain::{
    CompanyId, Date, Employee, EmployeeId, MIN_GROUP_SIZE, MatchedGroup, PairHistory,
    match_groups, validate_partition,
};
use lunchegram_persistence::{MaterializedLunch, PersistenceError};
use tracing::info;

use super::{StageContext, eligible_employees, matching_pool, notify_jobs, sweep_unnotified};
use crate::error::PipelineError;
use crate::tasks::Completion;

/// Matches the post-probe pool and creates the lunch.
///
/// Runs as the join of the probe batch, so availability reflects every
/// probe's outcome. A lunch that already exists (a replay of this step) turns
/// into a sweep of its unnotified members. An invalid partition is returned
/// as a non-retryable error before anything is written.
pub(crate) async fn match_company(
    ctx: &StageContext,
    company_id: CompanyId,
    date: Date,
) -> Result<Completion, PipelineError> {
    let mut store = ctx.store.lock().await;

    if let Some(lunch_id) = store.find_lunch(company_id, date)? {
        info!(
            company_id = company_id.value(),
            lunch_id = lunch_id.value(),
            "Lunch already exists; sweeping unnotified members"
        );
        return sweep_unnotified(&mut store, lunch_id);
    }

    let employees: Vec<Employee> = eligible_employees(&mut store, company_id)?;
    let pool: Vec<EmployeeId> = matching_pool(&employees);
    if pool.len() < MIN_GROUP_SIZE {
        info!(
            company_id = company_id.value(),
            pool = pool.len(),
            "Not enough reachable employees to form a group; no lunch today"
        );
        return Ok(Completion::done());
    }

    let history: PairHistory = store.load_pair_history(company_id)?;
    let groups: Vec<MatchedGroup> = match_groups(&pool, &history, date)?;
    validate_partition(&pool, &groups)?;
    info!(
        company_id = company_id.value(),
        pool = pool.len(),
        groups = groups.len(),
        known_pairs = history.len(),
        "Matched lunch groups"
    );

    match store.materialize_lunch(company_id, date, &groups) {
        Ok(MaterializedLunch { members, .. }) => Ok(Completion::spawn(notify_jobs(&members))),
        Err(PersistenceError::LunchAlreadyExists { .. }) => {
            let Some(lunch_id) = store.find_lunch(company_id, date)? else {
                return Ok(Completion::done());
            };
            info!(
                company_id = company_id.value(),
                lunch_id = lunch_id.value(),
                "Lunch created concurrently; sweeping unnotified members"
            );
            sweep_unnotified(&mut store, lunch_id)
        }
        Err(e) => Err(e.into()),
    }
}
