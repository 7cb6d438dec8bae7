// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lunch materialization and notification bookkeeping.
//!
//! ## Invariants
//!
//! - A lunch, all of its groups and all of their memberships are created in
//!   one transaction; a failure leaves nothing behind.
//! - At most one lunch exists per company and date.
//! - A membership's notification fields are written once and never changed.

use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use lunchegram_domain::{CompanyId, Date, LunchId, MatchedGroup, MemberId, format_date};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::MaterializedLunch;
use crate::diesel_schema::{lunch_group_members, lunch_groups, lunches};
use crate::error::PersistenceError;

backend_fn! {
/// Creates a lunch with its groups and memberships atomically.
///
/// # Errors
///
/// Returns [`PersistenceError::LunchAlreadyExists`] if the company already has
/// a lunch on `date`; callers replaying this step treat that as success.
/// Any other error rolls the whole lunch back.
pub fn materialize_lunch(
    conn: &mut _,
    company_id: CompanyId,
    date: Date,
    groups: &[MatchedGroup],
) -> Result<MaterializedLunch, PersistenceError> {
    let lunch_date: String = format_date(date)?;
    let already_exists = || PersistenceError::LunchAlreadyExists {
        company_id,
        date: lunch_date.clone(),
    };

    conn.transaction::<_, PersistenceError, _>(|conn| {
        let existing: Option<i64> = lunches::table
            .filter(lunches::company_id.eq(company_id.value()))
            .filter(lunches::lunch_date.eq(&lunch_date))
            .select(lunches::lunch_id)
            .first(conn)
            .optional()?;
        if existing.is_some() {
            return Err(already_exists());
        }

        diesel::insert_into(lunches::table)
            .values((
                lunches::company_id.eq(company_id.value()),
                lunches::lunch_date.eq(&lunch_date),
            ))
            .execute(conn)
            .map_err(|e| match PersistenceError::from(e) {
                PersistenceError::AlreadyExists(_) => already_exists(),
                other => other,
            })?;
        let lunch_id: i64 = conn.get_last_insert_rowid()?;

        let mut members: Vec<MemberId> = Vec::new();
        for group in groups {
            diesel::insert_into(lunch_groups::table)
                .values(lunch_groups::lunch_id.eq(lunch_id))
                .execute(conn)?;
            let lunch_group_id: i64 = conn.get_last_insert_rowid()?;

            for employee_id in group.members() {
                diesel::insert_into(lunch_group_members::table)
                    .values((
                        lunch_group_members::lunch_group_id.eq(lunch_group_id),
                        lunch_group_members::employee_id.eq(employee_id.value()),
                    ))
                    .execute(conn)?;
                members.push(MemberId::new(conn.get_last_insert_rowid()?));
            }
        }

        info!(
            company_id = company_id.value(),
            lunch_id,
            groups = groups.len(),
            members = members.len(),
            "Materialized lunch"
        );

        Ok(MaterializedLunch {
            lunch_id: LunchId::new(lunch_id),
            members,
        })
    })
}
}

backend_fn! {
/// Records that a member was notified.
///
/// Only the first call writes; later calls leave the stored timestamp and
/// message id untouched.
///
/// # Returns
///
/// `true` if this call recorded the notification.
///
/// # Errors
///
/// Returns an error if the membership does not exist or the update fails.
pub fn mark_member_notified(
    conn: &mut _,
    member_id: MemberId,
    message_id: i64,
    notified_at: &str,
) -> Result<bool, PersistenceError> {
    let rows_affected: usize = diesel::update(lunch_group_members::table)
        .filter(lunch_group_members::member_id.eq(member_id.value()))
        .filter(lunch_group_members::notified_at.is_null())
        .set((
            lunch_group_members::notified_at.eq(notified_at),
            lunch_group_members::notification_message_id.eq(message_id),
        ))
        .execute(conn)?;

    if rows_affected > 0 {
        debug!(member_id = member_id.value(), message_id, "Member marked notified");
        return Ok(true);
    }

    let exists: i64 = lunch_group_members::table
        .filter(lunch_group_members::member_id.eq(member_id.value()))
        .count()
        .get_result(conn)?;
    if exists == 0 {
        return Err(PersistenceError::NotFound(format!("Membership {member_id}")));
    }

    debug!(member_id = member_id.value(), "Member already notified");
    Ok(false)
}
}
