// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Lunch, group and membership queries.
//!
//! Pair history is not stored; it is derived here from past memberships.

use diesel::prelude::*;
#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use lunchegram_domain::{
    CompanyId, Date, Employee, EmployeeId, LunchGroupId, LunchId, MemberId, PairHistory,
    format_date, parse_date,
};

use crate::data_models::{LunchData, LunchGroupData, MembershipData};
use crate::diesel_schema::{employees, lunch_group_members, lunch_groups, lunches, persons};
use crate::error::PersistenceError;
use crate::queries::directory::{EmployeeWithPersonRow, into_employees};

/// Diesel Queryable struct for membership rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = lunch_group_members)]
pub(crate) struct MembershipRow {
    member_id: i64,
    lunch_group_id: i64,
    employee_id: i64,
    notified_at: Option<String>,
    notification_message_id: Option<i64>,
}

impl From<MembershipRow> for MembershipData {
    fn from(row: MembershipRow) -> Self {
        Self {
            member_id: MemberId::new(row.member_id),
            lunch_group_id: LunchGroupId::new(row.lunch_group_id),
            employee_id: EmployeeId::new(row.employee_id),
            notified_at: row.notified_at,
            notification_message_id: row.notification_message_id,
        }
    }
}

backend_fn! {
/// Finds the lunch of a company on a date.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no lunch exists.
pub fn find_lunch(
    conn: &mut _,
    company_id: CompanyId,
    date: Date,
) -> Result<Option<LunchId>, PersistenceError> {
    let lunch_date: String = format_date(date)?;
    let lunch_id: Option<i64> = lunches::table
        .filter(lunches::company_id.eq(company_id.value()))
        .filter(lunches::lunch_date.eq(&lunch_date))
        .select(lunches::lunch_id)
        .first(conn)
        .optional()?;

    Ok(lunch_id.map(LunchId::new))
}
}

backend_fn! {
/// Lists a company's lunches, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored date is invalid.
pub fn list_lunches(conn: &mut _, company_id: CompanyId) -> Result<Vec<LunchData>, PersistenceError> {
    let rows: Vec<(i64, i64, String)> = lunches::table
        .filter(lunches::company_id.eq(company_id.value()))
        .select((lunches::lunch_id, lunches::company_id, lunches::lunch_date))
        .order((lunches::lunch_date.asc(), lunches::lunch_id.asc()))
        .load(conn)?;

    rows.into_iter()
        .map(|(lunch_id, company_id, lunch_date)| -> Result<LunchData, PersistenceError> {
            Ok(LunchData {
                lunch_id: LunchId::new(lunch_id),
                company_id: CompanyId::new(company_id),
                lunch_date: parse_date(&lunch_date)?,
            })
        })
        .collect()
}
}

backend_fn! {
/// Lists the groups of a lunch with their memberships.
///
/// Groups are in group id order, members in member id order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_lunch_groups(
    conn: &mut _,
    lunch_id: LunchId,
) -> Result<Vec<LunchGroupData>, PersistenceError> {
    let group_ids: Vec<i64> = lunch_groups::table
        .filter(lunch_groups::lunch_id.eq(lunch_id.value()))
        .select(lunch_groups::lunch_group_id)
        .order(lunch_groups::lunch_group_id.asc())
        .load(conn)?;

    let members: Vec<MembershipRow> = lunch_group_members::table
        .filter(lunch_group_members::lunch_group_id.eq_any(&group_ids))
        .select(MembershipRow::as_select())
        .order(lunch_group_members::member_id.asc())
        .load(conn)?;

    let mut groups: Vec<LunchGroupData> = group_ids
        .iter()
        .map(|&id| LunchGroupData {
            lunch_group_id: LunchGroupId::new(id),
            lunch_id,
            members: Vec::new(),
        })
        .collect();
    for member in members {
        let member: MembershipData = member.into();
        if let Some(group) = groups
            .iter_mut()
            .find(|group| group.lunch_group_id == member.lunch_group_id)
        {
            group.members.push(member);
        }
    }
    Ok(groups)
}
}

backend_fn! {
/// Retrieves a membership by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the membership does not exist.
pub fn get_membership(
    conn: &mut _,
    member_id: MemberId,
) -> Result<Option<MembershipData>, PersistenceError> {
    let row: Option<MembershipRow> = lunch_group_members::table
        .filter(lunch_group_members::member_id.eq(member_id.value()))
        .select(MembershipRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(MembershipData::from))
}
}

backend_fn! {
/// Lists the employees sharing a group with `member_id`, in member id order.
///
/// # Errors
///
/// Returns an error if the membership does not exist or the query fails.
pub fn list_group_partners(
    conn: &mut _,
    member_id: MemberId,
) -> Result<Vec<Employee>, PersistenceError> {
    let lunch_group_id: i64 = lunch_group_members::table
        .filter(lunch_group_members::member_id.eq(member_id.value()))
        .select(lunch_group_members::lunch_group_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Membership {member_id}")))?;

    let rows: Vec<EmployeeWithPersonRow> = lunch_group_members::table
        .inner_join(employees::table.inner_join(persons::table))
        .filter(lunch_group_members::lunch_group_id.eq(lunch_group_id))
        .filter(lunch_group_members::member_id.ne(member_id.value()))
        .order(lunch_group_members::member_id.asc())
        .select(EmployeeWithPersonRow::as_select())
        .load(conn)?;

    into_employees(rows)
}
}

backend_fn! {
/// Lists the memberships of a lunch that were not notified yet.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_unnotified_members(
    conn: &mut _,
    lunch_id: LunchId,
) -> Result<Vec<MemberId>, PersistenceError> {
    let ids: Vec<i64> = lunch_group_members::table
        .inner_join(lunch_groups::table)
        .filter(lunch_groups::lunch_id.eq(lunch_id.value()))
        .filter(lunch_group_members::notified_at.is_null())
        .select(lunch_group_members::member_id)
        .order(lunch_group_members::member_id.asc())
        .load(conn)?;

    Ok(ids.into_iter().map(MemberId::new).collect())
}
}

backend_fn! {
/// Rebuilds a company's pair history from all of its past lunch groups.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored date is invalid.
pub fn load_pair_history(
    conn: &mut _,
    company_id: CompanyId,
) -> Result<PairHistory, PersistenceError> {
    let rows: Vec<(i64, String, i64)> = lunch_group_members::table
        .inner_join(lunch_groups::table.inner_join(lunches::table))
        .filter(lunches::company_id.eq(company_id.value()))
        .select((
            lunch_group_members::lunch_group_id,
            lunches::lunch_date,
            lunch_group_members::employee_id,
        ))
        .order((
            lunch_group_members::lunch_group_id.asc(),
            lunch_group_members::employee_id.asc(),
        ))
        .load(conn)?;

    let mut groups: Vec<(i64, Date, Vec<EmployeeId>)> = Vec::new();
    for (group_id, lunch_date, employee_id) in rows {
        match groups.last_mut() {
            Some((current, _, members)) if *current == group_id => {
                members.push(EmployeeId::new(employee_id));
            }
            _ => groups.push((
                group_id,
                parse_date(&lunch_date)?,
                vec![EmployeeId::new(employee_id)],
            )),
        }
    }

    Ok(PairHistory::from_groups(
        groups.into_iter().map(|(_, date, members)| (date, members)),
    ))
}
}
