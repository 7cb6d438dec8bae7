// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Partner announcements.
//!
//! Delivery is split in two jobs: `DeliverNotification` sends and hands the
//! provider's message id to its `MarkNotified` continuation, which records
//! it. A crash between the two leaves the membership unnotified; the replay
//! re-reads the membership before sending again.

use chrono::{SecondsFormat, Utc};
use lunchegram_domain::{
    ChatIdentity, Employee, LunchId, MemberId, MessageFormat, compose_partner_announcement,
};
use lunchegram_persistence::{MembershipData, Persistence};
use tracing::{debug, info, warn};

use super::{StageContext, demote};
use crate::channel::DeliveryError;
use crate::error::PipelineError;
use crate::tasks::{Completion, Continuation, JobEnvelope, Task, TaskOutput};

/// One `NotifyMember` job per membership.
pub(crate) fn notify_jobs(members: &[MemberId]) -> Vec<JobEnvelope> {
    members
        .iter()
        .map(|&member_id| JobEnvelope::new(Task::NotifyMember { member_id }))
        .collect()
}

/// Re-enqueues `NotifyMember` for every member of `lunch_id` not notified yet.
///
/// The queue drops the job for a member whose notification chain is still open.
pub(crate) fn sweep_unnotified(
    store: &mut Persistence,
    lunch_id: LunchId,
) -> Result<Completion, PipelineError> {
    let members: Vec<MemberId> = store.list_unnotified_members(lunch_id)?;
    if !members.is_empty() {
        info!(
            lunch_id = lunch_id.value(),
            members = members.len(),
            "Re-dispatching unnotified members"
        );
    }
    Ok(Completion::spawn(notify_jobs(&members)))
}

/// Composes the announcement for one membership.
pub(crate) async fn notify_member(
    ctx: &StageContext,
    member_id: MemberId,
) -> Result<Completion, PipelineError> {
    let (chat, partners): (ChatIdentity, Vec<Employee>) = {
        let mut store = ctx.store.lock().await;

        let Some(membership) = store.get_membership(member_id)? else {
            debug!(member_id = member_id.value(), "Membership vanished; nothing to send");
            return Ok(Completion::done());
        };
        if membership.is_notified() {
            debug!(member_id = member_id.value(), "Member already notified");
            return Ok(Completion::done());
        }

        let chat: Option<ChatIdentity> = store
            .get_employee(membership.employee_id)?
            .and_then(|employee| employee.chat);
        let Some(chat) = chat else {
            info!(
                member_id = member_id.value(),
                employee_id = membership.employee_id.value(),
                "Member has no chat identity; not notified"
            );
            return Ok(Completion::done());
        };

        (chat, store.list_group_partners(member_id)?)
    };

    let text: String =
        compose_partner_announcement(&partners, ctx.config.profile_url_template.as_deref())?;

    Ok(Completion::spawn(vec![JobEnvelope::chain(
        Task::DeliverNotification {
            member_id,
            chat_id: chat.chat_id,
            text,
            format: ctx.config.message_format,
        },
        Continuation::MarkNotified { member_id },
    )]))
}

/// Sends a composed announcement.
///
/// Outputs the provider's message id for the `MarkNotified` continuation.
/// An unreachable member is demoted and stays unnotified; other failures
/// are retried.
pub(crate) async fn deliver_notification(
    ctx: &StageContext,
    member_id: MemberId,
    chat_id: i64,
    text: &str,
    format: MessageFormat,
) -> Result<Completion, PipelineError> {
    let membership: Option<MembershipData> = ctx.store.lock().await.get_membership(member_id)?;
    let Some(membership) = membership.filter(|m| !m.is_notified()) else {
        debug!(member_id = member_id.value(), "Member already notified; delivery skipped");
        return Ok(Completion::done());
    };

    match ctx.channel.send(&ChatIdentity::new(chat_id), text, format).await {
        Ok(message_id) => {
            info!(member_id = member_id.value(), message_id, "Partner announcement delivered");
            Ok(Completion::with_output(TaskOutput::MessageId(message_id)))
        }
        Err(DeliveryError::Unreachable(reason)) => {
            warn!(
                member_id = member_id.value(),
                employee_id = membership.employee_id.value(),
                reason = %reason,
                "Member unreachable; marking unavailable"
            );
            demote(ctx, membership.employee_id).await?;
            Ok(Completion::done())
        }
        Err(e) => Err(e.into()),
    }
}

/// Records a delivered announcement. Safe to repeat.
pub(crate) async fn mark_notified(
    ctx: &StageContext,
    member_id: MemberId,
    message_id: i64,
) -> Result<Completion, PipelineError> {
    let notified_at: String = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let recorded: bool = ctx
        .store
        .lock()
        .await
        .mark_member_notified(member_id, message_id, &notified_at)?;

    if recorded {
        debug!(member_id = member_id.value(), message_id, "Member marked notified");
    } else {
        info!(member_id = member_id.value(), "Member was already marked notified");
    }
    Ok(Completion::done())
}
