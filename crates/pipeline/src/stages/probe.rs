// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lunchegram_domain::{ChatIdentity, Employee, EmployeeId, MessageFormat};
use tracing::{debug, info, warn};

use super::{StageContext, demote};
use crate::channel::DeliveryError;
use crate::error::PipelineError;
use crate::tasks::Completion;

/// Sends the probe message to one employee.
///
/// Never fails on delivery: an unreachable employee is demoted, any other
/// delivery failure leaves the employee eligible. Only storage errors are
/// returned, so the batch join is not held up by chat problems.
pub(crate) async fn probe_employee(
    ctx: &StageContext,
    employee_id: EmployeeId,
) -> Result<Completion, PipelineError> {
    let employee: Option<Employee> = ctx.store.lock().await.get_employee(employee_id)?;
    let Some(employee) = employee.filter(Employee::is_available) else {
        debug!(employee_id = employee_id.value(), "Employee no longer eligible; probe skipped");
        return Ok(Completion::done());
    };

    let Some(chat) = employee.chat.as_ref() else {
        info!(
            employee_id = employee_id.value(),
            "Employee has no chat identity; marking unavailable"
        );
        demote(ctx, employee_id).await?;
        return Ok(Completion::done());
    };

    match send_probe(ctx, chat).await {
        Ok(message_id) => {
            debug!(employee_id = employee_id.value(), message_id, "Probe delivered");
        }
        Err(DeliveryError::Unreachable(reason)) => {
            warn!(
                employee_id = employee_id.value(),
                reason = %reason, "Employee unreachable; marking unavailable"
            );
            demote(ctx, employee_id).await?;
        }
        Err(DeliveryError::Failed(reason)) => {
            warn!(
                employee_id = employee_id.value(),
                reason = %reason, "Probe failed; employee stays eligible"
            );
        }
    }

    Ok(Completion::done())
}

async fn send_probe(ctx: &StageContext, chat: &ChatIdentity) -> Result<i64, DeliveryError> {
    ctx.channel
        .send(chat, &ctx.config.probe_message, MessageFormat::Plain)
        .await
}
