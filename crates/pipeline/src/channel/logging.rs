// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use async_trait::async_trait;
use lunchegram_domain::{ChatIdentity, MessageFormat};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

use super::{ChatChannel, DeliveryError};

/// Dry-run channel: logs every message instead of sending it.
///
/// Message ids are sequential, starting at 1.
#[derive(Debug, Default)]
pub struct LoggingChannel {
    next_message_id: AtomicI64,
}

impl LoggingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatChannel for LoggingChannel {
    async fn send(
        &self,
        recipient: &ChatIdentity,
        text: &str,
        format: MessageFormat,
    ) -> Result<i64, DeliveryError> {
        let message_id: i64 = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            chat_id = recipient.chat_id,
            message_id,
            ?format,
            text,
            "Dry run: message not sent"
        );
        Ok(message_id)
    }
}
