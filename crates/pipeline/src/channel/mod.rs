// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Chat delivery channel.
//!
//! The pipeline only needs one operation: send a text to a chat identity and
//! get the provider's message id back. Recipients who blocked or removed the
//! bot are reported as [`DeliveryError::Unreachable`] so callers can demote
//! them instead of retrying.

mod logging;
mod telegram;

pub use logging::LoggingChannel;
pub use telegram::{TELEGRAM_API_URL, TelegramChannel};

use async_trait::async_trait;
use lunchegram_domain::{ChatIdentity, MessageFormat};
use thiserror::Error;

/// Why a message was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient blocked or removed the bot; retrying will not help.
    #[error("recipient unreachable: {0}")]
    Unreachable(String),
    /// Any other failure, including timeouts.
    #[error("delivery failed: {0}")]
    Failed(String),
}

impl DeliveryError {
    /// Returns true for [`DeliveryError::Unreachable`].
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Sends messages to chat users.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Sends `text` to `recipient` and returns the provider's message id.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Unreachable`] if the recipient cannot be
    /// reached at all, [`DeliveryError::Failed`] otherwise.
    async fn send(
        &self,
        recipient: &ChatIdentity,
        text: &str,
        format: MessageFormat,
    ) -> Result<i64, DeliveryError>;
}
