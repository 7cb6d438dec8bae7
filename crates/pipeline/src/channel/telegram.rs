// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Telegram Bot API channel.

use async_trait::async_trait;
use lunchegram_domain::{ChatIdentity, MessageFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatChannel, DeliveryError};

/// Public Bot API endpoint.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Descriptions Telegram returns for recipients that will never accept a message.
const UNREACHABLE_DESCRIPTIONS: [&str; 4] = [
    "bot was blocked by the user",
    "user is deactivated",
    "chat not found",
    "bot can't initiate conversation",
];

/// Sends messages through the Telegram Bot API.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramChannel {
    /// Creates a channel for `bot_token` against [`TELEGRAM_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(bot_token: impl Into<String>) -> Result<Self, DeliveryError> {
        Self::with_api_url(TELEGRAM_API_URL, bot_token)
    }

    /// Creates a channel against a custom Bot API server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_api_url(
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client: reqwest::Client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Failed(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.bot_token)
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Maps a Bot API error to a delivery error.
///
/// 403 always means the bot may not write to the user. A few 400 responses
/// mean the same thing and are recognized by their description.
pub(crate) fn classify_api_error(error_code: Option<i64>, description: &str) -> DeliveryError {
    let lowered: String = description.to_lowercase();
    if error_code == Some(403)
        || UNREACHABLE_DESCRIPTIONS
            .iter()
            .any(|needle| lowered.contains(needle))
    {
        DeliveryError::Unreachable(description.to_string())
    } else {
        DeliveryError::Failed(match error_code {
            Some(code) => format!("{code}: {description}"),
            None => description.to_string(),
        })
    }
}

#[async_trait]
impl ChatChannel for TelegramChannel {
    async fn send(
        &self,
        recipient: &ChatIdentity,
        text: &str,
        format: MessageFormat,
    ) -> Result<i64, DeliveryError> {
        let request = SendMessageRequest {
            chat_id: recipient.chat_id,
            text,
            parse_mode: format.parse_mode(),
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Failed(format!("sendMessage request: {e}")))?;

        let body: ApiResponse<SentMessage> = response
            .json()
            .await
            .map_err(|e| DeliveryError::Failed(format!("sendMessage response: {e}")))?;

        if !body.ok {
            return Err(classify_api_error(
                body.error_code,
                body.description.as_deref().unwrap_or("unknown error"),
            ));
        }

        let message: SentMessage = body
            .result
            .ok_or_else(|| DeliveryError::Failed(String::from("sendMessage returned no message")))?;
        debug!(chat_id = recipient.chat_id, message_id = message.message_id, "Message sent");
        Ok(message.message_id)
    }
}
