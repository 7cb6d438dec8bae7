// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use async_trait::async_trait;
use lunchegram_domain::DirectoryRecord;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DirectoryClient, DirectoryClientError};

/// Default HR API base URL.
pub const HR_API_URL: &str = "https://gkit.ru/hr/api/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Every HR API response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HR directory API client.
///
/// Requests carry the API key in the `APIKEY` header and time out after ten
/// seconds.
pub struct HrDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HrDirectoryClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, DirectoryClientError> {
        let client: reqwest::Client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DirectoryClientError::Transport(e.to_string()))?;
        let mut base_url: String = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// URL of an API method; methods always end with a slash.
    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}{}/", self.base_url, method.trim_matches('/'))
    }
}

#[async_trait]
impl DirectoryClient for HrDirectoryClient {
    async fn list_users(&self) -> Result<Vec<DirectoryRecord>, DirectoryClientError> {
        let response = self
            .client
            .get(self.method_url("users"))
            .header("APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| DirectoryClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message: String = response.text().await.unwrap_or_default();
            return Err(DirectoryClientError::from_status(status.as_u16(), message));
        }

        let envelope: Envelope<Vec<DirectoryRecord>> = response
            .json()
            .await
            .map_err(|e| DirectoryClientError::Transport(e.to_string()))?;
        debug!(records = envelope.data.len(), "Fetched HR directory");
        Ok(envelope.data)
    }
}
