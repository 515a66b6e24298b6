use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, StageLensError};

/// Fetches history exports over HTTP.
pub struct RemoteClient {
    client: Client,
    token: Option<Token>,
    max_retries: u32,
    retry_delay: Duration,
}

impl RemoteClient {
    pub fn new(token: Option<Token>, max_retries: u32, retry_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stagelens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StageLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            max_retries,
            retry_delay,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// GETs `url` and returns the body, retrying network errors, 429 and 5xx.
    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        let mut retry_count = 0;
        loop {
            let request = self.auth_request(self.client.get(url.clone()));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= self.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({e}), retrying in {}s ({}/{})...",
                        self.retry_delay.as_secs(),
                        retry_count + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == 429 || status.is_server_error() {
                if retry_count >= self.max_retries {
                    return Err(StageLensError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: self.max_retries,
                    });
                }

                warn!(
                    "History API error (status {status}). Waiting {} seconds before retry {}/{}...",
                    self.retry_delay.as_secs(),
                    retry_count + 1,
                    self.max_retries
                );

                tokio::time::sleep(self.retry_delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(StageLensError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            let body = response.text().await?;
            debug!("Fetched {} bytes from {url}", body.len());
            return Ok(body);
        }
    }
}
