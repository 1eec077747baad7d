use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::{AppError, Result};

/// Retrieves raw page bodies.
///
/// Every attempt holds one permit of the fetcher's own gate, so at most
/// `rate_limit` requests are in flight per fetcher no matter how many
/// chains are waiting on it. The permit is dropped at the end of each
/// attempt, including failed and timed-out ones, and re-acquired for the
/// next one.
pub struct Fetcher {
    client: Client,
    gate: Arc<Semaphore>,
    rate_limit: usize,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        config.validate()?;
        let client = ClientBuilder::new()
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(config.rate_limit)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            gate: Arc::new(Semaphore::new(config.rate_limit)),
            rate_limit: config.rate_limit,
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Gate slots not currently held by an attempt.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    pub fn rate_limit(&self) -> usize {
        self.rate_limit
    }

    /// Fetches `url`, retrying transport errors, timeouts and non-2xx
    /// statuses with a fixed delay until `max_retries` attempts are spent.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "page fetched");
                    return Ok(body);
                }
                Err(err) if attempt < self.max_retries => {
                    warn!(url, attempt, error = %err, "fetch attempt failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(url, attempt, error = %err, "fetch attempts exhausted");
                    return Err(AppError::FetchError(format!(
                        "{} (after {} attempts): {}",
                        url, attempt, err
                    )));
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchAttemptError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FetchAttemptError::GateClosed)?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Debug, thiserror::Error)]
enum FetchAttemptError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("concurrency gate closed")]
    GateClosed,
}
