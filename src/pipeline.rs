use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::extractor;
use crate::scraper::Fetcher;
use crate::summarizer::Summarizer;

/// A successfully processed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
    pub title: Option<String>,
    pub text: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeFailure {
    pub url: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
    /// Always populated so consumers can render failures like successes.
    pub summary: String,
}

impl ScrapeFailure {
    pub fn new(url: &str, error: &AppError) -> Self {
        let error = error.to_string();
        Self {
            url: url.to_string(),
            summary: format!("Error generating summary: {}", error),
            error,
            timestamp: Utc::now(),
        }
    }
}

/// Result of one chain. A batch yields exactly one per input URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Success(PageDocument),
    Failure(ScrapeFailure),
}

impl ScrapeOutcome {
    pub fn url(&self) -> &str {
        match self {
            ScrapeOutcome::Success(page) => &page.url,
            ScrapeOutcome::Failure(failure) => &failure.url,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            ScrapeOutcome::Success(page) => &page.summary,
            ScrapeOutcome::Failure(failure) => &failure.summary,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Success(_))
    }
}

/// Fetch → extract → summarize, fanned out over a batch of URLs.
///
/// Only the fetch stage is throttled, by the fetcher's gate.
pub struct Pipeline {
    fetcher: Fetcher,
    summarizer: Summarizer,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, summarizer: Summarizer) -> Self {
        Self {
            fetcher,
            summarizer,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Runs every chain to completion. `output[i]` always belongs to
    /// `urls[i]`; a failing URL never affects its siblings.
    pub async fn process_batch(&self, urls: &[String]) -> Vec<ScrapeOutcome> {
        info!(urls = urls.len(), "processing batch");

        let outcomes = match urls {
            [url] => vec![self.process_url(url).await],
            _ => join_all(urls.iter().map(|url| self.process_url(url))).await,
        };

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            succeeded,
            failed = outcomes.len() - succeeded,
            "batch finished"
        );
        outcomes
    }

    pub async fn process_url(&self, url: &str) -> ScrapeOutcome {
        match self.run_chain(url).await {
            Ok(page) => ScrapeOutcome::Success(page),
            Err(err) => {
                warn!(url, error = %err, "chain failed");
                ScrapeOutcome::Failure(ScrapeFailure::new(url, &err))
            }
        }
    }

    async fn run_chain(&self, url: &str) -> Result<PageDocument> {
        let html = self.fetcher.fetch(url).await?;
        let retrieved_at = Utc::now();

        let page = extractor::extract(&html);
        let summary = self.summarizer.summarize(&page.text).await?;

        Ok(PageDocument {
            url: url.to_string(),
            retrieved_at,
            title: Some(page.title).filter(|title| !title.is_empty()),
            text: page.text,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_synthesized_summary() {
        let err = AppError::FetchError("boom".to_string());
        let outcome = ScrapeOutcome::Failure(ScrapeFailure::new("https://example.com", &err));

        assert_eq!(outcome.url(), "https://example.com");
        assert_eq!(
            outcome.summary(),
            "Error generating summary: Failed to fetch data: boom"
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let err = AppError::SummaryError("quota".to_string());
        let failure = ScrapeOutcome::Failure(ScrapeFailure::new("https://a.test", &err));

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["url"], "https://a.test");
        assert!(json["summary"].as_str().unwrap().starts_with("Error generating summary:"));
    }
}
