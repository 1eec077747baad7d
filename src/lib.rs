pub mod api;
pub mod config;
pub mod error;
pub mod extractor;
pub mod jobs;
pub mod llm;
pub mod pipeline;
pub mod scraper;
pub mod summarizer;
pub mod telemetry;

use jobs::JobRunner;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobRunner,
}
