use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use web_summarizer::{
    AppState,
    api::routes::create_router,
    config::Config,
    jobs::{JobRunner, MemoryStore},
    llm::LlmClient,
    pipeline::Pipeline,
    scraper::Fetcher,
    summarizer::Summarizer,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let config = Config::load()?;
    let server_addr = config.server_addr;
    info!(
        model = %config.llm.model,
        rate_limit = config.scraper.rate_limit,
        max_retries = config.scraper.max_retries,
        "configuration loaded"
    );

    let summarizer =
        Summarizer::new(Arc::new(LlmClient::new(&config.llm)?)).with_chunk_size(config.chunk_size);
    let pipeline = Pipeline::new(Fetcher::new(&config.scraper)?, summarizer);
    let jobs = JobRunner::new(Arc::new(pipeline), Arc::new(MemoryStore::new()));

    let app = create_router(AppState { jobs });

    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
