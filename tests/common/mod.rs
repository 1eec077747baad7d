#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use tokio::net::TcpListener;
use web_summarizer::{
    config::ScraperConfig,
    error::{AppError, Result},
    llm::{GenerationRequest, TextGenerator},
    pipeline::Pipeline,
    scraper::Fetcher,
    summarizer::Summarizer,
};

pub const ARTICLE_HTML: &str = r#"
<html>
  <head><title>Gate Notes</title><script>window.analytics = true;</script></head>
  <body>
    <nav>menu</nav>
    <main>
      <h1>Semaphores</h1>
      <p>real content about counting semaphores</p>
    </main>
    <p>stray paragraph</p>
    <footer>footer text</footer>
  </body>
</html>
"#;

#[derive(Default)]
pub struct Counters {
    pub flaky_hits: AtomicUsize,
    pub slow_hits: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// A small site with well-behaved, failing, slow and instrumented pages.
pub async fn spawn_site() -> (String, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let app = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_HTML) }))
        .route("/page/:n", get(numbered_page))
        .route("/flaky", get(flaky))
        .route("/slow", get(slow))
        .route("/gated/:n", get(gated))
        .with_state(Arc::clone(&counters));

    (spawn_server(app).await, counters)
}

fn page_html(n: u32) -> String {
    format!(
        "<html><head><title>Page {n}</title></head><body><p>body of page {n}</p></body></html>"
    )
}

async fn numbered_page(Path(n): Path<u32>) -> Html<String> {
    Html(page_html(n))
}

async fn flaky(State(counters): State<Arc<Counters>>) -> StatusCode {
    counters.flaky_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow(State(counters): State<Arc<Counters>>) -> Html<&'static str> {
    counters.slow_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    Html(ARTICLE_HTML)
}

async fn gated(State(counters): State<Arc<Counters>>, Path(n): Path<u32>) -> Html<String> {
    let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    Html(page_html(n))
}

/// Deterministic generator: echoes the first words of the stuffed text.
#[derive(Default)]
pub struct StubGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = request.chunks.concat();
        let words: Vec<&str> = text.split_whitespace().take(4).collect();
        Ok(format!("summary: {}", words.join(" ")))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String> {
        Err(AppError::SummaryError("upstream quota exhausted".to_string()))
    }
}

pub fn scraper_config(rate_limit: usize, max_retries: u32) -> ScraperConfig {
    ScraperConfig {
        rate_limit,
        timeout: Duration::from_secs(2),
        max_retries,
        retry_delay: Duration::from_millis(100),
    }
}

pub fn pipeline(config: &ScraperConfig, generator: Arc<dyn TextGenerator>) -> Pipeline {
    Pipeline::new(Fetcher::new(config).unwrap(), Summarizer::new(generator))
}
