use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use reqwest::Url;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api::models::{ScrapeRequest, ScrapeResponse};
use crate::api::response::{self, Reply};
use crate::error::{AppError, Result};
use crate::jobs::{ContentQuery, ContentRecord, Job, JobId, JobStatus};

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_handler))
        .route("/api/jobs/:id", get(job_handler))
        .route("/api/content", get(content_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Responds as soon as the job is stored. The `JobHandle` is dropped here:
/// clients follow progress through `/api/jobs/:id`, which the job task keeps
/// current even when it fails.
async fn scrape_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Reply<ScrapeResponse>> {
    let Json(req) = payload?;
    validate_urls(&req.urls)?;

    let handle = state.jobs.submit(req.urls).await?;
    info!(job_id = handle.id, "scrape job accepted");

    Ok(response::accepted(
        ScrapeResponse {
            job_id: handle.id,
            status: JobStatus::Pending,
            message: "Scraping job created successfully".to_string(),
        },
        "job queued",
    ))
}

async fn job_handler(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Reply<Job>> {
    let job = state
        .jobs
        .store()
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {}", id)))?;
    Ok(response::success(job))
}

async fn content_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ContentQuery>, QueryRejection>,
) -> Result<Reply<Vec<ContentRecord>>> {
    let Query(query) = query?;
    let records = state.jobs.store().list_content(&query).await?;
    Ok(response::success(records))
}

/// Accepts only a non-empty list of absolute http(s) URLs.
fn validate_urls(urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        return Err(AppError::InvalidRequest("urls must not be empty".to_string()));
    }

    for raw in urls {
        let url = Url::parse(raw)
            .map_err(|e| AppError::InvalidRequest(format!("invalid url {:?}: {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(AppError::InvalidRequest(format!(
                "unsupported url {:?}: expected an absolute http(s) url",
                raw
            )));
        }
    }
    Ok(())
}
