//! Background scrape jobs and the store that tracks them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::pipeline::{Pipeline, ScrapeOutcome};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub urls: Vec<String>,
    pub results: Vec<ScrapeOutcome>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    fn transition(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Stored page content, one per URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub url: String,
    pub title: String,
    pub text: String,
    pub summary: String,
    pub retrieved_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentQuery {
    pub url: Option<String>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    1
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            url: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}

/// Persistence for jobs and scraped content.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, urls: Vec<String>) -> Result<Job>;

    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;

    async fn put_job(&self, job: Job) -> Result<()>;

    /// Inserts or replaces the record for `record.url`.
    async fn save_content(&self, record: ContentRecord) -> Result<()>;

    /// Newest first.
    async fn list_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>>;
}

#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicU64,
    jobs: RwLock<HashMap<JobId, Job>>,
    content: RwLock<HashMap<String, ContentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, urls: Vec<String>) -> Result<Job> {
        let now = Utc::now();
        let job = Job {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            status: JobStatus::Pending,
            urls,
            results: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn put_job(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(AppError::NotFound(format!("job {}", job.id))),
        }
    }

    async fn save_content(&self, mut record: ContentRecord) -> Result<()> {
        let mut content = self.content.write().await;
        if let Some(existing) = content.get(&record.url) {
            record.created_at = existing.created_at;
        }
        content.insert(record.url.clone(), record);
        Ok(())
    }

    async fn list_content(&self, query: &ContentQuery) -> Result<Vec<ContentRecord>> {
        let content = self.content.read().await;
        let mut records: Vec<ContentRecord> = content
            .values()
            .filter(|record| query.url.as_deref().is_none_or(|url| record.url == url))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(records
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .collect())
    }
}

/// Completion side of a submitted job.
pub struct JobHandle {
    pub id: JobId,
    completion: JoinHandle<JobStatus>,
}

impl JobHandle {
    /// Waits for the job to reach a terminal status.
    pub async fn wait(self) -> JobStatus {
        self.completion.await.unwrap_or(JobStatus::Failed)
    }
}

/// Runs scrape batches on the tokio executor and records their progress.
#[derive(Clone)]
pub struct JobRunner {
    pipeline: Arc<Pipeline>,
    store: Arc<dyn JobStore>,
}

impl JobRunner {
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<dyn JobStore>) -> Self {
        Self { pipeline, store }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Creates a pending job and starts it in the background.
    pub async fn submit(&self, urls: Vec<String>) -> Result<JobHandle> {
        let job = self.store.create_job(urls).await?;
        let id = job.id;
        info!(job_id = id, urls = job.urls.len(), "job created");

        let pipeline = Arc::clone(&self.pipeline);
        let store = Arc::clone(&self.store);
        let completion = tokio::spawn(async move {
            let run = tokio::spawn(execute(pipeline, Arc::clone(&store), job));
            let result = match run.await {
                Ok(result) => result,
                Err(join_err) => Err(AppError::JobError(format!("job task aborted: {}", join_err))),
            };

            match result {
                Ok(()) => {
                    info!(job_id = id, "job completed");
                    JobStatus::Completed
                }
                Err(err) => {
                    error!(job_id = id, error = %err, "job failed");
                    if let Err(store_err) = mark_failed(store.as_ref(), id, &err).await {
                        error!(job_id = id, error = %store_err, "could not record job failure");
                    }
                    JobStatus::Failed
                }
            }
        });

        Ok(JobHandle { id, completion })
    }
}

async fn execute(pipeline: Arc<Pipeline>, store: Arc<dyn JobStore>, mut job: Job) -> Result<()> {
    job.transition(JobStatus::Running);
    store.put_job(job.clone()).await?;

    let outcomes = pipeline.process_batch(&job.urls).await;

    for outcome in &outcomes {
        if let ScrapeOutcome::Success(page) = outcome {
            let now = Utc::now();
            store
                .save_content(ContentRecord {
                    url: page.url.clone(),
                    title: page.title.clone().unwrap_or_default(),
                    text: page.text.clone(),
                    summary: page.summary.clone(),
                    retrieved_at: page.retrieved_at,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }
    }

    job.results = outcomes;
    job.transition(JobStatus::Completed);
    store.put_job(job).await
}

async fn mark_failed(store: &dyn JobStore, id: JobId, err: &AppError) -> Result<()> {
    let mut job = store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {}", id)))?;
    job.error = Some(err.to_string());
    job.transition(JobStatus::Failed);
    store.put_job(job).await
}
