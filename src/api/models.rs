use serde::{Deserialize, Serialize};

use crate::jobs::{JobId, JobStatus};

#[derive(Deserialize)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}
