use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope shared by every API response.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

#[derive(Serialize, Deserialize)]
pub struct ResponseMeta {
    pub status: String,
    pub status_code: u16,
    pub timestamp: String,
    pub message: Option<String>,
}

pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn envelope<T>(status: StatusCode, data: Option<T>, message: Option<String>) -> Reply<T> {
    let meta = ResponseMeta {
        status: if status.is_success() { "success" } else { "error" }.to_string(),
        status_code: status.as_u16(),
        timestamp: Utc::now().to_rfc3339(),
        message,
    };

    (status, Json(ApiResponse { data, meta }))
}

pub fn success<T: Serialize>(data: T) -> Reply<T> {
    envelope(StatusCode::OK, Some(data), None)
}

pub fn accepted<T: Serialize>(data: T, message: impl Into<String>) -> Reply<T> {
    envelope(StatusCode::ACCEPTED, Some(data), Some(message.into()))
}

pub fn error<T>(status: StatusCode, message: String) -> Reply<T> {
    envelope(status, None, Some(message))
}
