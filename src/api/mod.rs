//! REST API module.
//!
//! Handlers stay thin: they pull the actor, path and query apart, call one
//! engine operation and wrap the result in the response envelope.

mod attendance;
mod datastore;
mod employees;
mod holidays;
mod reports;

pub use attendance::*;
pub use datastore::*;
pub use employees::*;
pub use holidays::*;
pub use reports::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::engine::AttendanceEngine;
use crate::errors::{AppError, AppErrorWithRevision};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision::new(err, revision_id))
}

/// Wraps an engine result, stamped with the revision read after the operation.
pub async fn reply<T: Serialize>(
    engine: &AttendanceEngine,
    result: Result<T, AppError>,
) -> ApiResult<T> {
    let revision_id = engine.revision_id().await.unwrap_or(0);

    match result {
        Ok(data) => success(data, revision_id),
        Err(e) => error(e, revision_id),
    }
}
