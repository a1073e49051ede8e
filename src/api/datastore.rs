//! Datastore API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::errors::AppErrorWithRevision;
use crate::models::RevisionInfo;
use crate::AppState;

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state
        .engine
        .revision_info()
        .await
        .map_err(|e| AppErrorWithRevision::new(e, 0))?;

    let revision_id = revision_info.revision_id;
    success(revision_info, revision_id)
}
