//! Attendance API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{reply, ApiResult};
use crate::auth::Actor;
use crate::engine::{Correction, DailyOverview, TodayAttendance};
use crate::errors::AppError;
use crate::models::{
    AttendanceView, ChangeLog, CheckInRequest, CorrectAttendanceRequest, CreateAttendanceRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogQuery {
    pub attendance_id: Option<i64>,
}

fn require_self(actor: i64, employee_id: i64) -> Result<(), AppError> {
    if actor != employee_id {
        return Err(AppError::Forbidden(
            "Employees can only record their own attendance".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/employees/{id}/check-in - Check in now.
pub async fn check_in(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<AttendanceView> {
    let result = match require_self(actor, id) {
        Ok(()) => state.engine.check_in(id, state.clock.now(), &request).await,
        Err(e) => Err(e),
    };
    reply(&state.engine, result).await
}

/// POST /api/employees/{id}/check-out - Check out now.
pub async fn check_out(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> ApiResult<AttendanceView> {
    let result = match require_self(actor, id) {
        Ok(()) => state.engine.check_out(id, state.clock.now()).await,
        Err(e) => Err(e),
    };
    reply(&state.engine, result).await
}

/// GET /api/employees/{id}/attendance/today - Today's status.
pub async fn today_attendance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<TodayAttendance> {
    let today = state.clock.now().date();
    let result = state.engine.today_attendance(id, today).await;
    reply(&state.engine, result).await
}

/// GET /api/employees/{id}/attendance - History, newest first.
pub async fn attendance_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<AttendanceView>> {
    let result = state
        .engine
        .attendance_history(id, query.from, query.to)
        .await;
    reply(&state.engine, result).await
}

/// GET /api/attendance - Every employee's status on one date.
pub async fn daily_overview(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<DailyOverview> {
    let date = query.date.unwrap_or_else(|| state.clock.now().date());
    let result = state.engine.daily_overview(date).await;
    reply(&state.engine, result).await
}

/// POST /api/attendance - Add a record by hand (admin).
pub async fn create_attendance(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateAttendanceRequest>,
) -> ApiResult<AttendanceView> {
    let result = state.engine.add_attendance(actor, &request).await;
    reply(&state.engine, result).await
}

/// PUT /api/attendance/{id} - Correct a record (admin).
pub async fn correct_attendance(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(request): Json<CorrectAttendanceRequest>,
) -> ApiResult<Correction> {
    let result = state.engine.correct_attendance(actor, id, &request).await;
    reply(&state.engine, result).await
}

/// GET /api/change-logs - Correction audit trail, newest first.
pub async fn list_change_logs(
    State(state): State<AppState>,
    Query(query): Query<ChangeLogQuery>,
) -> ApiResult<Vec<ChangeLog>> {
    let result = state.engine.change_logs(query.attendance_id).await;
    reply(&state.engine, result).await
}
