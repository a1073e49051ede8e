//! Statistics, ranking, alert and report endpoints.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::{reply, ApiResult};
use crate::engine::alerts::Alert;
use crate::engine::calendar::month_bounds;
use crate::engine::report::{render_csv, ReportRow};
use crate::engine::scoring::RankedEmployee;
use crate::engine::stats::MonthlyStats;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::AppState;

/// Month selector; both parts default to the current month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub limit: Option<usize>,
}

/// Report range; defaults to the current month.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub employee_id: Option<i64>,
}

fn report_range(query: &ReportQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let (first, last) = month_bounds(today.year(), today.month())
        .ok_or_else(|| AppError::Internal(format!("No month bounds for {}", today)))?;
    Ok((query.from.unwrap_or(first), query.to.unwrap_or(last)))
}

/// GET /api/employees/{id}/stats - Monthly statistics.
pub async fn monthly_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<MonthlyStats> {
    let today = state.clock.now().date();
    let result = state
        .engine
        .monthly_stats(
            id,
            query.year.unwrap_or(today.year()),
            query.month.unwrap_or(today.month()),
            today,
        )
        .await;
    reply(&state.engine, result).await
}

/// GET /api/rankings - Employees ordered by score.
pub async fn rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Vec<RankedEmployee>> {
    let today = state.clock.now().date();
    let result = state
        .engine
        .top_performers(
            query.year.unwrap_or(today.year()),
            query.month.unwrap_or(today.month()),
            today,
            query.limit,
        )
        .await;
    reply(&state.engine, result).await
}

/// GET /api/alerts - Admin dashboard alerts.
pub async fn alerts(State(state): State<AppState>) -> ApiResult<Vec<Alert>> {
    let result = state.engine.alerts(state.clock.now()).await;
    reply(&state.engine, result).await
}

/// GET /api/reports/attendance - Report rows as JSON.
pub async fn attendance_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Vec<ReportRow>> {
    let result = match report_range(&query, state.clock.now().date()) {
        Ok((from, to)) => {
            state
                .engine
                .attendance_report(from, to, query.employee_id)
                .await
        }
        Err(e) => Err(e),
    };
    reply(&state.engine, result).await
}

/// GET /api/reports/attendance.csv - Report rows as a CSV download.
pub async fn attendance_report_csv(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppErrorWithRevision> {
    let revision_id = state.engine.revision_id().await.unwrap_or(0);
    let wrap = |e| AppErrorWithRevision::new(e, revision_id);

    let (from, to) = report_range(&query, state.clock.now().date()).map_err(wrap)?;
    let rows = state
        .engine
        .attendance_report(from, to, query.employee_id)
        .await
        .map_err(wrap)?;
    let body = render_csv(&rows).map_err(wrap)?;

    let disposition = format!("attachment; filename=\"attendance-{}-{}.csv\"", from, to);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
