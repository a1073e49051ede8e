//! Holiday and calendar API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{reply, ApiResult, DateQuery};
use crate::auth::Actor;
use crate::engine::calendar::DayOffInfo;
use crate::models::{CreateHolidayRequest, Holiday};
use crate::AppState;

/// GET /api/holidays - List holidays by date.
pub async fn list_holidays(State(state): State<AppState>) -> ApiResult<Vec<Holiday>> {
    let result = state.engine.list_holidays().await;
    reply(&state.engine, result).await
}

/// POST /api/holidays - Create a holiday (admin).
pub async fn create_holiday(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateHolidayRequest>,
) -> ApiResult<Holiday> {
    let result = state.engine.add_holiday(actor, &request).await;
    reply(&state.engine, result).await
}

/// DELETE /api/holidays/{id} - Delete a holiday (admin).
pub async fn delete_holiday(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let result = state.engine.delete_holiday(actor, id).await;
    reply(&state.engine, result).await
}

/// GET /api/calendar/day-off - Whether a date is a rest day or holiday.
pub async fn day_off(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<DayOffInfo> {
    let date = query.date.unwrap_or_else(|| state.clock.now().date());
    let result = state.engine.is_day_off(date).await;
    reply(&state.engine, result).await
}
