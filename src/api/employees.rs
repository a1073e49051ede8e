//! Employee API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{reply, ApiResult};
use crate::auth::Actor;
use crate::models::{CreateEmployeeRequest, Employee, LoginRequest, ResetPasswordRequest};
use crate::AppState;

/// POST /api/login - Check credentials and return the account.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Employee> {
    let result = state
        .engine
        .authenticate(&request.username, &request.password)
        .await;
    reply(&state.engine, result).await
}

/// GET /api/employees - List all employees.
pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    let result = state.engine.list_employees().await;
    reply(&state.engine, result).await
}

/// GET /api/employees/{id} - Get a single employee.
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Employee> {
    let result = state.engine.get_employee(id).await;
    reply(&state.engine, result).await
}

/// POST /api/employees - Create an employee (admin).
pub async fn create_employee(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateEmployeeRequest>,
) -> ApiResult<Employee> {
    let result = state.engine.add_employee(actor, &request).await;
    reply(&state.engine, result).await
}

/// DELETE /api/employees/{id} - Delete an employee (admin).
pub async fn delete_employee(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let result = state.engine.delete_employee(actor, id).await;
    reply(&state.engine, result).await
}

/// PUT /api/employees/{id}/password - Reset a password (admin).
pub async fn reset_password(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    let result = state
        .engine
        .reset_password(actor, id, &request.new_password)
        .await;
    reply(&state.engine, result).await
}
