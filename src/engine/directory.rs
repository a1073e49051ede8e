//! Employee accounts and the holiday calendar.

use super::AttendanceEngine;
use crate::auth::{hash_password, verify_password};
use crate::errors::AppError;
use crate::models::{
    CreateEmployeeRequest, CreateHolidayRequest, Employee, Holiday, NewEmployee,
};

pub const MIN_PASSWORD_LEN: usize = 4;

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl AttendanceEngine {
    // ==================== EMPLOYEES ====================

    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        self.store.list_employees().await
    }

    pub async fn get_employee(&self, id: i64) -> Result<Employee, AppError> {
        self.find_employee(id).await
    }

    pub async fn add_employee(
        &self,
        admin_id: i64,
        request: &CreateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_admin(admin_id).await?;

        let name = request.name.trim();
        let username = request.username.trim();
        if name.is_empty() || username.is_empty() {
            return Err(AppError::Validation(
                "Name and username are required".to_string(),
            ));
        }
        check_password(&request.password)?;

        let taken = self
            .store
            .list_employees()
            .await?
            .iter()
            .any(|e| e.username == username);
        if taken {
            return Err(AppError::DuplicateKey(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let employee = self
            .store
            .insert_employee(&NewEmployee {
                name: name.to_string(),
                username: username.to_string(),
                role: request.role,
                position: request
                    .position
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
                password_hash: hash_password(&request.password)?,
            })
            .await?;

        tracing::info!(
            admin_id,
            employee_id = employee.id,
            role = employee.role.as_str(),
            "Employee added"
        );
        Ok(employee)
    }

    /// Removes the account. Attendance and change logs stay.
    pub async fn delete_employee(&self, admin_id: i64, id: i64) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_admin(admin_id).await?;

        if id == admin_id {
            return Err(AppError::Validation(
                "Admins cannot delete their own account".to_string(),
            ));
        }
        self.find_employee(id).await?;
        self.store.delete_employee(id).await?;

        tracing::info!(admin_id, employee_id = id, "Employee deleted");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        admin_id: i64,
        id: i64,
        new_password: &str,
    ) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_admin(admin_id).await?;
        check_password(new_password)?;

        let mut employee = self.find_employee(id).await?;
        employee.password_hash = hash_password(new_password)?;
        self.store.update_employee(&employee).await?;

        tracing::info!(admin_id, employee_id = id, "Password reset");
        Ok(())
    }

    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Employee, AppError> {
        let employee = self
            .store
            .list_employees()
            .await?
            .into_iter()
            .find(|e| e.username == username.trim());

        match employee {
            Some(employee) if verify_password(password, &employee.password_hash) => {
                tracing::debug!(employee_id = employee.id, "Login succeeded");
                Ok(employee)
            }
            _ => {
                tracing::warn!(username, "Login failed");
                Err(AppError::Unauthorized(
                    "Invalid username or password".to_string(),
                ))
            }
        }
    }

    // ==================== HOLIDAYS ====================

    pub async fn list_holidays(&self) -> Result<Vec<Holiday>, AppError> {
        let mut holidays = self.store.list_holidays().await?;
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    pub async fn add_holiday(
        &self,
        admin_id: i64,
        request: &CreateHolidayRequest,
    ) -> Result<Holiday, AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_admin(admin_id).await?;

        let description = request.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "Holiday description is required".to_string(),
            ));
        }

        let holidays = self.store.list_holidays().await?;
        if holidays.iter().any(|h| h.date == request.date) {
            return Err(AppError::DuplicateKey(format!(
                "A holiday already exists on {}",
                request.date
            )));
        }

        let holiday = self
            .store
            .insert_holiday(&CreateHolidayRequest {
                description: description.to_string(),
                ..request.clone()
            })
            .await?;

        tracing::info!(admin_id, date = %holiday.date, kind = holiday.kind.as_str(), "Holiday added");
        Ok(holiday)
    }

    pub async fn delete_holiday(&self, admin_id: i64, id: i64) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_admin(admin_id).await?;

        if !self.store.list_holidays().await?.iter().any(|h| h.id == id) {
            return Err(AppError::NotFound(format!("Holiday {} not found", id)));
        }
        self.store.delete_holiday(id).await?;

        tracing::info!(admin_id, holiday_id = id, "Holiday deleted");
        Ok(())
    }
}
