//! SQLite record store.
//!
//! Uses prepared statements and transactions for data integrity.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::RecordStore;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, ChangeLog, CreateHolidayRequest, Employee, Holiday, HolidayKind,
    NewAttendance, NewEmployee, RawStatus, RevisionInfo, Role,
};

const EMPLOYEE_COLUMNS: &str =
    "id, name, username, role, position, password_hash, created_at, updated_at";

const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, check_in, check_out, status, note, \
     late_minutes, created_at, updated_at, version";

/// Record store backed by an SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Increment the revision ID.
    async fn increment_revision(&self) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_attendance(&self, id: i64) -> Result<Option<AttendanceRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM attendance WHERE id = ?",
            ATTENDANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(attendance_from_row).transpose()
    }

    /// Explains why a versioned attendance UPDATE touched no row.
    async fn missed_attendance_update(&self, id: i64) -> Result<AppError, AppError> {
        Ok(match self.get_attendance(id).await? {
            Some(current) => AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.version,
            },
            None => AppError::NotFound(format!("Attendance {} not found", id)),
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.try_get("revision_id")?,
            generated_at: row.try_get("generated_at")?,
        })
    }

    // ==================== EMPLOYEE OPERATIONS ====================

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM employees ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(employee_from_row).collect()
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO employees (name, username, role, position, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&employee.name)
        .bind(&employee.username)
        .bind(employee.role.as_str())
        .bind(&employee.position)
        .bind(&employee.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Employee {
            id: result.last_insert_rowid(),
            name: employee.name.clone(),
            username: employee.username.clone(),
            role: employee.role,
            position: employee.position.clone(),
            password_hash: employee.password_hash.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_employee(&self, employee: &Employee) -> Result<Employee, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE employees SET name = ?, role = ?, position = ?, password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&employee.name)
        .bind(employee.role.as_str())
        .bind(&employee.position)
        .bind(&employee.password_hash)
        .bind(&now)
        .bind(employee.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Employee {} not found",
                employee.id
            )));
        }

        self.increment_revision().await?;

        Ok(Employee {
            updated_at: now,
            ..employee.clone()
        })
    }

    async fn delete_employee(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Employee {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== ATTENDANCE OPERATIONS ====================

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM attendance ORDER BY id",
            ATTENDANCE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(attendance_from_row).collect()
    }

    async fn insert_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"INSERT INTO attendance (
                employee_id, date, check_in, check_out, status, note,
                late_minutes, created_at, updated_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.as_str())
        .bind(&record.note)
        .bind(record.late_minutes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(AttendanceRecord {
            id: result.last_insert_rowid(),
            employee_id: record.employee_id,
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            status: record.status,
            note: record.note.clone(),
            late_minutes: record.late_minutes,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }

    async fn update_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, AppError> {
        let now = Utc::now().to_rfc3339();
        let new_version = record.version + 1;

        let result = sqlx::query(
            r#"UPDATE attendance SET
                check_in = ?, check_out = ?, status = ?, note = ?, late_minutes = ?,
                updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.as_str())
        .bind(&record.note)
        .bind(record.late_minutes)
        .bind(&now)
        .bind(new_version)
        .bind(record.id)
        .bind(record.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_attendance_update(record.id).await?);
        }

        self.increment_revision().await?;

        Ok(AttendanceRecord {
            updated_at: now,
            version: new_version,
            ..record.clone()
        })
    }

    async fn correct_attendance(
        &self,
        previous: &AttendanceRecord,
        updated: &AttendanceRecord,
        admin_id: i64,
        reason: Option<&str>,
    ) -> Result<ChangeLog, AppError> {
        let now = Utc::now().to_rfc3339();
        let new_version = previous.version + 1;

        // Record update, log append and revision bump commit together
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE attendance SET
                check_in = ?, check_out = ?, status = ?, note = ?, late_minutes = ?,
                updated_at = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(updated.check_in)
        .bind(updated.check_out)
        .bind(updated.status.as_str())
        .bind(&updated.note)
        .bind(updated.late_minutes)
        .bind(&now)
        .bind(new_version)
        .bind(previous.id)
        .bind(previous.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.missed_attendance_update(previous.id).await?);
        }

        let stored = AttendanceRecord {
            id: previous.id,
            employee_id: previous.employee_id,
            date: previous.date,
            created_at: previous.created_at.clone(),
            updated_at: now.clone(),
            version: new_version,
            ..updated.clone()
        };

        let log = ChangeLog {
            id: uuid::Uuid::new_v4().to_string(),
            attendance_id: previous.id,
            admin_id,
            old_data: previous.clone(),
            new_data: stored,
            reason: reason.map(str::to_string),
            changed_at: now.clone(),
        };

        sqlx::query(
            "INSERT INTO change_logs (id, attendance_id, admin_id, old_data, new_data, reason, changed_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&log.id)
        .bind(log.attendance_id)
        .bind(log.admin_id)
        .bind(serde_json::to_string(&log.old_data)?)
        .bind(serde_json::to_string(&log.new_data)?)
        .bind(&log.reason)
        .bind(&log.changed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(log)
    }

    // ==================== HOLIDAY OPERATIONS ====================

    async fn list_holidays(&self) -> Result<Vec<Holiday>, AppError> {
        let rows =
            sqlx::query("SELECT id, date, description, kind, created_at FROM holidays ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(holiday_from_row).collect()
    }

    async fn insert_holiday(&self, holiday: &CreateHolidayRequest) -> Result<Holiday, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO holidays (date, description, kind, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(holiday.date)
        .bind(&holiday.description)
        .bind(holiday.kind.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Holiday {
            id: result.last_insert_rowid(),
            date: holiday.date,
            description: holiday.description.clone(),
            kind: holiday.kind,
            created_at: now,
        })
    }

    async fn delete_holiday(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Holiday {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== CHANGE LOG OPERATIONS ====================

    async fn list_change_logs(&self) -> Result<Vec<ChangeLog>, AppError> {
        let rows = sqlx::query(
            "SELECT id, attendance_id, admin_id, old_data, new_data, reason, changed_at FROM change_logs ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(change_log_from_row).collect()
    }
}

// Helper functions for row conversion

fn employee_from_row(row: &SqliteRow) -> Result<Employee, AppError> {
    let role: String = row.try_get("role")?;
    Ok(Employee {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        role: Role::from_str(&role)
            .ok_or_else(|| AppError::Database(format!("Unknown employee role {}", role)))?,
        position: row.try_get("position")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn attendance_from_row(row: &SqliteRow) -> Result<AttendanceRecord, AppError> {
    let status: String = row.try_get("status")?;
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        date: row.try_get("date")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        status: RawStatus::from_str(&status)
            .ok_or_else(|| AppError::Database(format!("Unknown attendance status {}", status)))?,
        note: row.try_get("note")?,
        late_minutes: row.try_get("late_minutes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn holiday_from_row(row: &SqliteRow) -> Result<Holiday, AppError> {
    let kind: String = row.try_get("kind")?;
    Ok(Holiday {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        description: row.try_get("description")?,
        kind: HolidayKind::from_str(&kind)
            .ok_or_else(|| AppError::Database(format!("Unknown holiday kind {}", kind)))?,
        created_at: row.try_get("created_at")?,
    })
}

fn change_log_from_row(row: &SqliteRow) -> Result<ChangeLog, AppError> {
    let old_data: String = row.try_get("old_data")?;
    let new_data: String = row.try_get("new_data")?;
    Ok(ChangeLog {
        id: row.try_get("id")?,
        attendance_id: row.try_get("attendance_id")?,
        admin_id: row.try_get("admin_id")?,
        old_data: parse_snapshot(&old_data)?,
        new_data: parse_snapshot(&new_data)?,
        reason: row.try_get("reason")?,
        changed_at: row.try_get("changed_at")?,
    })
}

fn parse_snapshot(s: &str) -> Result<AttendanceRecord, AppError> {
    serde_json::from_str(s)
        .map_err(|e| AppError::Database(format!("Corrupt change log snapshot: {}", e)))
}
