//! Record store for employees, attendance, holidays and change logs.
//!
//! The engine only talks to [`RecordStore`]. SQLite is the durable backend;
//! the in-memory backend serves tests and throwaway demo runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, ChangeLog, CreateHolidayRequest, Employee, Holiday, NewAttendance,
    NewEmployee, RevisionInfo,
};

/// Collection-level access to persisted records.
///
/// Lists come back in insertion order. Every successful write bumps the
/// store-wide revision exactly once.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn revision_info(&self) -> Result<RevisionInfo, AppError>;

    async fn revision_id(&self) -> Result<i64, AppError> {
        Ok(self.revision_info().await?.revision_id)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError>;

    /// Overwrites name, role, position and password hash of an existing employee.
    async fn update_employee(&self, employee: &Employee) -> Result<Employee, AppError>;

    async fn delete_employee(&self, id: i64) -> Result<(), AppError>;

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError>;

    async fn insert_attendance(&self, record: &NewAttendance)
        -> Result<AttendanceRecord, AppError>;

    /// Writes `record` if the stored version still equals `record.version`.
    /// Returns the stored record with its bumped version.
    async fn update_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, AppError>;

    /// Applies an admin correction and appends its change log atomically.
    async fn correct_attendance(
        &self,
        previous: &AttendanceRecord,
        updated: &AttendanceRecord,
        admin_id: i64,
        reason: Option<&str>,
    ) -> Result<ChangeLog, AppError>;

    async fn list_holidays(&self) -> Result<Vec<Holiday>, AppError>;

    async fn insert_holiday(&self, holiday: &CreateHolidayRequest) -> Result<Holiday, AppError>;

    async fn delete_holiday(&self, id: i64) -> Result<(), AppError>;

    async fn list_change_logs(&self) -> Result<Vec<ChangeLog>, AppError>;
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            position TEXT,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // No foreign key on employee_id: deleting an employee keeps their history.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            check_in TEXT,
            check_out TEXT,
            status TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            late_minutes INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            UNIQUE (employee_id, date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS holidays (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            kind TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS change_logs (
            id TEXT PRIMARY KEY,
            attendance_id INTEGER NOT NULL,
            admin_id INTEGER NOT NULL,
            old_data TEXT NOT NULL,
            new_data TEXT NOT NULL,
            reason TEXT,
            changed_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
        CREATE INDEX IF NOT EXISTS idx_change_logs_attendance ON change_logs(attendance_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
