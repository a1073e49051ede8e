//! In-memory record store.
//!
//! Mirrors the SQLite store's constraints (unique usernames, unique holiday
//! dates, one attendance record per employee and day, versioned updates) so
//! engine behaviour does not depend on the backend.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, ChangeLog, CreateHolidayRequest, Employee, Holiday, NewAttendance,
    NewEmployee, RevisionInfo,
};

#[derive(Default)]
struct Collections {
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    holidays: Vec<Holiday>,
    change_logs: Vec<ChangeLog>,
    last_employee_id: i64,
    last_attendance_id: i64,
    last_holiday_id: i64,
    revision_id: i64,
    generated_at: String,
}

impl Collections {
    fn bump_revision(&mut self, now: &str) {
        self.revision_id += 1;
        self.generated_at = now.to_string();
    }

    fn versioned_attendance_index(&self, record: &AttendanceRecord) -> Result<usize, AppError> {
        let index = self
            .attendance
            .iter()
            .position(|r| r.id == record.id)
            .ok_or_else(|| AppError::NotFound(format!("Attendance {} not found", record.id)))?;

        let current = &self.attendance[index];
        if current.version != record.version {
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.version,
            });
        }
        Ok(index)
    }
}

/// Record store kept entirely in process memory.
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections {
                generated_at: Utc::now().to_rfc3339(),
                ..Collections::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        let inner = self.inner.read().await;
        Ok(RevisionInfo {
            revision_id: inner.revision_id,
            generated_at: inner.generated_at.clone(),
        })
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.inner.read().await.employees.clone())
    }

    async fn insert_employee(&self, employee: &NewEmployee) -> Result<Employee, AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .employees
            .iter()
            .any(|e| e.username == employee.username)
        {
            return Err(AppError::DuplicateKey(format!(
                "Username {} already exists",
                employee.username
            )));
        }

        let now = Utc::now().to_rfc3339();
        inner.last_employee_id += 1;
        let created = Employee {
            id: inner.last_employee_id,
            name: employee.name.clone(),
            username: employee.username.clone(),
            role: employee.role,
            position: employee.position.clone(),
            password_hash: employee.password_hash.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        inner.employees.push(created.clone());
        inner.bump_revision(&now);
        Ok(created)
    }

    async fn update_employee(&self, employee: &Employee) -> Result<Employee, AppError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now().to_rfc3339();

        let existing = inner
            .employees
            .iter_mut()
            .find(|e| e.id == employee.id)
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee.id)))?;

        // Username is immutable, like the SQLite UPDATE
        *existing = Employee {
            username: existing.username.clone(),
            created_at: existing.created_at.clone(),
            updated_at: now.clone(),
            ..employee.clone()
        };
        let updated = existing.clone();
        inner.bump_revision(&now);
        Ok(updated)
    }

    async fn delete_employee(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.employees.len();
        inner.employees.retain(|e| e.id != id);
        if inner.employees.len() == before {
            return Err(AppError::NotFound(format!("Employee {} not found", id)));
        }
        inner.bump_revision(&Utc::now().to_rfc3339());
        Ok(())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self.inner.read().await.attendance.clone())
    }

    async fn insert_attendance(
        &self,
        record: &NewAttendance,
    ) -> Result<AttendanceRecord, AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(AppError::DuplicateKey(format!(
                "Attendance for employee {} on {} already exists",
                record.employee_id, record.date
            )));
        }

        let now = Utc::now().to_rfc3339();
        inner.last_attendance_id += 1;
        let created = AttendanceRecord {
            id: inner.last_attendance_id,
            employee_id: record.employee_id,
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            status: record.status,
            note: record.note.clone(),
            late_minutes: record.late_minutes,
            created_at: now.clone(),
            updated_at: now.clone(),
            version: 1,
        };
        inner.attendance.push(created.clone());
        inner.bump_revision(&now);
        Ok(created)
    }

    async fn update_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, AppError> {
        let mut inner = self.inner.write().await;
        let index = inner.versioned_attendance_index(record)?;

        let now = Utc::now().to_rfc3339();
        let current = &inner.attendance[index];
        let stored = AttendanceRecord {
            id: current.id,
            employee_id: current.employee_id,
            date: current.date,
            created_at: current.created_at.clone(),
            updated_at: now.clone(),
            version: current.version + 1,
            ..record.clone()
        };
        inner.attendance[index] = stored.clone();
        inner.bump_revision(&now);
        Ok(stored)
    }

    async fn correct_attendance(
        &self,
        previous: &AttendanceRecord,
        updated: &AttendanceRecord,
        admin_id: i64,
        reason: Option<&str>,
    ) -> Result<ChangeLog, AppError> {
        let mut inner = self.inner.write().await;
        let index = inner.versioned_attendance_index(previous)?;

        let now = Utc::now().to_rfc3339();
        let stored = AttendanceRecord {
            id: previous.id,
            employee_id: previous.employee_id,
            date: previous.date,
            created_at: previous.created_at.clone(),
            updated_at: now.clone(),
            version: previous.version + 1,
            ..updated.clone()
        };
        let log = ChangeLog {
            id: uuid::Uuid::new_v4().to_string(),
            attendance_id: previous.id,
            admin_id,
            old_data: inner.attendance[index].clone(),
            new_data: stored.clone(),
            reason: reason.map(str::to_string),
            changed_at: now.clone(),
        };

        inner.attendance[index] = stored;
        inner.change_logs.push(log.clone());
        inner.bump_revision(&now);
        Ok(log)
    }

    async fn list_holidays(&self) -> Result<Vec<Holiday>, AppError> {
        Ok(self.inner.read().await.holidays.clone())
    }

    async fn insert_holiday(&self, holiday: &CreateHolidayRequest) -> Result<Holiday, AppError> {
        let mut inner = self.inner.write().await;
        if inner.holidays.iter().any(|h| h.date == holiday.date) {
            return Err(AppError::DuplicateKey(format!(
                "Holiday on {} already exists",
                holiday.date
            )));
        }

        let now = Utc::now().to_rfc3339();
        inner.last_holiday_id += 1;
        let created = Holiday {
            id: inner.last_holiday_id,
            date: holiday.date,
            description: holiday.description.clone(),
            kind: holiday.kind,
            created_at: now.clone(),
        };
        inner.holidays.push(created.clone());
        inner.bump_revision(&now);
        Ok(created)
    }

    async fn delete_holiday(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.holidays.len();
        inner.holidays.retain(|h| h.id != id);
        if inner.holidays.len() == before {
            return Err(AppError::NotFound(format!("Holiday {} not found", id)));
        }
        inner.bump_revision(&Utc::now().to_rfc3339());
        Ok(())
    }

    async fn list_change_logs(&self) -> Result<Vec<ChangeLog>, AppError> {
        Ok(self.inner.read().await.change_logs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HolidayKind, RawStatus, Role};
    use chrono::NaiveDate;

    fn absent_on(employee_id: i64, day: u32) -> NewAttendance {
        NewAttendance {
            employee_id,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            check_in: None,
            check_out: None,
            status: RawStatus::Absent,
            note: String::new(),
            late_minutes: 0,
        }
    }

    #[tokio::test]
    async fn test_ids_are_monotonic_after_deletes() {
        let store = MemoryStore::new();
        let new = NewEmployee {
            name: "A".to_string(),
            username: "a".to_string(),
            role: Role::Employee,
            position: None,
            password_hash: String::new(),
        };
        let first = store.insert_employee(&new).await.unwrap();
        store.delete_employee(first.id).await.unwrap();

        let second = store
            .insert_employee(&NewEmployee {
                username: "b".to_string(),
                ..new
            })
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_constraints_match_sqlite() {
        let store = MemoryStore::new();

        store.insert_attendance(&absent_on(1, 2)).await.unwrap();
        assert!(matches!(
            store.insert_attendance(&absent_on(1, 2)).await,
            Err(AppError::DuplicateKey(_))
        ));

        let holiday = CreateHolidayRequest {
            date: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
            description: "Ascension Day".to_string(),
            kind: HolidayKind::National,
        };
        store.insert_holiday(&holiday).await.unwrap();
        assert!(matches!(
            store.insert_holiday(&holiday).await,
            Err(AppError::DuplicateKey(_))
        ));

        assert_eq!(store.revision_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_versioned_update() {
        let store = MemoryStore::new();
        let created = store.insert_attendance(&absent_on(1, 3)).await.unwrap();

        let mut sick = created.clone();
        sick.status = RawStatus::Sick;
        let stored = store.update_attendance(&sick).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.status, RawStatus::Sick);

        assert!(matches!(
            store.update_attendance(&sick).await,
            Err(AppError::Conflict {
                current_version: 2,
                ..
            })
        ));
    }
}
