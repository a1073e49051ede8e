//! Attendance engine.
//!
//! Every operation re-reads what it needs from the [`RecordStore`]. Writes
//! are serialized through one async mutex so a check-then-insert sequence
//! cannot interleave with another inside this process; across processes the
//! store's unique keys and record versions take over.

pub mod alerts;
pub mod calendar;
mod directory;
pub mod report;
mod reporting;
pub mod scoring;
pub mod stats;
pub mod status;

pub use reporting::DailyOverview;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::RecordStore;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, AttendanceView, ChangeLog, CheckInRequest, CorrectAttendanceRequest,
    CreateAttendanceRequest, DisplayStatus, Employee, NewAttendance, RawStatus, RevisionInfo,
};
use calendar::{DayOffInfo, DayOffReason, WorkCalendar};
use status::{check_in_time, clock_time, display_status, late_minutes};

pub struct AttendanceEngine {
    store: Arc<dyn RecordStore>,
    write_lock: Mutex<()>,
}

/// An employee's attendance for the current day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayAttendance {
    pub date: NaiveDate,
    pub day_off: bool,
    pub display_status: DisplayStatus,
    pub record: Option<AttendanceRecord>,
}

/// A corrected record and the audit entry written for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub record: AttendanceView,
    pub change_log: ChangeLog,
}

pub fn view(record: AttendanceRecord) -> AttendanceView {
    AttendanceView {
        display_status: display_status(Some(&record)),
        record,
    }
}

fn day_off_error(date: NaiveDate, reason: DayOffReason) -> AppError {
    match reason {
        DayOffReason::RestDay => AppError::DayOff(format!("{} is a rest day", date)),
        DayOffReason::Holiday(description) => {
            AppError::DayOff(format!("{} is a holiday: {}", date, description))
        }
    }
}

fn required_note(status: RawStatus, note: &str) -> Result<(), AppError> {
    if status.is_leave_type() && note.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "A note is required for {} status",
            status.as_str()
        )));
    }
    Ok(())
}

impl AttendanceEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub async fn revision_id(&self) -> Result<i64, AppError> {
        self.store.revision_id().await
    }

    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        self.store.revision_info().await
    }

    async fn calendar(&self) -> Result<WorkCalendar, AppError> {
        Ok(WorkCalendar::new(&self.store.list_holidays().await?))
    }

    async fn find_employee(&self, id: i64) -> Result<Employee, AppError> {
        self.store
            .list_employees()
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
    }

    async fn require_admin(&self, actor_id: i64) -> Result<Employee, AppError> {
        match self.find_employee(actor_id).await {
            Ok(actor) if actor.is_admin() => Ok(actor),
            Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::Forbidden(format!(
                "Employee {} is not an admin",
                actor_id
            ))),
            Err(e) => Err(e),
        }
    }

    pub async fn is_day_off(&self, date: NaiveDate) -> Result<DayOffInfo, AppError> {
        Ok(self.calendar().await?.day_off_info(date))
    }

    // ==================== CHECK-IN / CHECK-OUT ====================

    /// Opens the day for `employee_id` at `at`.
    ///
    /// A plain check-in records the clock time and its lateness. A leave-type
    /// status (sick, permission, leave) records no time but needs a note.
    pub async fn check_in(
        &self,
        employee_id: i64,
        at: NaiveDateTime,
        request: &CheckInRequest,
    ) -> Result<AttendanceView, AppError> {
        let _guard = self.write_lock.lock().await;

        self.find_employee(employee_id).await?;

        let date = at.date();
        if let Some(reason) = self.calendar().await?.day_off_reason(date) {
            return Err(day_off_error(date, reason));
        }

        let records = self.store.list_attendance().await?;
        if records
            .iter()
            .any(|r| r.employee_id == employee_id && r.date == date)
        {
            return Err(AppError::AlreadyCheckedIn(format!(
                "Employee {} already has attendance for {}",
                employee_id, date
            )));
        }

        let status = request.status.unwrap_or(RawStatus::Present);
        let note = request.note.as_deref().unwrap_or_default().trim().to_string();
        let (check_in, lateness) = match status {
            RawStatus::Present => {
                let time = check_in_time(at);
                (Some(time), late_minutes(time))
            }
            RawStatus::Absent => {
                return Err(AppError::Validation(
                    "Cannot check in with absent status".to_string(),
                ))
            }
            leave => {
                required_note(leave, &note)?;
                (None, 0)
            }
        };

        let record = self
            .store
            .insert_attendance(&NewAttendance {
                employee_id,
                date,
                check_in,
                check_out: None,
                status,
                note,
                late_minutes: lateness,
            })
            .await?;

        tracing::info!(
            employee_id,
            %date,
            status = record.status.as_str(),
            late_minutes = record.late_minutes,
            "Checked in"
        );
        Ok(view(record))
    }

    /// Closes the day. Only the check-out time changes; lateness stays.
    pub async fn check_out(
        &self,
        employee_id: i64,
        at: NaiveDateTime,
    ) -> Result<AttendanceView, AppError> {
        let _guard = self.write_lock.lock().await;

        let date = at.date();
        if let Some(reason) = self.calendar().await?.day_off_reason(date) {
            return Err(day_off_error(date, reason));
        }

        let record = self
            .store
            .list_attendance()
            .await?
            .into_iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .filter(|r| r.check_in.is_some())
            .ok_or_else(|| {
                AppError::NotCheckedIn(format!(
                    "Employee {} has not checked in on {}",
                    employee_id, date
                ))
            })?;

        if record.check_out.is_some() {
            return Err(AppError::AlreadyCheckedOut(format!(
                "Employee {} already checked out on {}",
                employee_id, date
            )));
        }

        let updated = self
            .store
            .update_attendance(&AttendanceRecord {
                check_out: Some(clock_time(at.time())),
                ..record
            })
            .await?;

        tracing::info!(employee_id, %date, "Checked out");
        Ok(view(updated))
    }

    // ==================== ADMIN WRITES ====================

    /// Records a day by hand, including past days and days off.
    pub async fn add_attendance(
        &self,
        admin_id: i64,
        request: &CreateAttendanceRequest,
    ) -> Result<AttendanceView, AppError> {
        let _guard = self.write_lock.lock().await;

        self.require_admin(admin_id).await?;
        self.find_employee(request.employee_id).await?;

        if request.status == RawStatus::Present && request.check_in.is_none() {
            return Err(AppError::Validation(
                "Check-in time is required for present status".to_string(),
            ));
        }
        required_note(request.status, &request.note)?;

        let records = self.store.list_attendance().await?;
        if records
            .iter()
            .any(|r| r.employee_id == request.employee_id && r.date == request.date)
        {
            return Err(AppError::DuplicateKey(format!(
                "Employee {} already has attendance for {}",
                request.employee_id, request.date
            )));
        }

        let check_in = request.check_in.map(clock_time);
        let record = self
            .store
            .insert_attendance(&NewAttendance {
                employee_id: request.employee_id,
                date: request.date,
                check_in,
                check_out: request.check_out.map(clock_time),
                status: request.status,
                note: request.note.trim().to_string(),
                late_minutes: check_in.map(late_minutes).unwrap_or(0),
            })
            .await?;

        tracing::info!(
            admin_id,
            attendance_id = record.id,
            employee_id = record.employee_id,
            "Attendance added manually"
        );
        Ok(view(record))
    }

    /// Overwrites the given fields and appends one change log entry.
    ///
    /// Lateness is recomputed whenever the check-in time changes.
    pub async fn correct_attendance(
        &self,
        admin_id: i64,
        attendance_id: i64,
        request: &CorrectAttendanceRequest,
    ) -> Result<Correction, AppError> {
        let _guard = self.write_lock.lock().await;

        self.require_admin(admin_id).await?;

        let existing = self
            .store
            .list_attendance()
            .await?
            .into_iter()
            .find(|r| r.id == attendance_id)
            .ok_or_else(|| AppError::NotFound(format!("Attendance {} not found", attendance_id)))?;

        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(AppError::Conflict {
                    message: format!(
                        "Version mismatch: expected {}, current {}",
                        expected, existing.version
                    ),
                    current_version: existing.version,
                });
            }
        }

        let mut updated = existing.clone();
        if let Some(check_in) = request.check_in {
            updated.check_in = check_in.map(clock_time);
        }
        if let Some(check_out) = request.check_out {
            updated.check_out = check_out.map(clock_time);
        }
        if let Some(status) = request.status {
            updated.status = status;
        }
        if let Some(note) = &request.note {
            updated.note = note.trim().to_string();
        }

        if updated.status == RawStatus::Present && updated.check_in.is_none() {
            return Err(AppError::Validation(
                "Check-in time is required for present status".to_string(),
            ));
        }
        required_note(updated.status, &updated.note)?;
        if updated.check_in != existing.check_in {
            updated.late_minutes = updated.check_in.map(late_minutes).unwrap_or(0);
        }

        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let change_log = self
            .store
            .correct_attendance(&existing, &updated, admin_id, reason)
            .await?;

        tracing::info!(
            admin_id,
            attendance_id,
            change_log_id = %change_log.id,
            "Attendance corrected"
        );
        Ok(Correction {
            record: view(change_log.new_data.clone()),
            change_log,
        })
    }

    // ==================== READS ====================

    pub async fn today_attendance(
        &self,
        employee_id: i64,
        today: NaiveDate,
    ) -> Result<TodayAttendance, AppError> {
        self.find_employee(employee_id).await?;
        let day_off = self.calendar().await?.is_day_off(today);

        let record = self
            .store
            .list_attendance()
            .await?
            .into_iter()
            .find(|r| r.employee_id == employee_id && r.date == today);

        Ok(TodayAttendance {
            date: today,
            day_off,
            display_status: display_status(record.as_ref()),
            record,
        })
    }

    /// Records of one employee in the optional date range, newest first.
    ///
    /// Works for deleted employees too; their records are kept.
    pub async fn attendance_history(
        &self,
        employee_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceView>, AppError> {
        let mut records: Vec<AttendanceRecord> = self
            .store
            .list_attendance()
            .await?
            .into_iter()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| from.map_or(true, |from| r.date >= from))
            .filter(|r| to.map_or(true, |to| r.date <= to))
            .collect();

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records.into_iter().map(view).collect())
    }

    /// Audit entries, newest first.
    pub async fn change_logs(&self, attendance_id: Option<i64>) -> Result<Vec<ChangeLog>, AppError> {
        Ok(self
            .store
            .list_change_logs()
            .await?
            .into_iter()
            .rev()
            .filter(|log| attendance_id.map_or(true, |id| log.attendance_id == id))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewEmployee, Role};

    pub struct TestEngine {
        pub engine: AttendanceEngine,
        pub admin_id: i64,
        pub staff: Vec<i64>,
    }

    /// An engine on a memory store holding one admin and three employees.
    pub async fn test_engine() -> TestEngine {
        let engine = AttendanceEngine::new(Arc::new(MemoryStore::new()));

        let insert = |name: &str, role: Role| NewEmployee {
            name: name.to_string(),
            username: name.to_lowercase(),
            role,
            position: Some("Staff".to_string()),
            password_hash: String::new(),
        };
        let admin = insert("Admin", Role::Admin);
        let staff = ["Ani", "Budi", "Citra"].map(|n| insert(n, Role::Employee));

        let admin_id = engine.store().insert_employee(&admin).await.unwrap().id;
        let mut staff_ids = Vec::new();
        for employee in &staff {
            staff_ids.push(engine.store().insert_employee(employee).await.unwrap().id);
        }

        TestEngine {
            engine,
            admin_id,
            staff: staff_ids,
        }
    }

    pub fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }
}
