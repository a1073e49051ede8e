//! Read-only aggregates over the whole workforce.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::alerts::{self, Alert};
use super::calendar::DayOffInfo;
use super::report::{build_report, ReportRow};
use super::scoring::{rank, RankedEmployee};
use super::stats::{self, MonthlyStats, StatusCounts};
use super::status::display_status;
use super::AttendanceEngine;
use crate::errors::AppError;
use crate::models::{AttendanceRecord, DisplayStatus, Employee, Role};

/// One employee's line in the daily overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRow {
    pub employee_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub display_status: DisplayStatus,
    pub record: Option<AttendanceRecord>,
}

/// Every non-admin employee's status on one date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOverview {
    pub date: NaiveDate,
    pub day_off: DayOffInfo,
    pub summary: StatusCounts,
    pub rows: Vec<OverviewRow>,
}

fn staff(employees: Vec<Employee>) -> Vec<Employee> {
    employees
        .into_iter()
        .filter(|e| e.role == Role::Employee)
        .collect()
}

impl AttendanceEngine {
    pub async fn monthly_stats(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MonthlyStats, AppError> {
        self.find_employee(employee_id).await?;
        let calendar = self.calendar().await?;
        let records = self.store.list_attendance().await?;
        stats::monthly_stats(employee_id, year, month, &records, &calendar, today)
    }

    /// Non-admin employees ordered by score for the month.
    pub async fn top_performers(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
        limit: Option<usize>,
    ) -> Result<Vec<RankedEmployee>, AppError> {
        let employees = staff(self.store.list_employees().await?);
        let calendar = self.calendar().await?;
        let records = self.store.list_attendance().await?;

        let entries = employees
            .into_iter()
            .map(|employee| {
                let stats =
                    stats::monthly_stats(employee.id, year, month, &records, &calendar, today)?;
                Ok((employee, stats))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut ranking = rank(entries);
        if let Some(limit) = limit {
            ranking.truncate(limit);
        }
        Ok(ranking)
    }

    /// Alerts for the admin dashboard at `now`, skipping the quiet ones.
    pub async fn alerts(&self, now: NaiveDateTime) -> Result<Vec<Alert>, AppError> {
        let today = now.date();
        let ranking = self
            .top_performers(today.year(), today.month(), today, None)
            .await?;

        let employees = staff(self.store.list_employees().await?);
        let calendar = self.calendar().await?;
        let records = self.store.list_attendance().await?;

        let found: Vec<Alert> = [
            alerts::missing_today(now, &employees, &records, &calendar),
            alerts::low_attendance(today, &employees, &records, &calendar),
            alerts::top_performers(&ranking),
        ]
        .into_iter()
        .flatten()
        .collect();

        tracing::debug!(count = found.len(), "Alerts evaluated");
        Ok(found)
    }

    pub async fn daily_overview(&self, date: NaiveDate) -> Result<DailyOverview, AppError> {
        let employees = staff(self.store.list_employees().await?);
        let calendar = self.calendar().await?;
        let records = self.store.list_attendance().await?;

        let mut summary = StatusCounts::default();
        let rows = employees
            .into_iter()
            .map(|employee| {
                let record = records
                    .iter()
                    .find(|r| r.employee_id == employee.id && r.date == date)
                    .cloned();
                let status = display_status(record.as_ref());
                summary.add(status);
                OverviewRow {
                    employee_id: employee.id,
                    name: employee.name,
                    position: employee.position,
                    display_status: status,
                    record,
                }
            })
            .collect();

        Ok(DailyOverview {
            date,
            day_off: calendar.day_off_info(date),
            summary,
            rows,
        })
    }

    pub async fn attendance_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        employee_id: Option<i64>,
    ) -> Result<Vec<ReportRow>, AppError> {
        if from > to {
            return Err(AppError::Validation(format!(
                "Report start {} is after its end {}",
                from, to
            )));
        }
        let employees = self.store.list_employees().await?;
        let records = self.store.list_attendance().await?;
        Ok(build_report(&records, &employees, from, to, employee_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::alerts::AlertKind;
    use crate::engine::report::DELETED_EMPLOYEE_NAME;
    use crate::engine::testing::{at, test_engine};
    use crate::errors::AppError;
    use crate::models::{CheckInRequest, DisplayStatus, RawStatus};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_daily_overview_skips_admins() {
        let t = test_engine().await;
        let (ani, budi) = (t.staff[0], t.staff[1]);
        t.engine
            .check_in(ani, at(2024, 3, 6, 7, 10), &CheckInRequest::default())
            .await
            .unwrap();
        t.engine
            .check_in(
                budi,
                at(2024, 3, 6, 6, 0),
                &CheckInRequest {
                    status: Some(RawStatus::Leave),
                    note: Some("Wedding".to_string()),
                },
            )
            .await
            .unwrap();

        let overview = t.engine.daily_overview(date(6)).await.unwrap();
        assert_eq!(overview.rows.len(), 3);
        assert!(!overview.day_off.day_off);
        assert_eq!(overview.summary.present, 1);
        assert_eq!(overview.summary.leave, 1);
        assert_eq!(overview.summary.absent, 1);
        assert_eq!(overview.rows[2].display_status, DisplayStatus::Absent);
        assert!(overview.rows.iter().all(|r| r.employee_id != t.admin_id));
    }

    #[tokio::test]
    async fn test_monthly_stats_for_unknown_employee() {
        let t = test_engine().await;
        let err = t.engine.monthly_stats(404, 2024, 3, date(6)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ranking_orders_by_score() {
        let t = test_engine().await;
        // Mon 4 to Wed 6; Ani on time, Budi late once, Citra only Wednesday
        for day in [4, 5, 6] {
            t.engine
                .check_in(t.staff[0], at(2024, 3, day, 7, 0), &CheckInRequest::default())
                .await
                .unwrap();
            let minute = if day == 5 { 45 } else { 0 };
            t.engine
                .check_in(t.staff[1], at(2024, 3, day, 7, minute), &CheckInRequest::default())
                .await
                .unwrap();
        }
        t.engine
            .check_in(t.staff[2], at(2024, 3, 6, 7, 0), &CheckInRequest::default())
            .await
            .unwrap();

        // Scored on March 4: everyone carries two unrecorded days (Mar 1-2)
        let ranking = t.engine.top_performers(2024, 3, date(4), None).await.unwrap();
        let order: Vec<i64> = ranking.iter().map(|r| r.employee_id).collect();
        // Ani and Citra tie and keep their listing order
        assert_eq!(order, vec![t.staff[0], t.staff[2], t.staff[1]]);
        assert_eq!(ranking[1].score, ranking[0].score);
        assert_eq!(ranking[2].score, ranking[0].score - 5);

        let top = t.engine.top_performers(2024, 3, date(4), Some(1)).await.unwrap();
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn test_alerts_after_morning_threshold() {
        let t = test_engine().await;
        t.engine
            .check_in(t.staff[0], at(2024, 3, 6, 7, 0), &CheckInRequest::default())
            .await
            .unwrap();

        let alerts = t.engine.alerts(at(2024, 3, 6, 9, 0)).await.unwrap();
        let missing = alerts
            .iter()
            .find(|a| a.kind == AlertKind::MissingToday)
            .unwrap();
        assert_eq!(missing.employees.len(), 2);
        assert!(alerts.iter().any(|a| a.kind == AlertKind::LowAttendance));
        assert!(alerts.iter().any(|a| a.kind == AlertKind::TopPerformers));

        let early = t.engine.alerts(at(2024, 3, 6, 7, 59)).await.unwrap();
        assert!(early.iter().all(|a| a.kind != AlertKind::MissingToday));
    }

    #[tokio::test]
    async fn test_report_keeps_deleted_employees() {
        let t = test_engine().await;
        let citra = t.staff[2];
        t.engine
            .check_in(citra, at(2024, 3, 6, 7, 0), &CheckInRequest::default())
            .await
            .unwrap();
        t.engine.delete_employee(t.admin_id, citra).await.unwrap();

        let rows = t
            .engine
            .attendance_report(date(1), date(31), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_name, DELETED_EMPLOYEE_NAME);

        let history = t.engine.attendance_history(citra, None, None).await.unwrap();
        assert_eq!(history.len(), 1);

        let err = t
            .engine
            .attendance_report(date(10), date(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
