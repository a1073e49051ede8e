//! Attendance report rows and their CSV rendering.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::status::display_status;
use crate::errors::AppError;
use crate::models::{AttendanceRecord, DisplayStatus, Employee};

/// Shown for records whose employee has since been deleted.
pub const DELETED_EMPLOYEE_NAME: &str = "(deleted)";

/// An attendance record joined with the employee it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub attendance_id: i64,
    pub date: NaiveDate,
    pub employee_id: i64,
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: DisplayStatus,
    pub late_minutes: i64,
    pub note: String,
}

/// Rows for records dated in `from..=to`, ordered by date then employee.
pub fn build_report(
    records: &[AttendanceRecord],
    employees: &[Employee],
    from: NaiveDate,
    to: NaiveDate,
    employee_id: Option<i64>,
) -> Vec<ReportRow> {
    let by_id: HashMap<i64, &Employee> = employees.iter().map(|e| (e.id, e)).collect();

    let mut rows: Vec<ReportRow> = records
        .iter()
        .filter(|r| r.date >= from && r.date <= to)
        .filter(|r| employee_id.map_or(true, |id| r.employee_id == id))
        .map(|r| {
            let employee = by_id.get(&r.employee_id);
            ReportRow {
                attendance_id: r.id,
                date: r.date,
                employee_id: r.employee_id,
                employee_name: employee
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| DELETED_EMPLOYEE_NAME.to_string()),
                position: employee.and_then(|e| e.position.clone()),
                check_in: r.check_in,
                check_out: r.check_out,
                status: display_status(Some(r)),
                late_minutes: r.late_minutes,
                note: r.note.clone(),
            }
        })
        .collect();

    rows.sort_by_key(|row| (row.date, row.employee_id));
    rows
}

pub fn render_csv(rows: &[ReportRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Date",
        "Employee ID",
        "Name",
        "Position",
        "Check In",
        "Check Out",
        "Status",
        "Late Minutes",
        "Note",
    ])?;

    for row in rows {
        writer.write_record([
            row.date.to_string(),
            row.employee_id.to_string(),
            row.employee_name.clone(),
            row.position.clone().unwrap_or_default(),
            row.check_in.map(|t| t.to_string()).unwrap_or_default(),
            row.check_out.map(|t| t.to_string()).unwrap_or_default(),
            row.status.as_str().to_string(),
            row.late_minutes.to_string(),
            row.note.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawStatus, Role};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn record(id: i64, employee_id: i64, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id,
            date: date(day),
            check_in: NaiveTime::from_hms_opt(7, 45, 0),
            check_out: NaiveTime::from_hms_opt(16, 0, 0),
            status: RawStatus::Present,
            note: "traffic, again".to_string(),
            late_minutes: 15,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    fn employee(id: i64, name: &str) -> Employee {
        Employee {
            id,
            name: name.to_string(),
            username: name.to_lowercase(),
            role: Role::Employee,
            position: Some("Cashier".to_string()),
            password_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_report_joins_and_orders_rows() {
        let records = vec![
            record(1, 2, 5),
            record(2, 1, 5),
            record(3, 9, 4),
            record(4, 1, 20),
        ];
        let employees = vec![employee(1, "Ani"), employee(2, "Budi")];

        let rows = build_report(&records, &employees, date(1), date(10), None);
        let keys: Vec<(u32, i64)> = rows
            .iter()
            .map(|r| (chrono::Datelike::day(&r.date), r.employee_id))
            .collect();
        assert_eq!(keys, vec![(4, 9), (5, 1), (5, 2)]);

        assert_eq!(rows[0].employee_name, DELETED_EMPLOYEE_NAME);
        assert!(rows[0].position.is_none());
        assert_eq!(rows[1].employee_name, "Ani");
        assert_eq!(rows[1].status, DisplayStatus::Late);

        let only_ani = build_report(&records, &employees, date(1), date(31), Some(1));
        assert_eq!(only_ani.len(), 2);
    }

    #[test]
    fn test_csv_quotes_fields() {
        let rows = build_report(&[record(1, 1, 5)], &[employee(1, "Ani")], date(1), date(31), None);
        let csv = render_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Employee ID,Name,Position,Check In,Check Out,Status,Late Minutes,Note"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-03-05,1,Ani,Cashier,07:45:00,16:00:00,late,15,\"traffic, again\""
        );
        assert!(lines.next().is_none());
    }
}
