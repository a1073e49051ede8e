//! Advisory checks for the admin overview.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use super::calendar::WorkCalendar;
use super::scoring::RankedEmployee;
use super::status::display_status;
use crate::models::{AttendanceRecord, Employee};

/// Missing check-ins are only reported after 08:00.
pub const MISSING_CHECK_IN_AFTER_HOUR: u32 = 8;
pub const LOW_ATTENDANCE_WINDOW_DAYS: i64 = 7;
pub const LOW_ATTENDANCE_THRESHOLD_PERCENT: u32 = 50;
pub const TOP_PERFORMER_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    MissingToday,
    LowAttendance,
    TopPerformers,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEntry {
    pub employee_id: i64,
    pub name: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub employees: Vec<AlertEntry>,
}

/// Employees without any record today, once the morning threshold passed.
pub fn missing_today(
    now: NaiveDateTime,
    employees: &[Employee],
    records: &[AttendanceRecord],
    calendar: &WorkCalendar,
) -> Option<Alert> {
    let threshold = MISSING_CHECK_IN_AFTER_HOUR * 3600;
    if now.time().num_seconds_from_midnight() <= threshold {
        return None;
    }
    let today = now.date();
    if calendar.is_day_off(today) {
        return None;
    }

    let missing: Vec<AlertEntry> = employees
        .iter()
        .filter(|e| {
            !records
                .iter()
                .any(|r| r.employee_id == e.id && r.date == today)
        })
        .map(|e| AlertEntry {
            employee_id: e.id,
            name: e.name.clone(),
            detail: "no check-in yet".to_string(),
        })
        .collect();

    if missing.is_empty() {
        return None;
    }
    Some(Alert {
        kind: AlertKind::MissingToday,
        message: format!("{} employee(s) have not checked in today", missing.len()),
        employees: missing,
    })
}

/// Employees who attended fewer than half the working days of the last week.
pub fn low_attendance(
    today: NaiveDate,
    employees: &[Employee],
    records: &[AttendanceRecord],
    calendar: &WorkCalendar,
) -> Option<Alert> {
    let start = today - Duration::days(LOW_ATTENDANCE_WINDOW_DAYS - 1);
    let working_days = calendar.working_days(start, today);
    if working_days == 0 {
        return None;
    }

    let flagged: Vec<AlertEntry> = employees
        .iter()
        .filter_map(|e| {
            let attended = records
                .iter()
                .filter(|r| r.employee_id == e.id && r.date >= start && r.date <= today)
                .filter(|r| display_status(Some(r)).is_attended())
                .count() as u32;
            (attended * 100 < working_days * LOW_ATTENDANCE_THRESHOLD_PERCENT).then(|| {
                AlertEntry {
                    employee_id: e.id,
                    name: e.name.clone(),
                    detail: format!("attended {} of {} working days", attended, working_days),
                }
            })
        })
        .collect();

    if flagged.is_empty() {
        return None;
    }
    Some(Alert {
        kind: AlertKind::LowAttendance,
        message: format!(
            "{} employee(s) attended less than {}% of the last {} days",
            flagged.len(),
            LOW_ATTENDANCE_THRESHOLD_PERCENT,
            LOW_ATTENDANCE_WINDOW_DAYS
        ),
        employees: flagged,
    })
}

/// The head of an already ranked list.
pub fn top_performers(ranking: &[RankedEmployee]) -> Option<Alert> {
    if ranking.is_empty() {
        return None;
    }
    let employees: Vec<AlertEntry> = ranking
        .iter()
        .take(TOP_PERFORMER_COUNT)
        .map(|r| AlertEntry {
            employee_id: r.employee_id,
            name: r.name.clone(),
            detail: format!("#{} with score {}", r.rank, r.score),
        })
        .collect();

    Some(Alert {
        kind: AlertKind::TopPerformers,
        message: format!("Top {} this month", employees.len()),
        employees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::status::late_minutes;
    use crate::models::{RawStatus, Role};
    use chrono::NaiveTime;

    fn employee(id: i64) -> Employee {
        Employee {
            id,
            name: format!("Employee {}", id),
            username: format!("e{}", id),
            role: Role::Employee,
            position: None,
            password_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn present(employee_id: i64, date: NaiveDate) -> AttendanceRecord {
        let check_in = NaiveTime::from_hms_opt(7, 20, 0);
        AttendanceRecord {
            id: 0,
            employee_id,
            date,
            check_in,
            check_out: None,
            status: RawStatus::Present,
            note: String::new(),
            late_minutes: check_in.map(late_minutes).unwrap_or(0),
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    // Wednesday
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
    }

    #[test]
    fn test_missing_today_waits_for_threshold() {
        let calendar = WorkCalendar::new(&[]);
        let employees = vec![employee(1), employee(2)];
        let records = vec![present(1, wednesday())];

        let early = wednesday().and_hms_opt(8, 0, 0).unwrap();
        assert!(missing_today(early, &employees, &records, &calendar).is_none());

        let later = wednesday().and_hms_opt(8, 0, 1).unwrap();
        let alert = missing_today(later, &employees, &records, &calendar).unwrap();
        assert_eq!(alert.kind, AlertKind::MissingToday);
        assert_eq!(alert.employees.len(), 1);
        assert_eq!(alert.employees[0].employee_id, 2);
    }

    #[test]
    fn test_missing_today_is_quiet_on_sunday() {
        let calendar = WorkCalendar::new(&[]);
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(missing_today(sunday, &[employee(1)], &[], &calendar).is_none());
    }

    #[test]
    fn test_low_attendance_flags_below_half() {
        let calendar = WorkCalendar::new(&[]);
        // Window Thu 2024-02-29 to Wed 2024-03-06 has 6 working days
        let today = wednesday();
        let days: Vec<NaiveDate> = calendar.working_dates(today - Duration::days(6), today);
        assert_eq!(days.len(), 6);

        let mut records: Vec<_> = days.iter().take(3).map(|d| present(1, *d)).collect();
        records.extend(days.iter().take(2).map(|d| present(2, *d)));

        let alert = low_attendance(today, &[employee(1), employee(2)], &records, &calendar).unwrap();
        assert_eq!(alert.kind, AlertKind::LowAttendance);
        // Three of six is exactly half, so only employee 2 is flagged
        assert_eq!(alert.employees.len(), 1);
        assert_eq!(alert.employees[0].employee_id, 2);
        assert_eq!(alert.employees[0].detail, "attended 2 of 6 working days");
    }

    #[test]
    fn test_top_performers_takes_three() {
        let ranking: Vec<RankedEmployee> = (1..=5)
            .map(|i| RankedEmployee {
                rank: i as usize,
                employee_id: i,
                name: format!("Employee {}", i),
                position: None,
                score: 120 - i,
                stats: crate::engine::stats::MonthlyStats {
                    employee_id: i,
                    year: 2024,
                    month: 3,
                    counts: Default::default(),
                    unrecorded_days: 0,
                    total_working_days: 0,
                    attendance_rate: 0,
                },
            })
            .collect();

        let alert = top_performers(&ranking).unwrap();
        assert_eq!(alert.employees.len(), 3);
        assert_eq!(alert.employees[2].employee_id, 3);
        assert!(top_performers(&[]).is_none());
    }
}
