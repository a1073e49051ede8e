//! Monthly attendance statistics.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{month_bounds, WorkCalendar};
use super::status::display_status;
use crate::errors::AppError;
use crate::models::{AttendanceRecord, DisplayStatus};

/// Number of records per display status.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub present: u32,
    pub late: u32,
    pub sick: u32,
    pub permission: u32,
    pub leave: u32,
    pub absent: u32,
}

impl StatusCounts {
    pub fn add(&mut self, status: DisplayStatus) {
        match status {
            DisplayStatus::Present => self.present += 1,
            DisplayStatus::Late => self.late += 1,
            DisplayStatus::Sick => self.sick += 1,
            DisplayStatus::Permission => self.permission += 1,
            DisplayStatus::Leave => self.leave += 1,
            DisplayStatus::Absent => self.absent += 1,
        }
    }

    /// Sick, permission and leave days combined.
    pub fn excused(&self) -> u32 {
        self.sick + self.permission + self.leave
    }
}

/// One employee's month at a glance.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub employee_id: i64,
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub counts: StatusCounts,
    /// Past working days with no record at all.
    pub unrecorded_days: u32,
    pub total_working_days: u32,
    pub attendance_rate: u32,
}

impl MonthlyStats {
    /// Absent records plus past working days nobody recorded.
    pub fn absent_days(&self) -> u32 {
        self.counts.absent + self.unrecorded_days
    }
}

/// Rounded percentage of working days attended on time.
pub fn attendance_rate(present: u32, total_working_days: u32) -> u32 {
    if total_working_days == 0 {
        return 0;
    }
    (100.0 * f64::from(present) / f64::from(total_working_days)).round() as u32
}

/// Statistics over all of `records` belonging to `employee_id` in the month.
///
/// `today` only decides which working days without a record are already
/// over; the record counts themselves do not depend on it.
pub fn monthly_stats(
    employee_id: i64,
    year: i32,
    month: u32,
    records: &[AttendanceRecord],
    calendar: &WorkCalendar,
    today: NaiveDate,
) -> Result<MonthlyStats, AppError> {
    let (first, last) = month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;

    let mut counts = StatusCounts::default();
    let mut recorded = HashSet::new();
    for record in records
        .iter()
        .filter(|r| r.employee_id == employee_id && r.date >= first && r.date <= last)
    {
        counts.add(display_status(Some(record)));
        recorded.insert(record.date);
    }

    let working = calendar.working_dates(first, last);
    let unrecorded_days = working
        .iter()
        .filter(|d| **d < today && !recorded.contains(*d))
        .count() as u32;
    let total_working_days = working.len() as u32;

    Ok(MonthlyStats {
        employee_id,
        year,
        month,
        attendance_rate: attendance_rate(counts.present, total_working_days),
        counts,
        unrecorded_days,
        total_working_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::status::late_minutes;
    use crate::models::{Holiday, HolidayKind, RawStatus};
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn record(
        employee_id: i64,
        day: u32,
        status: RawStatus,
        check_in: Option<(u32, u32)>,
    ) -> AttendanceRecord {
        let check_in = check_in.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0));
        AttendanceRecord {
            id: i64::from(day),
            employee_id,
            date: date(day),
            check_in,
            check_out: None,
            status,
            note: String::new(),
            late_minutes: check_in.map(late_minutes).unwrap_or(0),
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    fn holiday(day: u32) -> Holiday {
        Holiday {
            id: i64::from(day),
            date: date(day),
            description: "Holiday".to_string(),
            kind: HolidayKind::National,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_rate_guards_division_by_zero() {
        assert_eq!(attendance_rate(0, 0), 0);
        assert_eq!(attendance_rate(5, 0), 0);
        assert_eq!(attendance_rate(20, 22), 91);
        assert_eq!(attendance_rate(1, 2), 50);
    }

    #[test]
    fn test_twenty_present_of_twenty_two_working_days() {
        // June 2024: 25 working days, minus three holidays
        let calendar = WorkCalendar::new(&[holiday(17), holiday(18), holiday(19)]);
        let working = calendar.working_dates(date(1), date(30));
        assert_eq!(working.len(), 22);

        let records: Vec<_> = working
            .iter()
            .take(20)
            .map(|d| record(1, chrono::Datelike::day(d), RawStatus::Present, Some((7, 10))))
            .collect();

        let stats = monthly_stats(1, 2024, 6, &records, &calendar, date(30)).unwrap();
        assert_eq!(stats.counts.present, 20);
        assert_eq!(stats.total_working_days, 22);
        assert_eq!(stats.attendance_rate, 91);
        // The last two working days are 28 and 29, both before the 30th
        assert_eq!(stats.unrecorded_days, 2);
        assert_eq!(stats.absent_days(), 2);
    }

    #[test]
    fn test_counts_partition_by_display_status() {
        let calendar = WorkCalendar::new(&[]);
        let records = vec![
            record(1, 3, RawStatus::Present, Some((7, 0))),
            record(1, 4, RawStatus::Present, Some((7, 50))),
            record(1, 5, RawStatus::Sick, None),
            record(1, 6, RawStatus::Permission, None),
            record(1, 7, RawStatus::Leave, None),
            record(1, 8, RawStatus::Absent, None),
            // Other employee and other month are ignored
            record(2, 10, RawStatus::Present, Some((7, 0))),
            AttendanceRecord {
                date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                ..record(1, 1, RawStatus::Present, Some((7, 0)))
            },
        ];

        let stats = monthly_stats(1, 2024, 6, &records, &calendar, date(3)).unwrap();
        assert_eq!(
            stats.counts,
            StatusCounts {
                present: 1,
                late: 1,
                sick: 1,
                permission: 1,
                leave: 1,
                absent: 1,
            }
        );
        assert_eq!(stats.counts.excused(), 3);
        // Only June 1 (Saturday) is a past working day without a record
        assert_eq!(stats.unrecorded_days, 1);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let calendar = WorkCalendar::new(&[]);
        let err = monthly_stats(1, 2024, 13, &[], &calendar, date(1)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_stats_are_idempotent() {
        let calendar = WorkCalendar::new(&[holiday(17)]);
        let records = vec![record(1, 3, RawStatus::Present, Some((7, 40)))];
        let first = monthly_stats(1, 2024, 6, &records, &calendar, date(20)).unwrap();
        let second = monthly_stats(1, 2024, 6, &records, &calendar, date(20)).unwrap();
        assert_eq!(first, second);
    }
}
