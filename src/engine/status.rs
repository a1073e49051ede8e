//! Display status and lateness derivation.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::models::{AttendanceRecord, DisplayStatus, RawStatus};

/// Check-ins after 07:30 local time count as late.
pub const LATE_CUTOFF_HOUR: u32 = 7;
pub const LATE_CUTOFF_MINUTE: u32 = 30;

const LATE_CUTOFF_SECONDS: i64 = (LATE_CUTOFF_HOUR * 3600 + LATE_CUTOFF_MINUTE * 60) as i64;

/// Whole minutes past the cutoff, 0 when on time.
///
/// Seconds inside the cutoff minute still count as on time, so both 07:30:00
/// and 07:30:59 give 0 while 07:45:00 gives 15.
pub fn late_minutes(check_in: NaiveTime) -> i64 {
    let seconds = i64::from(check_in.num_seconds_from_midnight());
    ((seconds - LATE_CUTOFF_SECONDS) / 60).max(0)
}

/// Time of day with sub-second precision dropped.
pub fn clock_time(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Check-in time recorded for an attendance action at `at`.
pub fn check_in_time(at: NaiveDateTime) -> NaiveTime {
    clock_time(at.time())
}

/// Status shown for one employee on one date, `None` meaning no record.
pub fn display_status(record: Option<&AttendanceRecord>) -> DisplayStatus {
    let Some(record) = record else {
        return DisplayStatus::Absent;
    };

    match record.status {
        RawStatus::Present if record.check_in.is_none() => DisplayStatus::Absent,
        RawStatus::Present if record.late_minutes > 0 => DisplayStatus::Late,
        RawStatus::Present => DisplayStatus::Present,
        RawStatus::Sick => DisplayStatus::Sick,
        RawStatus::Permission => DisplayStatus::Permission,
        RawStatus::Leave => DisplayStatus::Leave,
        RawStatus::Absent => DisplayStatus::Absent,
    }
}
