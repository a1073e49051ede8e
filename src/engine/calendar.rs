//! Working-day calendar: the weekly rest day plus dated holidays.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::Holiday;

/// The weekly rest day.
pub const REST_DAY: Weekday = Weekday::Sun;

/// Why a date is not a working day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOffReason {
    RestDay,
    Holiday(String),
}

/// Answer to "can anyone check in on this date?".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOffInfo {
    pub date: NaiveDate,
    pub day_off: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub struct WorkCalendar {
    holidays: HashMap<NaiveDate, String>,
}

impl WorkCalendar {
    pub fn new(holidays: &[Holiday]) -> Self {
        Self {
            holidays: holidays
                .iter()
                .map(|h| (h.date, h.description.clone()))
                .collect(),
        }
    }

    /// Holidays win over the rest day so the description is not lost.
    pub fn day_off_reason(&self, date: NaiveDate) -> Option<DayOffReason> {
        if let Some(description) = self.holidays.get(&date) {
            return Some(DayOffReason::Holiday(description.clone()));
        }
        (date.weekday() == REST_DAY).then_some(DayOffReason::RestDay)
    }

    pub fn is_day_off(&self, date: NaiveDate) -> bool {
        date.weekday() == REST_DAY || self.holidays.contains_key(&date)
    }

    pub fn day_off_info(&self, date: NaiveDate) -> DayOffInfo {
        let reason = self.day_off_reason(date);
        DayOffInfo {
            date,
            day_off: reason.is_some(),
            reason: reason.map(|r| match r {
                DayOffReason::RestDay => "rest-day".to_string(),
                DayOffReason::Holiday(description) => description,
            }),
        }
    }

    /// Working days in `from..=to`, in order.
    pub fn working_dates(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| !self.is_day_off(*d))
            .collect()
    }

    pub fn working_days(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        self.working_dates(from, to).len() as u32
    }
}

/// First and last day of a month, `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}
