//! Holiday model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of non-working day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayKind {
    National,
    CollectiveLeave,
    Other,
}

impl HolidayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayKind::National => "national",
            HolidayKind::CollectiveLeave => "collective-leave",
            HolidayKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "national" => Some(HolidayKind::National),
            "collective-leave" => Some(HolidayKind::CollectiveLeave),
            "other" => Some(HolidayKind::Other),
            _ => None,
        }
    }
}

/// A dated day off on which nobody checks in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub kind: HolidayKind,
    pub created_at: String,
}

/// Request body for creating a holiday.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayRequest {
    pub date: NaiveDate,
    pub description: String,
    #[serde(default = "default_kind")]
    pub kind: HolidayKind,
}

fn default_kind() -> HolidayKind {
    HolidayKind::National
}
