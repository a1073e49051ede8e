//! Attendance record model.
//!
//! Only the raw status is persisted. `late` exists solely as a
//! [`DisplayStatus`], derived from a `present` record with positive lateness.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Status as stored on an attendance record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawStatus {
    Present,
    Sick,
    Permission,
    Leave,
    Absent,
}

impl RawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawStatus::Present => "present",
            RawStatus::Sick => "sick",
            RawStatus::Permission => "permission",
            RawStatus::Leave => "leave",
            RawStatus::Absent => "absent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(RawStatus::Present),
            "sick" => Some(RawStatus::Sick),
            "permission" => Some(RawStatus::Permission),
            "leave" => Some(RawStatus::Leave),
            "absent" => Some(RawStatus::Absent),
            _ => None,
        }
    }

    /// Sick, permission and leave: excused absences that need a note.
    pub fn is_leave_type(&self) -> bool {
        matches!(
            self,
            RawStatus::Sick | RawStatus::Permission | RawStatus::Leave
        )
    }
}

/// Status shown to users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Present,
    Late,
    Sick,
    Permission,
    Leave,
    Absent,
}

impl DisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Present => "present",
            DisplayStatus::Late => "late",
            DisplayStatus::Sick => "sick",
            DisplayStatus::Permission => "permission",
            DisplayStatus::Leave => "leave",
            DisplayStatus::Absent => "absent",
        }
    }

    /// The employee showed up, on time or not.
    pub fn is_attended(&self) -> bool {
        matches!(self, DisplayStatus::Present | DisplayStatus::Late)
    }
}

/// One employee's attendance on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: RawStatus,
    #[serde(default)]
    pub note: String,
    pub late_minutes: i64,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Fields of an attendance record before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: i64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: RawStatus,
    pub note: String,
    pub late_minutes: i64,
}

/// A record together with its derived display status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub display_status: DisplayStatus,
}

/// Request body for a self-service check-in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    /// Omitted or `present` for a normal check-in, a leave type otherwise.
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for an admin correction. Omitted fields stay unchanged.
///
/// `checkIn` and `checkOut` distinguish an omitted field (`None`) from an
/// explicit `null` (`Some(None)`), which clears the time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAttendanceRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub check_in: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub check_out: Option<Option<NaiveTime>>,
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Only called for a present field, so `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for an admin adding a record by hand.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceRequest {
    pub employee_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub check_in: Option<NaiveTime>,
    #[serde(default)]
    pub check_out: Option<NaiveTime>,
    pub status: RawStatus,
    #[serde(default)]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_tells_null_from_omitted() {
        let request: CorrectAttendanceRequest =
            serde_json::from_str(r#"{"checkOut": null, "reason": "wrong tap"}"#).unwrap();
        assert_eq!(request.check_out, Some(None));
        assert_eq!(request.check_in, None);

        let request: CorrectAttendanceRequest =
            serde_json::from_str(r#"{"checkIn": "07:30:00"}"#).unwrap();
        assert_eq!(request.check_in, Some(NaiveTime::from_hms_opt(7, 30, 0)));
        assert_eq!(request.check_out, None);
    }
}
