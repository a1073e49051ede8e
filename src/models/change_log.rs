//! Audit trail entries for admin corrections.

use serde::{Deserialize, Serialize};

use super::AttendanceRecord;

/// One admin correction of an attendance record. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLog {
    pub id: String,
    pub attendance_id: i64,
    pub admin_id: i64,
    pub old_data: AttendanceRecord,
    pub new_data: AttendanceRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub changed_at: String,
}
