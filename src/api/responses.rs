use crate::parking::RecordId;
use crate::stats::{RangeFilter, RankedSlot, SlotCount};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub slot_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatsSuccessResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeFilter>,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub total_duration_minutes: f64,
    pub total_duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_duration_minutes: Option<f64>,
    pub average_duration: String,
    pub preferred_time_range: String,
    pub preferred_slot: String,
    pub top_slots: Vec<RankedSlot>,
    pub slot_frequency: Vec<SlotCount>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordView {
    pub id: RecordId,
    pub level: String,
    pub slot_number: String,
    pub slot_label: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub left_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_leave_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordsSuccessResponse {
    pub active: Option<RecordView>,
    pub history: Vec<RecordView>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordSuccessResponse {
    pub record: RecordView,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct NearestSlotSuccessResponse {
    pub level: String,
    pub slot_number: String,
    pub slot_label: String,
    pub distance_m: f64,
    pub low_accuracy: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoSlots,
    RecordNotFound,
    ActiveSession,
    AlreadyLeft,
    InvalidRange,
    InvalidRequest,
    InternalError,
}
