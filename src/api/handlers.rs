use crate::api::responses::{
    ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse, NearestSlotSuccessResponse,
    RecordSuccessResponse, RecordView, RecordsSuccessResponse, StatsSuccessResponse,
};
use crate::error::AppError;
use crate::parking::schedule::{active_record, completed_history, elapsed_seconds, predict_leave_time};
use crate::parking::{NewParking, ParkingRecord, Position, RecordId};
use crate::state::AppState;
use crate::stats::format::{format_duration, format_elapsed};
use crate::stats::{NO_DATA, RangeFilter};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const TOP_SLOT_COUNT: usize = 3;

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub accuracy: Option<f64>,
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_health_response(&state)
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    build_stats_response(&state, &user_id, query.range.as_deref())
}

pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    build_records_response(&state, &user_id)
}

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(parking): Json<NewParking>,
) -> impl IntoResponse {
    build_create_response(&state, &user_id, parking)
}

pub async fn leave_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RecordId>,
) -> impl IntoResponse {
    build_leave_response(&state, id)
}

pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RecordId>,
) -> impl IntoResponse {
    build_delete_response(&state, id)
}

pub async fn get_nearest_slot(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearestQuery>,
) -> impl IntoResponse {
    let position = Position::from_fix(query.lat, query.lon, query.elevation, query.accuracy);
    build_nearest_response(&state, &position)
}

fn build_health_response(state: &AppState) -> ApiResponse<HealthSuccessResponse> {
    let now = state.now();
    let slots = match state.store().fetch_slots() {
        Ok(slots) => slots,
        Err(err) => return app_error(&err, now),
    };
    let status = if slots.is_empty() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };

    ApiResponse::Success {
        status: StatusCode::OK,
        body: HealthSuccessResponse {
            status,
            slot_count: slots.len(),
            timestamp: format_timestamp(now),
        },
    }
}

fn build_stats_response(
    state: &AppState,
    user_id: &str,
    range: Option<&str>,
) -> ApiResponse<StatsSuccessResponse> {
    let now = state.now();
    let range = match range.map(str::parse::<RangeFilter>).transpose() {
        Ok(range) => range,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, ErrorCode::InvalidRange, err.to_string(), now);
        }
    };

    let summary = match state.user_stats(user_id, range) {
        Ok(summary) => summary,
        Err(err) => return app_error(&err, now),
    };

    ApiResponse::Success {
        status: StatusCode::OK,
        body: StatsSuccessResponse {
            user_id: user_id.to_string(),
            range,
            total_sessions: summary.total_sessions,
            completed_sessions: summary.completed_sessions,
            total_duration_minutes: summary.total_duration_minutes,
            total_duration: format_duration(summary.total_duration_minutes),
            average_duration_minutes: summary.average_duration_minutes,
            average_duration: summary
                .average_duration_minutes
                .map(format_duration)
                .unwrap_or_else(|| NO_DATA.to_string()),
            preferred_time_range: summary.time_range_label().to_string(),
            preferred_slot: summary.slot_label().to_string(),
            top_slots: summary.top_slots(TOP_SLOT_COUNT),
            slot_frequency: summary.slot_frequency,
            timestamp: format_timestamp(now),
        },
    }
}

fn build_records_response(state: &AppState, user_id: &str) -> ApiResponse<RecordsSuccessResponse> {
    let now = state.now();
    let records = match state.user_records(user_id) {
        Ok(records) => records,
        Err(err) => return app_error(&err, now),
    };

    let active = active_record(&records).map(|record| record_view(state, record, now));
    let history = completed_history(&records)
        .into_iter()
        .map(|record| record_view(state, record, now))
        .collect();

    ApiResponse::Success {
        status: StatusCode::OK,
        body: RecordsSuccessResponse {
            active,
            history,
            timestamp: format_timestamp(now),
        },
    }
}

fn build_create_response(
    state: &AppState,
    user_id: &str,
    parking: NewParking,
) -> ApiResponse<RecordSuccessResponse> {
    let now = state.now();
    if parking.level.trim().is_empty() || parking.slot_number.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRequest,
            "level and slot_number are required".to_string(),
            now,
        );
    }

    match state.store().save_parking(user_id, parking, now) {
        Ok(record) => record_success(state, StatusCode::CREATED, &record, now),
        Err(err) => app_error(&err, now),
    }
}

fn build_leave_response(state: &AppState, id: RecordId) -> ApiResponse<RecordSuccessResponse> {
    let now = state.now();
    match state.store().update_leave_time(id, now) {
        Ok(record) => record_success(state, StatusCode::OK, &record, now),
        Err(err) => app_error(&err, now),
    }
}

fn build_delete_response(state: &AppState, id: RecordId) -> ApiResponse<RecordSuccessResponse> {
    let now = state.now();
    match state.store().delete_record(id) {
        Ok(record) => record_success(state, StatusCode::OK, &record, now),
        Err(err) => app_error(&err, now),
    }
}

fn build_nearest_response(
    state: &AppState,
    position: &Position,
) -> ApiResponse<NearestSlotSuccessResponse> {
    let now = state.now();
    if position.is_low_accuracy() {
        warn!(
            accuracy_m = ?position.accuracy_m,
            "Weak GPS fix, nearest slot may be wrong"
        );
    }

    match state.nearest_slot(position) {
        Ok(Some(nearest)) => ApiResponse::Success {
            status: StatusCode::OK,
            body: NearestSlotSuccessResponse {
                slot_label: nearest.slot.slot_label(),
                level: nearest.slot.level,
                slot_number: nearest.slot.slot_number,
                distance_m: nearest.distance_m,
                low_accuracy: position.is_low_accuracy(),
                timestamp: format_timestamp(now),
            },
        },
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::NoSlots,
            "No parking slots known".to_string(),
            now,
        ),
        Err(err) => app_error(&err, now),
    }
}

fn record_view(state: &AppState, record: &ParkingRecord, now: OffsetDateTime) -> RecordView {
    let offset = state.stats_options().utc_offset;
    RecordView {
        id: record.id,
        level: record.level.clone(),
        slot_number: record.slot_number.clone(),
        slot_label: record.slot_label(),
        created_at: record.created_at.to_offset(offset),
        left_at: record.left_at.map(|left_at| left_at.to_offset(offset)),
        duration: record.duration_minutes().map(format_duration),
        elapsed: elapsed_seconds(record, now).map(format_elapsed),
        predicted_leave_at: record
            .is_active()
            .then(|| predict_leave_time(record.created_at, offset)),
    }
}

fn record_success(
    state: &AppState,
    status: StatusCode,
    record: &ParkingRecord,
    now: OffsetDateTime,
) -> ApiResponse<RecordSuccessResponse> {
    ApiResponse::Success {
        status,
        body: RecordSuccessResponse {
            record: record_view(state, record, now),
            timestamp: format_timestamp(now),
        },
    }
}

fn app_error<T>(err: &AppError, now: OffsetDateTime) -> ApiResponse<T> {
    let (status, code) = match err {
        AppError::RecordNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::RecordNotFound),
        AppError::ActiveSession(_) => (StatusCode::CONFLICT, ErrorCode::ActiveSession),
        AppError::AlreadyLeft(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyLeft),
        AppError::LeaveBeforeArrival(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest),
        AppError::SnapshotRead(_)
        | AppError::SnapshotParse(_)
        | AppError::DuplicateRecordId(_)
        | AppError::IdExhausted
        | AppError::StoreLock => {
            error!(error = %err, "Internal error while handling request");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                INTERNAL_ERROR_MESSAGE.to_string(),
                now,
            );
        }
    };
    error_response(status, code, err.to_string(), now)
}

fn error_response<T>(
    status: StatusCode,
    error_code: ErrorCode,
    error_message: String,
    now: OffsetDateTime,
) -> ApiResponse<T> {
    ApiResponse::Error {
        status,
        body: ErrorResponse {
            error_code,
            error_message,
            timestamp: format_timestamp(now),
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format response timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::parking::ParkingSlot;
    use crate::stats::StatsOptions;
    use crate::store::{InMemoryStore, ParkingStore, StoreSnapshot};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-04 12:00 UTC);

    fn slot(level: &str, number: &str, latitude: f64) -> ParkingSlot {
        ParkingSlot {
            level: level.to_string(),
            slot_number: number.to_string(),
            latitude,
            longitude: 101.6544,
            elevation: 12.0,
        }
    }

    fn new_parking(level: &str, slot_number: &str) -> NewParking {
        NewParking {
            level: level.to_string(),
            slot_number: slot_number.to_string(),
            latitude: 3.1201,
            longitude: 101.6544,
            elevation: None,
        }
    }

    fn state_with(snapshot: StoreSnapshot) -> (Arc<InMemoryStore>, AppState) {
        let store = Arc::new(InMemoryStore::from_snapshot(snapshot).expect("seed store"));
        let state = AppState::with_clock(store.clone(), Arc::new(FixedClock(NOW)), StatsOptions::default());
        (store, state)
    }

    fn expect_success<T>(response: ApiResponse<T>) -> (StatusCode, T) {
        match response {
            ApiResponse::Success { status, body } => (status, body),
            ApiResponse::Error { status, body } => {
                panic!("expected success response, got {status}: {:?}", body.error_code)
            }
        }
    }

    fn expect_error<T>(response: ApiResponse<T>) -> (StatusCode, ErrorResponse) {
        match response {
            ApiResponse::Error { status, body } => (status, body),
            ApiResponse::Success { status, .. } => panic!("expected error response, got {status}"),
        }
    }

    #[test]
    fn health_is_degraded_without_slots() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_success(build_health_response(&state));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, HealthStatus::Degraded);
        assert_eq!(body.slot_count, 0);
        assert_eq!(body.timestamp, "2025-03-04T12:00:00Z");
    }

    #[test]
    fn health_is_ok_with_slots() {
        let (_store, state) = state_with(StoreSnapshot {
            slots: vec![slot("G", "1", 3.1201)],
            records: Vec::new(),
        });

        let (_, body) = expect_success(build_health_response(&state));

        assert_eq!(body.status, HealthStatus::Ok);
        assert_eq!(body.slot_count, 1);
    }

    #[test]
    fn stats_for_unknown_user_report_no_data() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_success(build_stats_response(&state, "nobody", None));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.total_duration, "0m");
        assert_eq!(body.average_duration, NO_DATA);
        assert_eq!(body.preferred_time_range, NO_DATA);
        assert_eq!(body.preferred_slot, NO_DATA);
        assert!(body.top_slots.is_empty());
    }

    #[test]
    fn stats_reject_unknown_range() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_error(build_stats_response(&state, "u-1", Some("fortnight")));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidRange);
    }

    #[test]
    fn stats_summarise_completed_sessions() {
        let (store, state) = state_with(StoreSnapshot::default());
        let first = store
            .save_parking("u-1", new_parking("1", "12"), datetime!(2025-03-04 09:00 UTC))
            .expect("save");
        store
            .update_leave_time(first.id, datetime!(2025-03-04 10:30 UTC))
            .expect("leave");
        let second = store
            .save_parking("u-1", new_parking("1", "12"), datetime!(2025-03-04 09:15 UTC))
            .expect("save");
        store
            .update_leave_time(second.id, datetime!(2025-03-04 09:45 UTC))
            .expect("leave");

        let (_, body) = expect_success(build_stats_response(&state, "u-1", Some("today")));

        assert_eq!(body.range, Some(RangeFilter::Today));
        assert_eq!(body.total_duration_minutes, 120.0);
        assert_eq!(body.total_duration, "2h");
        assert_eq!(body.average_duration, "1h");
        assert_eq!(body.preferred_time_range, "09:00 – 09:30");
        assert_eq!(body.preferred_slot, "Level 1 - Slot 12");
        assert_eq!(body.top_slots.len(), 1);
    }

    #[test]
    fn create_then_conflict_on_second_active_session() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_success(build_create_response(&state, "u-1", new_parking("G", "3")));
        let (conflict, error) = expect_error(build_create_response(&state, "u-1", new_parking("G", "4")));

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.record.slot_label, "Level G - Slot 3");
        assert_eq!(body.record.elapsed.as_deref(), Some("00:00:00"));
        assert_eq!(body.record.predicted_leave_at, Some(datetime!(2025-03-04 18:30 UTC)));
        assert_eq!(conflict, StatusCode::CONFLICT);
        assert_eq!(error.error_code, ErrorCode::ActiveSession);
    }

    #[test]
    fn create_requires_level_and_slot() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_error(build_create_response(&state, "u-1", new_parking(" ", "3")));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn leave_closes_session_once() {
        let (store, state) = state_with(StoreSnapshot::default());
        let record = store
            .save_parking("u-1", new_parking("2", "8"), datetime!(2025-03-04 08:00 UTC))
            .expect("save");

        let (_, body) = expect_success(build_leave_response(&state, record.id));
        let (status, error) = expect_error(build_leave_response(&state, record.id));

        assert_eq!(body.record.duration.as_deref(), Some("4h"));
        assert_eq!(body.record.elapsed, None);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error.error_code, ErrorCode::AlreadyLeft);
    }

    #[test]
    fn delete_unknown_record_is_not_found() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_error(build_delete_response(&state, 404));

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error_code, ErrorCode::RecordNotFound);
    }

    #[test]
    fn records_split_active_and_history() {
        let (store, state) = state_with(StoreSnapshot::default());
        let done = store
            .save_parking("u-1", new_parking("1", "1"), datetime!(2025-03-03 08:00 UTC))
            .expect("save");
        store
            .update_leave_time(done.id, datetime!(2025-03-03 17:00 UTC))
            .expect("leave");
        store
            .save_parking("u-1", new_parking("1", "2"), datetime!(2025-03-04 11:00 UTC))
            .expect("save");

        let (_, body) = expect_success(build_records_response(&state, "u-1"));

        let active = body.active.expect("active record");
        assert_eq!(active.slot_number, "2");
        assert_eq!(active.elapsed.as_deref(), Some("01:00:00"));
        assert_eq!(body.history.len(), 1);
        assert_eq!(body.history[0].duration.as_deref(), Some("9h"));
    }

    #[test]
    fn nearest_slot_reports_match_and_accuracy() {
        let (_store, state) = state_with(StoreSnapshot {
            slots: vec![slot("G", "1", 3.1210), slot("G", "2", 3.1201)],
            records: Vec::new(),
        });
        let position = Position::from_fix(3.1200, 101.6544, None, Some(45.0));

        let (_, body) = expect_success(build_nearest_response(&state, &position));

        assert_eq!(body.slot_label, "Level G - Slot 2");
        assert!(body.low_accuracy);
        assert!(body.distance_m < 12.0);
    }

    #[test]
    fn nearest_slot_without_slots_is_not_found() {
        let (_store, state) = state_with(StoreSnapshot::default());

        let (status, body) = expect_error(build_nearest_response(&state, &Position::new(3.12, 101.65)));

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error_code, ErrorCode::NoSlots);
    }
}
