use crate::parking::ParkingRecord;
use time::macros::time;
use time::{OffsetDateTime, Time, UtcOffset};

// Arrival cut-offs (inclusive) and the matching predicted departures.
const LEAVE_SCHEDULE: [(Time, Time); 2] = [
    (time!(08:00), time!(17:00)),
    (time!(08:45), time!(17:45)),
];
const LATE_LEAVE_TIME: Time = time!(18:30);

/// The user's open session, if any.
pub fn active_record(records: &[ParkingRecord]) -> Option<&ParkingRecord> {
    records.iter().find(|record| record.is_active())
}

/// Completed sessions, newest arrival first.
pub fn completed_history(records: &[ParkingRecord]) -> Vec<&ParkingRecord> {
    let mut completed: Vec<&ParkingRecord> =
        records.iter().filter(|record| !record.is_active()).collect();
    completed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    completed
}

/// Sessions that started on the local calendar day of `now`, earliest first.
pub fn daily_schedule(
    records: &[ParkingRecord],
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Vec<&ParkingRecord> {
    let today = now.to_offset(offset).date();
    let mut schedule: Vec<&ParkingRecord> = records
        .iter()
        .filter(|record| record.created_at.to_offset(offset).date() == today)
        .collect();
    schedule.sort_by_key(|record| record.created_at);
    schedule
}

/// Expected departure for a session based on the local arrival time.
pub fn predict_leave_time(created_at: OffsetDateTime, offset: UtcOffset) -> OffsetDateTime {
    let arrival = created_at.to_offset(offset);
    let arrival_time = Time::from_hms(arrival.hour(), arrival.minute(), 0).unwrap_or(Time::MIDNIGHT);
    let leave_time = LEAVE_SCHEDULE
        .iter()
        .find(|(cutoff, _)| arrival_time <= *cutoff)
        .map(|(_, leave)| *leave)
        .unwrap_or(LATE_LEAVE_TIME);
    arrival.replace_time(leave_time)
}

/// Whole seconds an active session has been running; `None` once it has ended.
pub fn elapsed_seconds(record: &ParkingRecord, now: OffsetDateTime) -> Option<u64> {
    if !record.is_active() {
        return None;
    }
    let elapsed = (now - record.created_at).whole_seconds().max(0);
    Some(elapsed.unsigned_abs())
}
