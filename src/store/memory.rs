use crate::error::AppError;
use crate::parking::{NewParking, ParkingRecord, ParkingSlot, RecordId};
use crate::store::{ParkingStore, StoreSnapshot};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<ParkingRecord>,
    slots: Vec<ParkingSlot>,
    next_id: RecordId,
    feeds: HashMap<String, watch::Sender<u64>>,
}

impl StoreInner {
    /// Bumps the user's feed. A feed nobody listens to any more is dropped,
    /// so the map only holds users with live subscribers.
    fn notify(&mut self, user_id: &str) {
        let Some(feed) = self.feeds.get(user_id) else {
            return;
        };
        if feed.receiver_count() == 0 {
            self.feeds.remove(user_id);
        } else {
            feed.send_modify(|version| *version = version.wrapping_add(1));
        }
    }
}

/// Seeded records must satisfy the same rules `save_parking` and
/// `update_leave_time` enforce. Returns the next id to hand out.
fn validate_seed(records: &[ParkingRecord]) -> Result<RecordId, AppError> {
    let mut ids = HashSet::with_capacity(records.len());
    let mut active_users = HashSet::new();
    for record in records {
        if !ids.insert(record.id) {
            return Err(AppError::DuplicateRecordId(record.id));
        }
        match record.left_at {
            Some(left_at) if left_at < record.created_at => {
                return Err(AppError::LeaveBeforeArrival(record.id));
            }
            Some(_) => {}
            None => {
                if !active_users.insert(record.user_id.as_str()) {
                    return Err(AppError::ActiveSession(record.user_id.clone()));
                }
            }
        }
    }

    match records.iter().map(|record| record.id).max() {
        Some(max) => max.checked_add(1).ok_or(AppError::IdExhausted),
        None => Ok(1),
    }
}

/// Process-local store; the lock is held only for the duration of a call.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, rejecting snapshots that break the store's rules:
    /// duplicate ids, a departure before arrival, or two open sessions for
    /// one user.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, AppError> {
        let next_id = validate_seed(&snapshot.records)?;
        Ok(Self {
            inner: RwLock::new(StoreInner {
                records: snapshot.records,
                slots: snapshot.slots,
                next_id,
                feeds: HashMap::new(),
            }),
        })
    }

    pub fn set_slots(&self, slots: Vec<ParkingSlot>) -> Result<(), AppError> {
        let mut inner = self.inner.write().map_err(|_| AppError::StoreLock)?;
        inner.slots = slots;
        Ok(())
    }
}

impl ParkingStore for InMemoryStore {
    fn fetch_records(&self, user_id: &str) -> Result<Vec<ParkingRecord>, AppError> {
        let inner = self.inner.read().map_err(|_| AppError::StoreLock)?;
        let mut records: Vec<ParkingRecord> = inner
            .records
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn fetch_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        let inner = self.inner.read().map_err(|_| AppError::StoreLock)?;
        Ok(inner.slots.clone())
    }

    fn save_parking(
        &self,
        user_id: &str,
        parking: NewParking,
        created_at: OffsetDateTime,
    ) -> Result<ParkingRecord, AppError> {
        let mut inner = self.inner.write().map_err(|_| AppError::StoreLock)?;
        if inner
            .records
            .iter()
            .any(|record| record.user_id == user_id && record.is_active())
        {
            return Err(AppError::ActiveSession(user_id.to_string()));
        }

        let id = inner.next_id.max(1);
        inner.next_id = id.checked_add(1).ok_or(AppError::IdExhausted)?;
        let record = ParkingRecord {
            id,
            user_id: user_id.to_string(),
            level: parking.level,
            slot_number: parking.slot_number,
            latitude: parking.latitude,
            longitude: parking.longitude,
            elevation: parking.elevation,
            created_at,
            left_at: None,
        };
        inner.records.push(record.clone());
        inner.notify(user_id);

        info!(
            record_id = id,
            user_id = user_id,
            slot = %record.slot_label(),
            "Parking saved"
        );
        Ok(record)
    }

    fn update_leave_time(
        &self,
        id: RecordId,
        left_at: OffsetDateTime,
    ) -> Result<ParkingRecord, AppError> {
        let mut inner = self.inner.write().map_err(|_| AppError::StoreLock)?;
        let record = inner
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(AppError::RecordNotFound(id))?;
        if record.left_at.is_some() {
            return Err(AppError::AlreadyLeft(id));
        }
        if left_at < record.created_at {
            return Err(AppError::LeaveBeforeArrival(id));
        }
        record.left_at = Some(left_at);
        let record = record.clone();
        inner.notify(&record.user_id);

        info!(
            record_id = id,
            user_id = %record.user_id,
            duration_minutes = record.duration_minutes().unwrap_or(0.0),
            "Parking ended"
        );
        Ok(record)
    }

    fn delete_record(&self, id: RecordId) -> Result<ParkingRecord, AppError> {
        let mut inner = self.inner.write().map_err(|_| AppError::StoreLock)?;
        let position = inner
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(AppError::RecordNotFound(id))?;
        let record = inner.records.remove(position);
        inner.notify(&record.user_id);

        info!(record_id = id, user_id = %record.user_id, "Parking record deleted");
        Ok(record)
    }

    fn subscribe(&self, user_id: &str) -> Result<watch::Receiver<u64>, AppError> {
        let mut inner = self.inner.write().map_err(|_| AppError::StoreLock)?;
        let feed = inner
            .feeds
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(0).0);
        Ok(feed.subscribe())
    }
}
