use crate::error::AppError;
use crate::parking::{NewParking, ParkingRecord, ParkingSlot, RecordId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use tokio::sync::watch;

pub mod memory;

pub use memory::InMemoryStore;

/// Record and slot storage backing the parking screens.
///
/// Mutations bump the owning user's change feed so subscribers know to
/// re-fetch; the feed carries no payload beyond a version counter.
pub trait ParkingStore: Send + Sync + std::fmt::Debug {
    /// All records for a user, newest arrival first.
    fn fetch_records(&self, user_id: &str) -> Result<Vec<ParkingRecord>, AppError>;

    fn fetch_slots(&self) -> Result<Vec<ParkingSlot>, AppError>;

    /// Open a new session. Fails if the user already has one open.
    fn save_parking(
        &self,
        user_id: &str,
        parking: NewParking,
        created_at: OffsetDateTime,
    ) -> Result<ParkingRecord, AppError>;

    /// Close a session. A record can only be closed once.
    fn update_leave_time(
        &self,
        id: RecordId,
        left_at: OffsetDateTime,
    ) -> Result<ParkingRecord, AppError>;

    fn delete_record(&self, id: RecordId) -> Result<ParkingRecord, AppError>;

    fn subscribe(&self, user_id: &str) -> Result<watch::Receiver<u64>, AppError>;
}

/// On-disk seed for the in-memory store.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub slots: Vec<ParkingSlot>,
    #[serde(default)]
    pub records: Vec<ParkingRecord>,
}

pub fn load_snapshot_from_path(path: impl AsRef<Path>) -> Result<StoreSnapshot, AppError> {
    let contents = std::fs::read_to_string(path)?;
    let snapshot: StoreSnapshot = serde_json::from_str(&contents)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn snapshot_loads_slots_and_records() -> Result<(), Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("park-easy-snapshot-{unique}.json"));
        let contents = r#"{
            "slots": [
                {"level": "G", "slot_number": 1, "latitude": 3.1201, "longitude": 101.6544, "elevation": 12.5}
            ],
            "records": [
                {
                    "id": 4,
                    "user_id": "u-1",
                    "level": "G",
                    "slot_number": "1",
                    "latitude": 3.1201,
                    "longitude": 101.6544,
                    "created_at": "2025-03-04T08:15:00+08:00",
                    "left_at": "2025-03-04T17:05:00+08:00"
                }
            ]
        }"#;
        fs::write(&path, contents)?;

        let snapshot = load_snapshot_from_path(&path)?;
        let _ = fs::remove_file(&path);

        assert_eq!(snapshot.slots.len(), 1);
        assert_eq!(snapshot.slots[0].slot_number, "1");
        assert_eq!(snapshot.records[0].duration_minutes(), Some(530.0));
        Ok(())
    }

    #[test]
    fn missing_snapshot_returns_read_error() {
        let path = std::env::temp_dir().join("park-easy-snapshot-does-not-exist.json");

        let result = load_snapshot_from_path(&path);

        assert!(matches!(result, Err(AppError::SnapshotRead(_))));
    }

    #[test]
    fn invalid_snapshot_returns_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let path = std::env::temp_dir().join(format!("park-easy-snapshot-invalid-{unique}.json"));
        fs::write(&path, "{\"slots\": [")?;

        let result = load_snapshot_from_path(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(AppError::SnapshotParse(_))));
        Ok(())
    }
}
