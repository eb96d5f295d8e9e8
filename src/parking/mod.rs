use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

pub mod nearest;
pub mod schedule;

pub type RecordId = u64;

/// Horizontal accuracy (metres) above which a GPS fix is considered weak.
pub const LOW_ACCURACY_THRESHOLD_M: f64 = 20.0;

/// One parking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingRecord {
    pub id: RecordId,
    pub user_id: String,
    pub level: String,
    #[serde(deserialize_with = "slot_number_from_json")]
    pub slot_number: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in metres; a stored `0` reads back as unknown.
    #[serde(default, deserialize_with = "elevation_from_json")]
    pub elevation: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub left_at: Option<OffsetDateTime>,
}

impl ParkingRecord {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    pub fn slot_label(&self) -> String {
        slot_label(&self.level, &self.slot_number)
    }

    /// Minutes between arrival and departure, `None` while still parked.
    pub fn duration_minutes(&self) -> Option<f64> {
        self.left_at
            .map(|left_at| (left_at - self.created_at).as_seconds_f64() / 60.0)
    }
}

/// A known physical slot in the lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSlot {
    pub level: String,
    #[serde(deserialize_with = "slot_number_from_json")]
    pub slot_number: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
}

impl ParkingSlot {
    pub fn slot_label(&self) -> String {
        slot_label(&self.level, &self.slot_number)
    }
}

/// Fields supplied by the user when confirming a parking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewParking {
    pub level: String,
    #[serde(deserialize_with = "slot_number_from_json")]
    pub slot_number: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "elevation_from_json")]
    pub elevation: Option<f64>,
}

/// Current GPS fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub accuracy_m: Option<f64>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            accuracy_m: None,
        }
    }

    /// Build a position from a raw receiver fix. Receivers report a missing
    /// altitude as `0`, so zero is mapped to unknown.
    pub fn from_fix(
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        accuracy_m: Option<f64>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            elevation: altitude.filter(|alt| *alt != 0.0 && alt.is_finite()),
            accuracy_m,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn is_low_accuracy(&self) -> bool {
        self.accuracy_m
            .is_some_and(|accuracy| accuracy > LOW_ACCURACY_THRESHOLD_M)
    }
}

pub fn slot_label(level: &str, slot_number: &str) -> String {
    format!("Level {level} - Slot {slot_number}")
}

fn slot_number_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSlotNumber {
        Text(String),
        Number(i64),
    }

    Ok(match RawSlotNumber::deserialize(deserializer)? {
        RawSlotNumber::Text(text) => text,
        RawSlotNumber::Number(number) => number.to_string(),
    })
}

fn elevation_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|elevation| *elevation != 0.0))
}
