//! Nearest known slot to a GPS fix.
//!
//! Distances use a local flat-earth approximation: one degree of latitude or
//! longitude is taken as [`METERS_PER_DEGREE`] with no great-circle or
//! cos(latitude) correction. This is only meaningful across a single lot.

use crate::parking::{ParkingSlot, Position};

pub const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSlot<'a> {
    pub slot: &'a ParkingSlot,
    pub distance_m: f64,
}

/// Squared distance in m² between a fix and a slot. Elevation contributes
/// only when the fix carries a usable altitude.
pub fn squared_distance(position: &Position, slot: &ParkingSlot) -> f64 {
    let lat_m = (slot.latitude - position.latitude) * METERS_PER_DEGREE;
    let lon_m = (slot.longitude - position.longitude) * METERS_PER_DEGREE;
    let mut distance_sq = lat_m * lat_m + lon_m * lon_m;
    if let Some(elevation) = position.elevation.filter(|e| *e != 0.0) {
        let alt_m = slot.elevation - elevation;
        distance_sq += alt_m * alt_m;
    }
    distance_sq
}

/// Linear scan for the closest slot; the first of equidistant slots wins.
pub fn find_nearest_slot<'a>(
    position: &Position,
    slots: &'a [ParkingSlot],
) -> Option<NearestSlot<'a>> {
    let mut nearest: Option<(&'a ParkingSlot, f64)> = None;
    for slot in slots {
        let distance_sq = squared_distance(position, slot);
        if distance_sq.is_nan() {
            continue;
        }
        if nearest.is_none_or(|(_, best)| distance_sq < best) {
            nearest = Some((slot, distance_sq));
        }
    }

    nearest.map(|(slot, distance_sq)| NearestSlot {
        slot,
        distance_m: distance_sq.sqrt(),
    })
}
