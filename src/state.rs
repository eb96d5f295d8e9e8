use crate::clock::{Clock, SystemClock};
use crate::error::AppError;
use crate::parking::nearest::find_nearest_slot;
use crate::parking::{ParkingRecord, ParkingSlot, Position};
use crate::stats::{RangeFilter, StatsOptions, StatsSummary, compute_stats_at};
use crate::store::ParkingStore;
use std::sync::Arc;
use time::OffsetDateTime;

/// Matched slot detached from the store snapshot it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotMatch {
    pub slot: ParkingSlot,
    pub distance_m: f64,
}

/// Shared handles for request handlers: the record store, the clock used as
/// "now", and the caller locale for statistics.
#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<dyn ParkingStore>,
    clock: Arc<dyn Clock>,
    stats_options: StatsOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn ParkingStore>, stats_options: StatsOptions) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), stats_options)
    }

    pub fn with_clock(
        store: Arc<dyn ParkingStore>,
        clock: Arc<dyn Clock>,
        stats_options: StatsOptions,
    ) -> Self {
        Self {
            store,
            clock,
            stats_options,
        }
    }

    pub fn store(&self) -> &dyn ParkingStore {
        self.store.as_ref()
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn stats_options(&self) -> &StatsOptions {
        &self.stats_options
    }

    pub fn user_records(&self, user_id: &str) -> Result<Vec<ParkingRecord>, AppError> {
        self.store.fetch_records(user_id)
    }

    pub fn user_stats(
        &self,
        user_id: &str,
        range: Option<RangeFilter>,
    ) -> Result<StatsSummary, AppError> {
        let records = self.store.fetch_records(user_id)?;
        Ok(compute_stats_at(&records, range, &self.stats_options, self.now()))
    }

    pub fn nearest_slot(&self, position: &Position) -> Result<Option<SlotMatch>, AppError> {
        let slots = self.store.fetch_slots()?;
        Ok(find_nearest_slot(position, &slots).map(|nearest| SlotMatch {
            slot: nearest.slot.clone(),
            distance_m: nearest.distance_m,
        }))
    }
}
