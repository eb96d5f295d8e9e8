//! Parking statistics for one user's history.
//!
//! Everything here is a pure function of the records, the caller's local
//! offset, and the instant passed as "now". Degenerate input (no records,
//! nothing completed) produces zero totals and `None` sentinels, never an error.

use crate::parking::ParkingRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::debug;

pub mod bucket;
pub mod format;
mod tally;

use bucket::{HalfHourBucket, HourFormat};
use tally::FirstSeen;

/// Display sentinel for statistics that have no underlying data.
pub const NO_DATA: &str = "No data";

/// Caller locale: local time zone and clock style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    pub utc_offset: UtcOffset,
    pub hour_format: HourFormat,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
            hour_format: HourFormat::TwentyFourHour,
        }
    }
}

/// Date window applied before aggregation. Only completed sessions qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeFilter {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown range filter: {0} (expected today, 7d, 30d or all)")]
pub struct RangeFilterError(String);

impl FromStr for RangeFilter {
    type Err = RangeFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "all" => Ok(Self::All),
            other => Err(RangeFilterError(other.to_string())),
        }
    }
}

impl RangeFilter {
    /// `Today` compares local calendar dates; the rolling windows compare
    /// elapsed wall-clock time since departure.
    pub fn includes(self, record: &ParkingRecord, now: OffsetDateTime, offset: UtcOffset) -> bool {
        let Some(left_at) = record.left_at else {
            return false;
        };
        match self {
            Self::Today => left_at.to_offset(offset).date() == now.to_offset(offset).date(),
            Self::Last7Days => now - left_at <= Duration::days(7),
            Self::Last30Days => now - left_at <= Duration::days(30),
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSlot {
    pub rank: usize,
    pub label: String,
    pub count: usize,
    /// Count relative to the most used slot, in percent.
    pub share_of_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub total_duration_minutes: f64,
    pub average_duration_minutes: Option<f64>,
    /// Per-slot counts in first-seen order.
    pub slot_frequency: Vec<SlotCount>,
    pub preferred_bucket: Option<HalfHourBucket>,
    pub preferred_time_range: Option<String>,
    pub preferred_slot: Option<String>,
}

impl StatsSummary {
    pub fn time_range_label(&self) -> &str {
        self.preferred_time_range.as_deref().unwrap_or(NO_DATA)
    }

    pub fn slot_label(&self) -> &str {
        self.preferred_slot.as_deref().unwrap_or(NO_DATA)
    }

    /// Slots by descending count; equal counts keep first-seen order.
    pub fn ranked_slots(&self) -> Vec<RankedSlot> {
        let mut ordered: Vec<&SlotCount> = self.slot_frequency.iter().collect();
        ordered.sort_by(|a, b| b.count.cmp(&a.count));
        let max = ordered.first().map(|slot| slot.count).unwrap_or(0);

        ordered
            .into_iter()
            .enumerate()
            .map(|(index, slot)| RankedSlot {
                rank: index + 1,
                label: slot.label.clone(),
                count: slot.count,
                share_of_max: if max == 0 {
                    0.0
                } else {
                    slot.count as f64 / max as f64 * 100.0
                },
            })
            .collect()
    }

    pub fn top_slots(&self, limit: usize) -> Vec<RankedSlot> {
        let mut ranked = self.ranked_slots();
        ranked.truncate(limit);
        ranked
    }
}

#[derive(Debug, Default)]
struct BucketTally {
    total: usize,
    slots: FirstSeen<String, usize>,
}

pub fn compute_stats(
    records: &[ParkingRecord],
    range: Option<RangeFilter>,
    options: &StatsOptions,
) -> StatsSummary {
    compute_stats_at(records, range, options, OffsetDateTime::now_utc())
}

pub fn compute_stats_at(
    records: &[ParkingRecord],
    range: Option<RangeFilter>,
    options: &StatsOptions,
    now: OffsetDateTime,
) -> StatsSummary {
    let in_scope: Vec<&ParkingRecord> = match range {
        Some(range) => records
            .iter()
            .filter(|record| range.includes(record, now, options.utc_offset))
            .collect(),
        None => records.iter().collect(),
    };

    let summary = aggregate(&in_scope, options);
    debug!(
        records = records.len(),
        in_scope = summary.total_sessions,
        completed = summary.completed_sessions,
        range = ?range,
        "Computed parking stats"
    );
    summary
}

fn aggregate(records: &[&ParkingRecord], options: &StatsOptions) -> StatsSummary {
    let mut buckets: FirstSeen<HalfHourBucket, BucketTally> = FirstSeen::default();
    let mut slot_frequency: FirstSeen<String, usize> = FirstSeen::default();
    let mut total_duration_minutes = 0.0;
    let mut completed_sessions = 0usize;

    for record in records {
        let label = record.slot_label();
        let tally = buckets.entry(HalfHourBucket::containing(record.created_at, options.utc_offset));
        tally.total += 1;
        *tally.slots.entry(label.clone()) += 1;
        *slot_frequency.entry(label) += 1;

        if let Some(minutes) = record.duration_minutes() {
            total_duration_minutes += minutes;
            completed_sessions += 1;
        }
    }

    let preferred = buckets.leader_by(|tally| tally.total);
    let preferred_bucket = preferred.map(|(bucket, _)| *bucket);
    let preferred_slot = preferred
        .and_then(|(_, tally)| tally.slots.leader_by(|count| *count))
        .map(|(label, _)| label.clone());

    let average_duration_minutes = if completed_sessions > 0 {
        Some(total_duration_minutes / completed_sessions as f64)
    } else {
        None
    };

    StatsSummary {
        total_sessions: records.len(),
        completed_sessions,
        total_duration_minutes,
        average_duration_minutes,
        slot_frequency: slot_frequency
            .into_entries()
            .into_iter()
            .map(|(label, count)| SlotCount { label, count })
            .collect(),
        preferred_bucket,
        preferred_time_range: preferred_bucket.map(|bucket| bucket.time_range(options.hour_format)),
        preferred_slot,
    }
}
