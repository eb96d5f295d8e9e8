use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, Time, UtcOffset};

/// Width of a time-of-day bucket.
pub const BUCKET_MINUTES: i64 = 30;

/// Clock style used when rendering bucket boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HourFormat {
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
    #[serde(rename = "12h")]
    TwelveHour,
}

/// Half-hour slice of the local day, identified by its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HalfHourBucket {
    pub hour: u8,
    pub minute: u8,
}

impl HalfHourBucket {
    pub fn containing(timestamp: OffsetDateTime, offset: UtcOffset) -> Self {
        let local = timestamp.to_offset(offset);
        Self {
            hour: local.hour(),
            minute: if local.minute() < 30 { 0 } else { 30 },
        }
    }

    pub fn start(self) -> Time {
        Time::from_hms(self.hour, self.minute, 0).unwrap_or(Time::MIDNIGHT)
    }

    /// Start of the following bucket; wraps to 00:00 after 23:30.
    pub fn end(self) -> Time {
        self.start() + Duration::minutes(BUCKET_MINUTES)
    }

    /// `"09:00 – 09:30"` or `"09:00 AM – 09:30 AM"`.
    pub fn time_range(self, format: HourFormat) -> String {
        format!(
            "{} – {}",
            format_clock(self.start(), format),
            format_clock(self.end(), format)
        )
    }
}

fn format_clock(time: Time, format: HourFormat) -> String {
    match format {
        HourFormat::TwentyFourHour => format!("{:02}:{:02}", time.hour(), time.minute()),
        HourFormat::TwelveHour => {
            let period = if time.hour() < 12 { "AM" } else { "PM" };
            let hour = match time.hour() % 12 {
                0 => 12,
                hour => hour,
            };
            format!("{hour:02}:{:02} {period}", time.minute())
        }
    }
}
