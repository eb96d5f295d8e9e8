//! Display helpers for durations shown next to the statistics.

const MINUTES_PER_DAY: u64 = 1440;

/// Compact duration such as `"1d 2h 5m"`. Fractional minutes are truncated;
/// anything under a minute renders as `"0m"`.
pub fn format_duration(total_minutes: f64) -> String {
    let minutes = if total_minutes.is_finite() && total_minutes > 0.0 {
        total_minutes.floor() as u64
    } else {
        0
    };
    let days = minutes / MINUTES_PER_DAY;
    let hours = (minutes % MINUTES_PER_DAY) / 60;
    let mins = minutes % 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if mins > 0 || parts.is_empty() {
        parts.push(format!("{mins}m"));
    }
    parts.join(" ")
}

/// Running-session timer as `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_omits_zero_components() {
        assert_eq!(format_duration(0.0), "0m");
        assert_eq!(format_duration(0.9), "0m");
        assert_eq!(format_duration(60.0), "1h");
        assert_eq!(format_duration(125.5), "2h 5m");
        assert_eq!(format_duration(1440.0 + 61.0), "1d 1h 1m");
        assert_eq!(format_duration(2880.0), "2d");
    }

    #[test]
    fn negative_or_nan_duration_is_zero() {
        assert_eq!(format_duration(-5.0), "0m");
        assert_eq!(format_duration(f64::NAN), "0m");
    }

    #[test]
    fn elapsed_pads_each_component() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(3605), "01:00:05");
        assert_eq!(format_elapsed(100 * 3600 + 59), "100:00:59");
    }
}
