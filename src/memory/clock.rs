//! Time source for message and observation stamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Supplies "now". Injected so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// `now()` rendered with [`format_timestamp`].
    fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// RFC 3339, UTC, fixed millisecond precision. The fixed width keeps
/// lexical order equal to chronological order, which entity listing relies on.
/// Stamps taken within the same millisecond are equal, so an unstamped message
/// re-synced within that window deduplicates.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_have_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(whole), "2024-05-01T12:00:00.000Z");

        let later = whole + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(later) > format_timestamp(whole));
    }

    #[test]
    fn sub_millisecond_instants_format_equal() {
        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let nudged = whole + chrono::Duration::microseconds(60);
        assert_eq!(format_timestamp(nudged), format_timestamp(whole));
    }

    #[test]
    fn fixed_clock_is_stable() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.timestamp(), clock.timestamp());
    }
}
