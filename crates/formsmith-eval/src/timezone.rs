/// Timezone support for the clock used by date-based formulas
use chrono::{DateTime, NaiveDateTime, Utc};

/// Timezone specification for date calculations.
///
/// `Local` follows the host clock and needs the `system-clock` feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeZoneSpec {
    /// Use the system's local timezone
    #[cfg(feature = "system-clock")]
    Local,
    /// Use UTC timezone
    Utc,
    /// Fixed offset east of UTC, in seconds. Out-of-range offsets act as UTC.
    FixedOffset(i32),
}

impl Default for TimeZoneSpec {
    fn default() -> Self {
        #[cfg(feature = "system-clock")]
        {
            TimeZoneSpec::Local
        }
        #[cfg(not(feature = "system-clock"))]
        {
            TimeZoneSpec::Utc
        }
    }
}

impl TimeZoneSpec {
    /// Get the current datetime in the specified timezone
    #[cfg(feature = "system-clock")]
    pub fn now(&self) -> NaiveDateTime {
        self.localize(Utc::now())
    }

    /// Wall-clock time of `instant` in this timezone.
    pub fn localize(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            #[cfg(feature = "system-clock")]
            TimeZoneSpec::Local => instant.with_timezone(&chrono::Local).naive_local(),
            TimeZoneSpec::Utc => instant.naive_utc(),
            TimeZoneSpec::FixedOffset(secs) => match chrono::FixedOffset::east_opt(*secs) {
                Some(offset) => instant.with_timezone(&offset).naive_local(),
                None => instant.naive_utc(),
            },
        }
    }
}
