use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

/// Aggregation period for the energy buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Hourly,
    Daily,
    Monthly,
    Yearly,
}

impl Period {
    /// Truncates `instant` to the start of the period containing it.
    pub fn truncate(self, instant: NaiveDateTime) -> NaiveDateTime {
        let date = instant.date();
        match self {
            Period::Hourly => date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(instant.hour())),
            Period::Daily => date.and_time(NaiveTime::MIN),
            Period::Monthly => first_of(date.year(), date.month()),
            Period::Yearly => first_of(date.year(), 1),
        }
    }

    /// Property that carries the integrated energy for this period.
    pub fn energy_property(self) -> &'static str {
        match self {
            Period::Hourly => "hourlyenergy",
            Period::Daily => "energy",
            Period::Monthly => "monthlyenergy",
            Period::Yearly => "yearlyenergy",
        }
    }
}

fn first_of(year: i32, month: u32) -> NaiveDateTime {
    // Day 1 exists in every month of every representable year
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Output file name for a bucket key: ISO-8601 with the colons removed and a
/// fixed `.000Z` suffix, e.g. `2007-01-01T000000.000Z`.
pub fn key_file_name(key: NaiveDateTime) -> String {
    format!("{}.000Z", key.format("%Y-%m-%dT%H%M%S"))
}
