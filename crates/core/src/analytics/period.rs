//! Local-time windows and transaction date resolution.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

/// Largest accepted offset magnitude, in minutes.
const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// Browser timezone offset in minutes, as `Date.getTimezoneOffset()` reports
/// it: UTC minus local time, so UTC+5 is `-300`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimezoneOffset(i32);

impl TimezoneOffset {
    /// UTC.
    pub const UTC: Self = Self(0);

    /// Creates an offset, clamped to one day either way.
    #[must_use]
    pub fn from_minutes(minutes: i32) -> Self {
        Self(minutes.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES))
    }

    /// Parses a header value. Anything that is not an integer is UTC.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .map_or(Self::UTC, Self::from_minutes)
    }

    /// Offset in minutes.
    #[must_use]
    pub const fn minutes(self) -> i32 {
        self.0
    }

    fn duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }

    /// The user's wall-clock time at `now`.
    #[must_use]
    pub fn local_now(self, now: DateTime<Utc>) -> NaiveDateTime {
        now.naive_utc() - self.duration()
    }

    /// Converts a local wall-clock time to UTC.
    #[must_use]
    pub fn to_utc(self, local: NaiveDateTime) -> DateTime<Utc> {
        (local + self.duration()).and_utc()
    }

    /// Converts a UTC instant to the user's wall-clock time.
    #[must_use]
    pub fn to_local(self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() - self.duration()
    }
}

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Since local midnight.
    Day,
    /// Since local Monday midnight.
    Week,
    /// Since the first of the local month.
    Month,
    /// Since January 1st local.
    Year,
    /// No lower bound.
    All,
}

impl FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::All,
        })
    }
}

impl Period {
    /// Parses a query value; unknown values mean [`Period::All`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::All)
    }

    /// UTC instant at which the window starts, or `None` for all time.
    #[must_use]
    pub fn start_utc(self, now: DateTime<Utc>, offset: TimezoneOffset) -> Option<DateTime<Utc>> {
        let today = offset.local_now(now).date();
        let start = match self {
            Self::Day => today,
            Self::Week => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
            Self::Month => today.with_day(1)?,
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
            Self::All => return None,
        };
        Some(offset.to_utc(start.and_time(NaiveTime::MIN)))
    }
}

/// UTC bounds `[start, end)` of a local calendar month.
#[must_use]
pub fn month_bounds_utc(
    year: i32,
    month: u32,
    offset: TimezoneOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        offset.to_utc(first.and_time(NaiveTime::MIN)),
        offset.to_utc(next.and_time(NaiveTime::MIN)),
    ))
}

/// Resolves the date a client sent for a transaction into a UTC instant.
///
/// - a timestamp (contains `T`) is taken as-is; without a zone it is UTC
/// - a bare `YYYY-MM-DD` equal to the user's local today means "now"
/// - any other bare date is midnight UTC of that date
/// - missing or unparsable input means "now"
#[must_use]
pub fn resolve_transaction_date(
    input: Option<&str>,
    offset: TimezoneOffset,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(raw) = input.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return now;
    };

    if raw.contains('T') {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return parsed.with_timezone(&Utc);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return naive.and_utc();
        }
        debug!(input = %raw, "Unparsable transaction timestamp; using now");
        return now;
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) if date == offset.local_now(now).date() => now,
        Ok(date) => date.and_time(NaiveTime::MIN).and_utc(),
        Err(_) => {
            debug!(input = %raw, "Unparsable transaction date; using now");
            now
        }
    }
}
