//! Calendar month and day arithmetic over epoch-millisecond timestamps.
//!
//! Everything here is pure and generic over [`chrono::TimeZone`]: the server
//! passes [`chrono::Local`], tests pass `Utc` or a `FixedOffset`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Years are clamped to this window. chrono reaches a little further, so the
/// month after a clamped key is still representable.
const MIN_YEAR: i32 = -262_000;
const MAX_YEAR: i32 = 262_000;

/// A calendar month used as a selection key. `month` is 0-based (January = 0).
///
/// Any integer pair is accepted; out-of-range months roll over into
/// neighbouring years (`2024/12` is January 2025, `2025/-1` is December 2024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: i32,
}

impl MonthKey {
    pub fn new(year: i32, month: i32) -> Self {
        let total = i64::from(year) * 12 + i64::from(month);
        let year = total.div_euclid(12).clamp(i64::from(MIN_YEAR), i64::from(MAX_YEAR)) as i32;
        let month = total.rem_euclid(12) as i32;
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month0() as i32)
    }

    /// The month containing `instant` as seen in `tz`.
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        Self::from_date(instant.with_timezone(tz).date_naive())
    }

    pub fn normalized(self) -> Self {
        Self::new(self.year, self.month)
    }

    pub fn offset(self, months: i32) -> Self {
        let key = self.normalized();
        Self::new(key.year, key.month.saturating_add(months))
    }

    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn first_day(self) -> NaiveDate {
        let key = self.normalized();
        NaiveDate::from_ymd_opt(key.year, key.month as u32 + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The 1st of the following month. Not renormalized, so it stays after
    /// [`first_day`](Self::first_day) even at the clamped upper year.
    pub fn following_first_day(self) -> NaiveDate {
        let key = self.normalized();
        let (year, month0) = if key.month == 11 {
            (key.year + 1, 0)
        } else {
            (key.year, key.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month0 as u32 + 1, 1).unwrap_or(NaiveDate::MAX)
    }

    /// Day 0 of the following month, i.e. the day before its 1st.
    pub fn last_day(self) -> NaiveDate {
        self.following_first_day().pred_opt().unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(self) -> u32 {
        self.last_day().day()
    }

    /// Short label such as `Oct 2026`.
    pub fn label(self) -> String {
        self.first_day().format("%b %Y").to_string()
    }

    /// Query string selecting this month, e.g. `year=2026&month=9`.
    pub fn query_string(self) -> String {
        let key = self.normalized();
        format!("year={}&month={}", key.year, key.month)
    }
}

/// An inclusive `[start, end]` interval of epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis <= self.end
    }
}

/// First instant of the 1st of `key` through the last millisecond of its last day.
///
/// `end` is computed as one millisecond before the next month starts, which is
/// 23:59:59.999 local time on the last day.
pub fn month_range<Tz: TimeZone>(key: MonthKey, tz: &Tz) -> TimeRange {
    let start = start_of_day(key.first_day(), tz);
    let end = start_of_day(key.following_first_day(), tz) - 1;
    TimeRange { start, end }
}

/// The inclusive millisecond interval covering one local calendar day.
pub fn day_range<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> TimeRange {
    let start = start_of_day(date, tz);
    let end = match date.succ_opt() {
        Some(next) => start_of_day(next, tz) - 1,
        None => start + Duration::days(1).num_milliseconds() - 1,
    };
    TimeRange { start, end }
}

/// Epoch milliseconds of local midnight on `date`.
///
/// When midnight falls into a DST gap the first valid local time after it is used.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            (1..=16).find_map(|step| {
                tz.from_local_datetime(&(midnight + Duration::minutes(15 * step)))
                    .earliest()
            })
        })
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// The local calendar date of an epoch-millisecond timestamp.
pub fn local_date<Tz: TimeZone>(millis: i64, tz: &Tz) -> NaiveDate {
    tz.timestamp_millis_opt(millis)
        .earliest()
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// `count` months ending with `current`, oldest first.
pub fn recent_months(current: MonthKey, count: usize) -> Vec<MonthKey> {
    (0..count as i32)
        .rev()
        .map(|back| current.offset(-back))
        .collect()
}
