//! Time source for everything that needs "now".
//!
//! Handlers never call `Utc::now()` directly; they ask the [`Clock`] stored in
//! [`AppState`](crate::state::AppState). Tests install a [`FixedClock`] so
//! month defaults, ledger timestamps and per-day averages are deterministic.

use chrono::{DateTime, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current instant as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Freeze at `millis` since the epoch. Out-of-range values fall back to the epoch.
    pub fn at_millis(millis: i64) -> Self {
        Self(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
