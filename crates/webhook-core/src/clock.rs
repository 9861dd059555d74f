//! Injectable wall-clock access.

use chrono::{DateTime, Utc};

/// Source of the current UTC instant.
///
/// Injected everywhere a timestamp is needed — capture record
/// timestamps, the `$time:*` placeholders, index-cache TTL checks — so
/// tests can freeze time instead of reaching for `Utc::now()` directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
