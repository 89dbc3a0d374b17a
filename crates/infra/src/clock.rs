//! Time sources for transaction timestamps.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for the ledger.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wraps a clock so readings never go backwards within the process.
///
/// Wall clocks can step back (NTP adjustments); transaction timestamps must
/// stay non-decreasing, so a reading earlier than the last one is clamped.
#[derive(Debug, Default)]
pub struct MonotonicClock<C> {
    inner: C,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl<C> MonotonicClock<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = self.inner.now();
        let now = match *last {
            Some(prev) if prev > reading => prev,
            _ => reading,
        };
        *last = Some(now);
        now
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let manual = Arc::new(ManualClock::new(start));
        let clock = MonotonicClock::new(manual.clone());

        assert_eq!(clock.now(), start);

        manual.set(start - Duration::minutes(5));
        assert_eq!(clock.now(), start);

        manual.advance(Duration::minutes(10));
        assert_eq!(clock.now(), start + Duration::minutes(5));
    }
}
