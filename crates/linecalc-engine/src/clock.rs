//! Wall-clock access for the `now` and `today` scope entries.
//!
//! The clock is read once at the start of every pass so that all lines in a
//! pass agree on the time. Tests use [`FixedClock`] to keep passes repeatable.

use chrono::NaiveDateTime;

pub trait ClockProvider: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[cfg(feature = "system-clock")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "system-clock")]
impl ClockProvider for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        FixedClock(at)
    }
}

impl ClockProvider for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// The clock an engine starts with.
pub fn default_clock() -> Box<dyn ClockProvider> {
    #[cfg(feature = "system-clock")]
    {
        Box::new(SystemClock)
    }
    #[cfg(not(feature = "system-clock"))]
    {
        Box::new(FixedClock::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_is_stable() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), clock.now());
    }
}
