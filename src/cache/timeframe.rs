//! Rolling time windows for recency-partitioned listings.
//!
//! Listings such as `/top/week` or `/t/{tag}/top/year` are cached per window.
//! A bucket's boundary is a closure over the clock, so it reflects the instant
//! it is evaluated at rather than the instant the bucket list was built.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use time::{Date, Duration, Month, OffsetDateTime};

/// Source of "now" for time-sensitive invalidation.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually driven clock with second precision.
#[derive(Debug)]
pub struct FixedClock {
    unix_seconds: AtomicI64,
}

impl FixedClock {
    pub fn new(at: OffsetDateTime) -> Self {
        Self {
            unix_seconds: AtomicI64::new(at.unix_timestamp()),
        }
    }

    pub fn set(&self, at: OffsetDateTime) {
        self.unix_seconds.store(at.unix_timestamp(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.unix_seconds
            .fetch_add(by.whole_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        let seconds = self.unix_seconds.load(Ordering::SeqCst);
        OffsetDateTime::from_unix_timestamp(seconds).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

pub type Boundary = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// One recency window: content published at or after `boundary()` belongs to it.
#[derive(Clone)]
pub struct TimeBucket {
    boundary: Boundary,
    label: &'static str,
}

impl TimeBucket {
    pub fn new(label: &'static str, boundary: Boundary) -> Self {
        Self { boundary, label }
    }

    /// Evaluate the boundary against the current instant.
    pub fn boundary(&self) -> OffsetDateTime {
        (self.boundary)()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        at >= self.boundary()
    }
}

impl fmt::Debug for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeBucket")
            .field("label", &self.label)
            .field("boundary", &self.boundary())
            .finish()
    }
}

pub const WEEK: &str = "week";
pub const MONTH: &str = "month";
pub const YEAR: &str = "year";
pub const INFINITY: &str = "infinity";

/// Produces the ordered bucket list, finest window first.
#[derive(Clone)]
pub struct TimeWindowPlanner {
    clock: Arc<dyn Clock>,
    founded: OffsetDateTime,
}

impl TimeWindowPlanner {
    /// `established_year` anchors the oldest bucket; out-of-range years fall
    /// back to the Unix epoch.
    pub fn new(clock: Arc<dyn Clock>, established_year: i32) -> Self {
        let founded = Date::from_calendar_date(established_year, Month::January, 1)
            .map(|date| date.midnight().assume_utc())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        Self { clock, founded }
    }

    pub fn system(established_year: i32) -> Self {
        Self::new(Arc::new(SystemClock), established_year)
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn founded(&self) -> OffsetDateTime {
        self.founded
    }

    pub fn buckets(&self) -> Vec<TimeBucket> {
        let week = {
            let clock = Arc::clone(&self.clock);
            TimeBucket::new(WEEK, Arc::new(move || clock.now() - Duration::weeks(1)))
        };
        let month = {
            let clock = Arc::clone(&self.clock);
            TimeBucket::new(MONTH, Arc::new(move || shift_months(clock.now(), 1)))
        };
        let year = {
            let clock = Arc::clone(&self.clock);
            TimeBucket::new(YEAR, Arc::new(move || shift_months(clock.now(), 12)))
        };
        let infinity = {
            let clock = Arc::clone(&self.clock);
            let founded = self.founded;
            // Never later than now, so simulated past instants still resolve.
            TimeBucket::new(INFINITY, Arc::new(move || founded.min(clock.now())))
        };

        vec![week, month, year, infinity]
    }
}

impl fmt::Debug for TimeWindowPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeWindowPlanner")
            .field("founded", &self.founded)
            .finish_non_exhaustive()
    }
}

/// Step back `months` calendar months, clamping the day to the target month.
fn shift_months(at: OffsetDateTime, months: i32) -> OffsetDateTime {
    let date = at.date();
    let index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 - months;
    let year = index.div_euclid(12);
    let month = Month::January.nth_next(index.rem_euclid(12) as u8);

    (1..=date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
        .map(|shifted| at.replace_date(shifted))
        .unwrap_or(at)
}
