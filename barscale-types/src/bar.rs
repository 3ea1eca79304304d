use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BarscaleError;

/// One OHLCV record for a fixed time bucket.
///
/// `ts` is the bucket start in UTC; exchange-local alignment is handled by
/// the aggregation layer via the exchange's timezone. A well-formed bar
/// satisfies `low <= min(open, close) <= max(open, close) <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start timestamp (UTC).
    pub ts: DateTime<Utc>,
    /// First traded price in the bucket.
    pub open: Decimal,
    /// Highest traded price in the bucket.
    pub high: Decimal,
    /// Lowest traded price in the bucket.
    pub low: Decimal,
    /// Last traded price in the bucket.
    pub close: Decimal,
    /// Total traded volume in the bucket.
    pub volume: u64,
}

impl Bar {
    /// Whether the OHLC fields are mutually consistent.
    #[must_use]
    pub fn ohlc_consistent(&self) -> bool {
        let max_oc = self.open.max(self.close);
        let min_oc = self.open.min(self.close);
        self.low <= min_oc && max_oc <= self.high
    }
}

/// Half-open time range `[start, end)` at minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive start (UTC, minute aligned).
    pub start: DateTime<Utc>,
    /// Exclusive end (UTC, minute aligned).
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting empty/inverted ranges and sub-minute bounds.
    ///
    /// # Errors
    /// Returns `BarscaleError::InvalidArg` when `start >= end` or either
    /// bound is not aligned to a whole minute.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BarscaleError> {
        if start >= end {
            return Err(BarscaleError::invalid_arg(format!(
                "empty time range: start {start} is not before end {end}"
            )));
        }
        if start.timestamp() % 60 != 0 || end.timestamp() % 60 != 0 {
            return Err(BarscaleError::invalid_arg(format!(
                "time range bounds must be minute-aligned: [{start}, {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether `ts` falls inside the half-open interval.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Span of the range in whole minutes.
    #[must_use]
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Span of the range in whole days, rounded up.
    #[must_use]
    pub fn days(&self) -> i64 {
        self.minutes().div_euclid(1440) + i64::from(self.minutes() % 1440 != 0)
    }
}
