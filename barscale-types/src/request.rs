use serde::{Deserialize, Serialize};

use crate::{BarscaleError, Exchange, Interval, TimeRange};

/// An immutable request to derive `target`-cadence bars from 1-minute data.
///
/// Identity is the full field tuple; two requests with the same fields are
/// the same request and share a cache slot and an in-flight task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResampleRequest {
    symbol: String,
    exchange: Exchange,
    target: Interval,
    range: TimeRange,
}

impl ResampleRequest {
    /// Build a request. The source cadence is always 1 minute, so `target`
    /// must be strictly coarser.
    ///
    /// # Errors
    /// Returns `BarscaleError::InvalidArg` when `target` is `Interval::M1`.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        target: Interval,
        range: TimeRange,
    ) -> Result<Self, BarscaleError> {
        if target == Interval::M1 {
            return Err(BarscaleError::invalid_arg(
                "target interval must be coarser than the 1m source cadence",
            ));
        }
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(BarscaleError::invalid_arg("symbol must not be empty"));
        }
        Ok(Self {
            symbol,
            exchange,
            target,
            range,
        })
    }

    /// Requested symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Requested exchange.
    #[must_use]
    pub const fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Target cadence.
    #[must_use]
    pub const fn target(&self) -> Interval {
        self.target
    }

    /// Requested time range.
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        self.range
    }

    /// Upper bound on the number of source bars the range can contain; used
    /// to pick the synchronous fast path vs. a background task.
    #[must_use]
    pub fn estimated_source_bars(&self) -> i64 {
        self.range.minutes()
    }

    /// Deterministic cache key for this request.
    #[must_use]
    pub fn key(&self) -> ResampleKey {
        ResampleKey {
            symbol: self.symbol.clone(),
            exchange: self.exchange.clone(),
            target: self.target,
            start: self.range.start.timestamp(),
            end: self.range.end.timestamp(),
        }
    }
}

/// Canonical cache index for a [`ResampleRequest`].
///
/// Ranges are keyed by their exact boundaries: overlapping but non-identical
/// ranges are distinct keys. No partial-range merging happens at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResampleKey {
    symbol: String,
    exchange: Exchange,
    target: Interval,
    start: i64,
    end: i64,
}

impl ResampleKey {
    /// Symbol component, for symbol/exchange-wide invalidation.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Exchange component, for symbol/exchange-wide invalidation.
    #[must_use]
    pub const fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Target interval, which selects the TTL class for the cached entry.
    #[must_use]
    pub const fn target(&self) -> Interval {
        self.target
    }
}
