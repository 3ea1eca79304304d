//! Deterministic [`BarSource`] for tests and examples.
//!
//! Minute bars are synthesized from the symbol and the timestamp alone, so
//! the same request always yields the same data with no I/O. Two symbol
//! names are reserved: `"FAIL"` forces an adapter error and `"EMPTY"` always
//! reports no data. Gaps and artificial latency are configurable per
//! instance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;

use barscale_core::{BarSource, SourceData};
use barscale_types::{Bar, BarscaleError, Exchange, TimeRange};

/// In-memory minute-bar source with deterministic synthetic data.
pub struct MockBarSource {
    gaps: Vec<(String, TimeRange)>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl Default for MockBarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBarSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gaps: Vec::new(),
            latency: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Suppress all bars for `symbol` inside `range`, simulating a halt or
    /// a missing session.
    #[must_use]
    pub fn with_gap(mut self, symbol: impl Into<String>, range: TimeRange) -> Self {
        self.gaps.push((symbol.into(), range));
        self
    }

    /// Sleep this long on every fetch, so tests can observe tasks while
    /// they are still running.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `fetch_minute_bars` calls served so far, including failed
    /// ones. Used to assert cache hits and request coalescing.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn in_gap(&self, symbol: &str, ts: chrono::DateTime<chrono::Utc>) -> bool {
        self.gaps
            .iter()
            .any(|(s, range)| s == symbol && range.contains(ts))
    }

    fn bar_for(symbol: &str, ts: chrono::DateTime<chrono::Utc>) -> Bar {
        // Cheap symbol fingerprint keeps different symbols distinguishable.
        let seed = symbol.bytes().map(i64::from).sum::<i64>();
        let minute = ts.timestamp() / 60;
        let base = 10_000 + (seed % 400) * 25 + (minute % 7) * 30;
        Bar {
            ts,
            open: Decimal::new(base, 2),
            high: Decimal::new(base + 120, 2),
            low: Decimal::new(base - 80, 2),
            close: Decimal::new(base + 40, 2),
            volume: 100 + (minute % 13) as u64 * 10,
        }
    }
}

#[async_trait]
impl BarSource for MockBarSource {
    async fn fetch_minute_bars(
        &self,
        symbol: &str,
        _exchange: &Exchange,
        range: TimeRange,
    ) -> Result<SourceData, BarscaleError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match symbol {
            "FAIL" => {
                return Err(BarscaleError::adapter("barscale-mock: forced failure"));
            }
            "EMPTY" => return Ok(SourceData::NoData),
            _ => {}
        }

        let mut bars = Vec::with_capacity(usize::try_from(range.minutes()).unwrap_or(0));
        let mut ts = range.start;
        while ts < range.end {
            if !self.in_gap(symbol, ts) {
                bars.push(Self::bar_for(symbol, ts));
            }
            ts += ChronoDuration::minutes(1);
        }
        if bars.is_empty() {
            return Ok(SourceData::NoData);
        }
        Ok(SourceData::Bars(bars))
    }
}
