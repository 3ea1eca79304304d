use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use barscale_types::{Bar, Exchange, Interval};

use crate::aggregate::bucket_start;

/// One point of a derived indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPoint {
    /// Timestamp the value belongs to (source bar or bucket start).
    pub ts: DateTime<Utc>,
    /// Indicator value.
    pub value: Decimal,
}

/// A price-series indicator.
///
/// The engine supports two strategies per call: compute on raw minute bars
/// and resample the resulting series, or compute on already-resampled bars.
/// Implementations stay agnostic of which one is in effect.
pub trait Indicator: Send + Sync {
    /// Short identifier, e.g. `"sma(20)"`.
    fn name(&self) -> String;

    /// Compute the series over time-ordered bars. Implementations may emit
    /// fewer points than bars (warm-up periods).
    fn compute(&self, bars: &[Bar]) -> Vec<IndicatorPoint>;
}

/// Simple moving average of closes.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// A simple moving average over `period` bars; `period` is clamped to at
    /// least 1.
    #[must_use]
    pub const fn new(period: usize) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> String {
        format!("sma({})", self.period)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<IndicatorPoint> {
        if bars.len() < self.period {
            return Vec::new();
        }
        let divisor = Decimal::from(self.period as u64);
        let mut window_sum: Decimal = bars[..self.period].iter().map(|b| b.close).sum();
        let mut out = Vec::with_capacity(bars.len() - self.period + 1);
        out.push(IndicatorPoint {
            ts: bars[self.period - 1].ts,
            value: window_sum / divisor,
        });
        for i in self.period..bars.len() {
            window_sum += bars[i].close - bars[i - self.period].close;
            out.push(IndicatorPoint {
                ts: bars[i].ts,
                value: window_sum / divisor,
            });
        }
        out
    }
}

/// Resample a time-ordered indicator series to a coarser cadence by taking
/// the last value in each bucket, stamped at the bucket start.
///
/// This is the `IndicatorMode::OnSource` half: the indicator ran on minute
/// bars and the series itself is bucketed.
#[must_use]
pub fn resample_points(
    points: &[IndicatorPoint],
    target: Interval,
    exchange: &Exchange,
) -> Vec<IndicatorPoint> {
    let tz = exchange.timezone();
    let mut out: Vec<IndicatorPoint> = Vec::new();
    for point in points {
        let bucket = bucket_start(point.ts, target, tz);
        match out.last_mut() {
            Some(last) if last.ts == bucket => last.value = point.value,
            _ => out.push(IndicatorPoint {
                ts: bucket,
                value: point.value,
            }),
        }
    }
    out
}
