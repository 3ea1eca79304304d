//! Configuration surface consumed from application settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Interval;

/// Validation policy for malformed source bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Strictness {
    /// Abort the request on the first violating bar.
    #[default]
    Strict,
    /// Exclude violating bars, log them, and continue with the remainder.
    ExcludeAndContinue,
}

/// Where indicator series are computed relative to resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndicatorMode {
    /// Resample the OHLCV first, then compute the indicator on the output.
    #[default]
    OnResampled,
    /// Compute the indicator on raw minute bars, then resample the
    /// indicator series (last value per bucket).
    OnSource,
}

/// Bounds and TTLs for the resample cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for intraday targets (5m through 1h).
    pub intraday_ttl: Duration,
    /// TTL for daily and weekly targets.
    pub daily_ttl: Duration,
    /// Maximum number of cached entries.
    pub max_entries: usize,
    /// Maximum total estimated bytes across all entries.
    pub max_bytes: usize,
}

impl CacheConfig {
    /// TTL class for a target interval.
    #[must_use]
    pub const fn ttl_for(&self, target: Interval) -> Duration {
        if target.is_intraday() {
            self.intraday_ttl
        } else {
            self.daily_ttl
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            intraday_ttl: Duration::from_secs(15 * 60),
            daily_ttl: Duration::from_secs(60 * 60),
            max_entries: 256,
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Global configuration for the resample engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master switch; when off every resample request is rejected.
    pub enabled: bool,
    /// Cache bounds and TTLs.
    pub cache: CacheConfig,
    /// Estimated source-bar count above which a request runs as a chunked
    /// background task instead of completing synchronously.
    pub chunk_threshold: usize,
    /// How long terminal tasks stay queryable before being reaped.
    pub task_retention: Duration,
    /// Validation policy for malformed source bars.
    pub strictness: Strictness,
    /// Default indicator computation mode; callers may override per call.
    pub indicator_mode: IndicatorMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache: CacheConfig::default(),
            chunk_threshold: 10_000,
            task_retention: Duration::from_secs(5 * 60),
            strictness: Strictness::default(),
            indicator_mode: IndicatorMode::default(),
        }
    }
}
