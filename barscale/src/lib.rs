//! Barscale derives coarser OHLCV series from stored 1-minute bars, on
//! demand.
//!
//! Overview
//! - Aggregates 1m bars to 5m/15m/30m/1h/1d/1w using exchange-local bucket
//!   boundaries (daily buckets start at the exchange's local midnight,
//!   weekly buckets on its local Monday).
//! - Validates source bars before aggregation and re-verifies the output:
//!   OHLC consistency, strict time ordering, and exact volume conservation.
//! - Serves small ranges synchronously; large ranges run as chunked
//!   background tasks with 0-100 progress and cooperative cancellation.
//!   Identical in-flight requests coalesce onto one task.
//! - Caches results per request key with LRU and TTL bounds (intraday and
//!   daily TTL classes); new base data invalidates a symbol's entries.
//!
//! Key behaviors and trade-offs
//! - Chunk boundaries always land on target bucket starts, so chunked and
//!   unchunked execution produce byte-identical output; chunking is purely
//!   a memory and progress concern.
//! - Gaps in the source are preserved: buckets with no bars are omitted,
//!   never fabricated, and a trailing partial bucket is emitted as-is.
//! - Cancellation is cooperative at chunk boundaries; a cancelled run
//!   writes nothing to the cache.
//! - An entry larger than the whole cache budget is served uncached rather
//!   than evicting everything else.
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use barscale::{ResampleEngine, ResampleOutcome};
//! use barscale_types::{EngineConfig, Exchange, Interval, ResampleRequest, TimeRange};
//!
//! let engine = ResampleEngine::new(Arc::new(my_bar_source), EngineConfig::default());
//! let req = ResampleRequest::new("AAPL", Exchange::Nyse, Interval::M15, range)?;
//! match engine.resample(req).await? {
//!     ResampleOutcome::Complete(bars) => { /* small range, done */ }
//!     ResampleOutcome::Queued(id) => {
//!         // poll engine.task_status(&id) until terminal
//!     }
//! }
//! ```
#![warn(missing_docs)]

mod engine;
mod task;

pub use engine::{ResampleEngine, ResampleOutcome};
pub use task::{TaskId, TaskState, TaskStatus};

// Re-export the building blocks so most callers need only this crate.
pub use barscale_cache::{CacheEntry, CacheManager};
pub use barscale_core::{
    BarSource, Indicator, IndicatorPoint, PrecheckReport, Sma, SourceData, ViolationKind,
};
pub use barscale_types::{
    Bar, BarscaleError, CacheConfig, EngineConfig, Exchange, IndicatorMode, Interval,
    ResampleKey, ResampleRequest, Strictness, TimeRange,
};
