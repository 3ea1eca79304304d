//! barscale-core
//!
//! The pure resampling pipeline shared across the barscale workspace.
//!
//! - `source`: the `BarSource` adapter trait over the external minute-bar
//!   storage layer.
//! - `validate`: pre/post validation of bar sequences.
//! - `aggregate`: bucket-aligned OHLCV aggregation to coarser cadences.
//! - `chunk`: bucket-aligned range splitting for bounded, progress-reporting
//!   execution.
//! - `indicator`: indicator series and their two resampling strategies.
//!
//! Nothing in this crate holds shared mutable state; caching and task
//! supervision live in `barscale-cache` and `barscale`.
#![warn(missing_docs)]

/// Bucket-aligned OHLCV aggregation.
pub mod aggregate;
/// Range splitting and progress math for chunked execution.
pub mod chunk;
/// Indicator series and resampling strategies.
pub mod indicator;
/// The adapter boundary to the external minute-bar store.
pub mod source;
/// Pre- and post-aggregation validation.
pub mod validate;

pub use aggregate::{bucket_start, resample_bars};
pub use chunk::{plan_chunks, progress_after};
pub use indicator::{Indicator, IndicatorPoint, Sma, resample_points};
pub use source::{BarSource, SourceData};
pub use validate::{BarViolation, PrecheckReport, ViolationKind, postcheck, precheck};
