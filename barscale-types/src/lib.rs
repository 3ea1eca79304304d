//! Barscale-specific data transfer objects and configuration primitives.
//!
//! Everything here is a plain value type: bars, time ranges, intervals,
//! resample requests/keys, the engine configuration, and the workspace
//! error enum. No I/O, no async, no shared state.
#![warn(missing_docs)]

mod bar;
mod config;
mod error;
mod interval;
mod request;

pub use bar::{Bar, TimeRange};
pub use config::{CacheConfig, EngineConfig, IndicatorMode, Strictness};
pub use error::BarscaleError;
pub use interval::{Exchange, Interval};
pub use request::{ResampleKey, ResampleRequest};
