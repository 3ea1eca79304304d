use thiserror::Error;

/// Unified error type for the barscale workspace.
///
/// Wraps adapter failures, validation problems, aggregation defects, cache
/// pressure, and task lifecycle conditions. `Cancelled` is a terminal state
/// rather than a fault, but travels the same channel.
#[derive(Debug, Clone, Error)]
pub enum BarscaleError {
    /// The bar source returned nothing for the requested range.
    #[error("no base data for {symbol} on {exchange} in the requested range")]
    NoBaseData {
        /// Symbol the request was for.
        symbol: String,
        /// Exchange code the request was for.
        exchange: String,
    },

    /// Source bars violate ordering or OHLC invariants.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Aggregation output failed the post-check; an internal defect.
    #[error("aggregation invariant violated: {0}")]
    InvariantViolation(String),

    /// A computed entry is larger than the entire cache budget.
    #[error("cache overflow: entry of {size} bytes exceeds budget of {budget} bytes")]
    CacheOverflow {
        /// Estimated size of the rejected entry.
        size: usize,
        /// Configured total byte budget.
        budget: usize,
    },

    /// The task observed a cancellation request at a checkpoint.
    #[error("task cancelled")]
    Cancelled,

    /// I/O failure reaching the bar source; retryable by the caller.
    #[error("bar source unavailable: {0}")]
    AdapterUnavailable(String),

    /// Invalid request argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// No task with this id exists (never created, or already reaped).
    #[error("unknown task: {id}")]
    UnknownTask {
        /// The id that failed to resolve.
        id: String,
    },

    /// Resampling is switched off in the engine configuration.
    #[error("resampling is disabled")]
    Disabled,
}

impl BarscaleError {
    /// Helper: build a `NoBaseData` error.
    pub fn no_base_data(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self::NoBaseData {
            symbol: symbol.into(),
            exchange: exchange.into(),
        }
    }

    /// Helper: build a `MalformedInput` error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Helper: build an `InvariantViolation` error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Helper: build an `AdapterUnavailable` error.
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::AdapterUnavailable(msg.into())
    }

    /// Helper: build an `InvalidArg` error.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }

    /// Helper: build an `UnknownTask` error.
    pub fn unknown_task(id: impl Into<String>) -> Self {
        Self::UnknownTask { id: id.into() }
    }

    /// Stable machine-readable kind label, for structured task status.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoBaseData { .. } => "no_base_data",
            Self::MalformedInput(_) => "malformed_input",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::CacheOverflow { .. } => "cache_overflow",
            Self::Cancelled => "cancelled",
            Self::AdapterUnavailable(_) => "adapter_unavailable",
            Self::InvalidArg(_) => "invalid_arg",
            Self::UnknownTask { .. } => "unknown_task",
            Self::Disabled => "disabled",
        }
    }
}
