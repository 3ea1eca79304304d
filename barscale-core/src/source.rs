use async_trait::async_trait;
use barscale_types::{Bar, BarscaleError, Exchange, TimeRange};

/// Result of a minute-bar fetch.
///
/// `NoData` means the store has nothing at all for this symbol/exchange and
/// is distinct from `Bars(vec![])`, which means the range is known but no
/// bars fell inside it (a gap). Callers that need a single answer for "can
/// this range be resampled" should treat both as no base data; chunked
/// execution must not, because an empty chunk is just a gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceData {
    /// Bars sorted by timestamp; gaps are allowed.
    Bars(Vec<Bar>),
    /// The store has no data for this symbol/exchange.
    NoData,
}

impl SourceData {
    /// Flatten to a bar vector; `NoData` becomes empty.
    #[must_use]
    pub fn into_bars(self) -> Vec<Bar> {
        match self {
            Self::Bars(bars) => bars,
            Self::NoData => Vec::new(),
        }
    }

    /// Whether the store reported a hard "no data" condition.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// Focused role trait over the external per-symbol/exchange minute-bar
/// storage layer.
///
/// Implementations must return bars already sorted by timestamp and may
/// return fewer bars than the range implies. The engine assumes nothing
/// about how bars are physically stored.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch 1-minute bars for `symbol` on `exchange` within `range`.
    ///
    /// # Errors
    /// Returns `BarscaleError::AdapterUnavailable` on I/O failure reaching
    /// the store. "No data" is not an error; see [`SourceData::NoData`].
    async fn fetch_minute_bars(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: TimeRange,
    ) -> Result<SourceData, BarscaleError>;
}
