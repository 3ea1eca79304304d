use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BarscaleError, TimeRange};

/// Supported bar cadences.
///
/// `M1` is the source cadence; everything coarser is a resample target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1 minute (source data cadence).
    #[serde(rename = "1m")]
    M1,
    /// 5 minutes.
    #[serde(rename = "5m")]
    M5,
    /// 15 minutes.
    #[serde(rename = "15m")]
    M15,
    /// 30 minutes.
    #[serde(rename = "30m")]
    M30,
    /// 1 hour.
    #[serde(rename = "1h")]
    H1,
    /// 1 trading day, aligned to the exchange session start.
    #[serde(rename = "1d")]
    D1,
    /// 1 trading week, anchored to the exchange's Monday.
    #[serde(rename = "1w")]
    W1,
}

impl Interval {
    /// Nominal bucket span in seconds. Daily and weekly buckets stretch
    /// across DST transitions, so for those this is an estimate only.
    #[must_use]
    pub const fn nominal_seconds(self) -> i64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
            Self::D1 => 86_400,
            Self::W1 => 7 * 86_400,
        }
    }

    /// Sub-daily intervals carry the short cache TTL.
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        matches!(self, Self::M1 | Self::M5 | Self::M15 | Self::M30 | Self::H1)
    }

    /// Canonical string form, matching the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::D1 => "1d",
            Self::W1 => "1w",
        }
    }

    /// The standard resample targets derivable from 1-minute data.
    #[must_use]
    pub const fn standard_targets() -> &'static [Self] {
        &[Self::M5, Self::M15, Self::M30, Self::H1, Self::D1]
    }

    /// Targets that render well for a given range length: intraday cadences
    /// for short ranges, daily for long ones.
    #[must_use]
    pub fn recommended_for(range: &TimeRange) -> &'static [Self] {
        match range.days() {
            0..=1 => &[Self::M5, Self::M15, Self::M30, Self::H1],
            2..=7 => &[Self::M15, Self::M30, Self::H1, Self::D1],
            8..=30 => &[Self::H1, Self::D1],
            _ => &[Self::D1],
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = BarscaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "1d" => Ok(Self::D1),
            "1w" => Ok(Self::W1),
            other => Err(BarscaleError::invalid_arg(format!(
                "unsupported interval '{other}' (supported: 1m, 5m, 15m, 30m, 1h, 1d, 1w)"
            ))),
        }
    }
}

/// Exchange identity, used for cache keying and session timezone lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Exchange {
    /// National Stock Exchange of India.
    Nse,
    /// Bombay Stock Exchange.
    Bse,
    /// New York Stock Exchange.
    Nyse,
    /// Nasdaq.
    Nasdaq,
    /// London Stock Exchange.
    Lse,
    /// Tokyo Stock Exchange.
    Tse,
    /// Any other exchange code; sessions are treated as UTC-aligned.
    Other(String),
}

impl Exchange {
    /// IANA timezone governing this exchange's session boundaries.
    #[must_use]
    pub fn timezone(&self) -> chrono_tz::Tz {
        match self {
            Self::Nse | Self::Bse => chrono_tz::Asia::Kolkata,
            Self::Nyse | Self::Nasdaq => chrono_tz::America::New_York,
            Self::Lse => chrono_tz::Europe::London,
            Self::Tse => chrono_tz::Asia::Tokyo,
            Self::Other(_) => chrono_tz::UTC,
        }
    }

    /// Canonical uppercase code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
            Self::Nyse => "NYSE",
            Self::Nasdaq => "NASDAQ",
            Self::Lse => "LSE",
            Self::Tse => "TSE",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for Exchange {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "NSE" => Self::Nse,
            "BSE" => Self::Bse,
            "NYSE" => Self::Nyse,
            "NASDAQ" => Self::Nasdaq,
            "LSE" => Self::Lse,
            "TSE" => Self::Tse,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&str> for Exchange {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Exchange> for String {
    fn from(e: Exchange) -> Self {
        e.code().to_string()
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
