use chrono::{DateTime, Utc};

use barscale_types::{Bar, BarscaleError, Strictness, TimeRange};

/// Why a source bar was rejected by the pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Timestamp not strictly after the previous accepted bar.
    OutOfOrder,
    /// Timestamp outside the requested range.
    OutOfRange,
    /// OHLC fields are mutually inconsistent.
    InconsistentOhlc,
}

/// One rejected source bar, reported rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarViolation {
    /// Index of the bar in the input sequence.
    pub index: usize,
    /// Timestamp of the offending bar.
    pub ts: DateTime<Utc>,
    /// What went wrong.
    pub kind: ViolationKind,
}

/// Outcome of the pre-check: the bars that passed plus everything rejected.
#[derive(Debug, Clone)]
pub struct PrecheckReport {
    /// Bars accepted for aggregation, in input order.
    pub accepted: Vec<Bar>,
    /// Bars excluded under `Strictness::ExcludeAndContinue`.
    pub violations: Vec<BarViolation>,
}

/// Validate source bars before aggregation: strict time ordering, range
/// containment, and per-bar OHLC consistency.
///
/// Under `Strictness::Strict` the first violation aborts the request; under
/// `Strictness::ExcludeAndContinue` violating bars are excluded, logged, and
/// reported back to the caller.
///
/// # Errors
/// Returns `BarscaleError::MalformedInput` for the first violation when
/// strict.
pub fn precheck(
    bars: &[Bar],
    range: TimeRange,
    strictness: Strictness,
) -> Result<PrecheckReport, BarscaleError> {
    let mut accepted: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut violations = Vec::new();
    let mut last_ts: Option<DateTime<Utc>> = None;

    for (index, bar) in bars.iter().enumerate() {
        let kind = if last_ts.is_some_and(|prev| bar.ts <= prev) {
            Some(ViolationKind::OutOfOrder)
        } else if !range.contains(bar.ts) {
            Some(ViolationKind::OutOfRange)
        } else if !bar.ohlc_consistent() {
            Some(ViolationKind::InconsistentOhlc)
        } else {
            None
        };

        match kind {
            None => {
                last_ts = Some(bar.ts);
                accepted.push(*bar);
            }
            Some(kind) => {
                if strictness == Strictness::Strict {
                    return Err(BarscaleError::malformed(format!(
                        "bar {index} at {}: {}",
                        bar.ts,
                        describe(kind, bar)
                    )));
                }
                tracing::warn!(
                    index,
                    ts = %bar.ts,
                    reason = ?kind,
                    "excluding malformed source bar"
                );
                violations.push(BarViolation {
                    index,
                    ts: bar.ts,
                    kind,
                });
            }
        }
    }

    Ok(PrecheckReport {
        accepted,
        violations,
    })
}

fn describe(kind: ViolationKind, bar: &Bar) -> String {
    match kind {
        ViolationKind::OutOfOrder => "timestamp not strictly increasing".to_string(),
        ViolationKind::OutOfRange => "timestamp outside requested range".to_string(),
        ViolationKind::InconsistentOhlc => format!(
            "inconsistent OHLC (o={} h={} l={} c={})",
            bar.open, bar.high, bar.low, bar.close
        ),
    }
}

/// Re-verify aggregation output: per-bar OHLC consistency, strict ordering,
/// and exact volume conservation against the accepted input.
///
/// Volume is integral, so conservation is integer equality with no drift
/// tolerance. A failure here is an internal defect, never repaired.
///
/// # Errors
/// Returns `BarscaleError::InvariantViolation` on any failed check.
pub fn postcheck(input: &[Bar], output: &[Bar]) -> Result<(), BarscaleError> {
    let mut last_ts: Option<DateTime<Utc>> = None;
    for bar in output {
        if !bar.ohlc_consistent() {
            return Err(BarscaleError::invariant(format!(
                "output bar at {} has inconsistent OHLC (o={} h={} l={} c={})",
                bar.ts, bar.open, bar.high, bar.low, bar.close
            )));
        }
        if last_ts.is_some_and(|prev| bar.ts <= prev) {
            return Err(BarscaleError::invariant(format!(
                "output bars not strictly time-ordered at {}",
                bar.ts
            )));
        }
        last_ts = Some(bar.ts);
    }

    let in_volume: u128 = input.iter().map(|b| u128::from(b.volume)).sum();
    let out_volume: u128 = output.iter().map(|b| u128::from(b.volume)).sum();
    if in_volume != out_volume {
        return Err(BarscaleError::invariant(format!(
            "volume not conserved: source {in_volume}, aggregated {out_volume}"
        )));
    }

    Ok(())
}
