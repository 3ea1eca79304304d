use barscale_core::{ViolationKind, postcheck, precheck, resample_bars};
use barscale_types::{Bar, BarscaleError, Exchange, Interval, Strictness, TimeRange};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

fn t(min: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(min * 60, 0).unwrap()
}

fn d(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn good(min: i64) -> Bar {
    Bar {
        ts: t(min),
        open: d(10),
        high: d(12),
        low: d(9),
        close: d(11),
        volume: 5,
    }
}

fn range(a: i64, b: i64) -> TimeRange {
    TimeRange::new(t(a), t(b)).unwrap()
}

#[test]
fn clean_input_passes_with_no_violations() {
    let bars = vec![good(0), good(1), good(2)];
    let report = precheck(&bars, range(0, 10), Strictness::Strict).unwrap();
    assert_eq!(report.accepted.len(), 3);
    assert!(report.violations.is_empty());
}

#[test]
fn strict_aborts_on_first_violation() {
    let mut bad = good(1);
    bad.high = d(5); // high below open/close
    let bars = vec![good(0), bad, good(2)];
    let err = precheck(&bars, range(0, 10), Strictness::Strict).unwrap_err();
    assert!(matches!(err, BarscaleError::MalformedInput(_)));
}

#[test]
fn lenient_excludes_and_reports() {
    let mut inconsistent = good(1);
    inconsistent.low = d(20);
    let out_of_range = good(50);
    let bars = vec![good(0), inconsistent, good(2), out_of_range];
    let report = precheck(&bars, range(0, 10), Strictness::ExcludeAndContinue).unwrap();
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.violations.len(), 2);
    assert_eq!(report.violations[0].kind, ViolationKind::InconsistentOhlc);
    assert_eq!(report.violations[1].kind, ViolationKind::OutOfRange);
}

#[test]
fn lenient_flags_out_of_order_bars() {
    let bars = vec![good(2), good(1), good(3)];
    let report = precheck(&bars, range(0, 10), Strictness::ExcludeAndContinue).unwrap();
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.violations[0].kind, ViolationKind::OutOfOrder);
    assert_eq!(report.violations[0].index, 1);
}

#[test]
fn postcheck_accepts_true_aggregation() {
    let bars: Vec<Bar> = (0..10).map(good).collect();
    let out = resample_bars(&bars, Interval::M5, &Exchange::Nyse).unwrap();
    postcheck(&bars, &out).unwrap();
}

#[test]
fn postcheck_rejects_volume_loss() {
    let input = vec![good(0), good(1)];
    let mut out = resample_bars(&input, Interval::M5, &Exchange::Nyse).unwrap();
    out[0].volume -= 1;
    let err = postcheck(&input, &out).unwrap_err();
    assert!(matches!(err, BarscaleError::InvariantViolation(_)));
}

#[test]
fn postcheck_rejects_inconsistent_output() {
    let input = vec![good(0)];
    let mut out = resample_bars(&input, Interval::M5, &Exchange::Nyse).unwrap();
    out[0].high = d(1);
    assert!(postcheck(&input, &out).is_err());
}

#[test]
fn postcheck_rejects_unordered_output() {
    let input: Vec<Bar> = (0..10).map(good).collect();
    let mut out = resample_bars(&input, Interval::M5, &Exchange::Nyse).unwrap();
    out.swap(0, 1);
    assert!(postcheck(&input, &out).is_err());
}
