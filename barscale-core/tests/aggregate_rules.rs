use barscale_core::resample_bars;
use barscale_types::{Bar, Exchange, Interval};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

fn t(min: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(min * 60, 0).unwrap()
}

fn d(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn bar(min: i64, o: i64, h: i64, l: i64, c: i64, v: u64) -> Bar {
    Bar {
        ts: t(min),
        open: d(o),
        high: d(h),
        low: d(l),
        close: d(c),
        volume: v,
    }
}

fn utc_exchange() -> Exchange {
    Exchange::Other("TEST".into())
}

#[test]
fn five_minute_bucket_follows_ohlcv_rules() {
    let bars = vec![
        bar(0, 10, 12, 9, 11, 100),
        bar(1, 11, 15, 10, 14, 200),
        bar(2, 14, 14, 8, 9, 300),
        bar(3, 9, 10, 9, 10, 400),
        bar(4, 10, 11, 10, 11, 500),
    ];
    let out = resample_bars(&bars, Interval::M5, &utc_exchange()).unwrap();
    assert_eq!(out.len(), 1);
    let b = &out[0];
    assert_eq!(b.ts, t(0));
    assert_eq!(b.open, d(10));
    assert_eq!(b.high, d(15));
    assert_eq!(b.low, d(8));
    assert_eq!(b.close, d(11));
    assert_eq!(b.volume, 1_500);
}

#[test]
fn single_bar_bucket_passes_through() {
    let bars = vec![bar(7, 10, 12, 9, 11, 42)];
    let out = resample_bars(&bars, Interval::M5, &utc_exchange()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].ts, t(5));
    assert_eq!(out[0].open, d(10));
    assert_eq!(out[0].high, d(12));
    assert_eq!(out[0].low, d(9));
    assert_eq!(out[0].close, d(11));
    assert_eq!(out[0].volume, 42);
}

#[test]
fn empty_buckets_are_omitted_not_fabricated() {
    // Bars in minutes 0-4 and 10-14; the 5-9 bucket has no source bars.
    let mut bars: Vec<Bar> = (0..5).map(|i| bar(i, 10, 11, 9, 10, 1)).collect();
    bars.extend((10..15).map(|i| bar(i, 10, 11, 9, 10, 1)));
    let out = resample_bars(&bars, Interval::M5, &utc_exchange()).unwrap();
    let starts: Vec<i64> = out.iter().map(|b| b.ts.timestamp() / 60).collect();
    assert_eq!(starts, vec![0, 10]);
}

#[test]
fn trailing_partial_bucket_is_emitted() {
    // 7 minute bars: full 0-4 bucket plus a partial 5-6.
    let bars: Vec<Bar> = (0..7).map(|i| bar(i, 10, 11, 9, 10, 10)).collect();
    let out = resample_bars(&bars, Interval::M5, &utc_exchange()).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].ts, t(5));
    assert_eq!(out[1].volume, 20);
}

#[test]
fn unordered_input_is_malformed() {
    let bars = vec![bar(1, 10, 11, 9, 10, 1), bar(0, 10, 11, 9, 10, 1)];
    let err = resample_bars(&bars, Interval::M5, &utc_exchange()).unwrap_err();
    assert!(matches!(
        err,
        barscale_types::BarscaleError::MalformedInput(_)
    ));
}

#[test]
fn duplicate_timestamp_is_malformed() {
    let bars = vec![bar(0, 10, 11, 9, 10, 1), bar(0, 10, 11, 9, 10, 1)];
    assert!(resample_bars(&bars, Interval::M5, &utc_exchange()).is_err());
}

#[test]
fn volume_sums_exactly() {
    let bars: Vec<Bar> = (0..60).map(|i| bar(i, 10, 11, 9, 10, 7 + i as u64)).collect();
    let total: u64 = bars.iter().map(|b| b.volume).sum();
    let out = resample_bars(&bars, Interval::M15, &utc_exchange()).unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out.iter().map(|b| b.volume).sum::<u64>(), total);
}

#[test]
fn daily_buckets_align_to_exchange_midnight() {
    // 09:30 IST on 2024-01-02 is 04:00 UTC; the NSE session day starts at
    // local midnight, i.e. 2024-01-01 18:30 UTC.
    let session_open = Utc.with_ymd_and_hms(2024, 1, 2, 4, 0, 0).unwrap();
    let bars: Vec<Bar> = (0..3)
        .map(|i| Bar {
            ts: session_open + chrono::Duration::minutes(i),
            open: d(10),
            high: d(11),
            low: d(9),
            close: d(10),
            volume: 5,
        })
        .collect();
    let out = resample_bars(&bars, Interval::D1, &Exchange::Nse).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].ts,
        Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap()
    );
    assert_eq!(out[0].volume, 15);
}

#[test]
fn weekly_buckets_anchor_to_local_monday() {
    // 2024-01-03 is a Wednesday; the NYSE trading week began Monday
    // 2024-01-01 00:00 America/New_York = 05:00 UTC.
    let wed = Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap();
    let bars = vec![Bar {
        ts: wed,
        open: d(10),
        high: d(11),
        low: d(9),
        close: d(10),
        volume: 1,
    }];
    let out = resample_bars(&bars, Interval::W1, &Exchange::Nyse).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].ts, Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap());
}

#[test]
fn hourly_buckets_floor_local_time() {
    // 04:17 UTC on the NSE is 09:47 IST, so the hourly bucket starts at
    // 09:00 IST = 03:30 UTC.
    let ts = Utc.with_ymd_and_hms(2024, 1, 2, 4, 17, 0).unwrap();
    let bars = vec![Bar {
        ts,
        open: d(10),
        high: d(11),
        low: d(9),
        close: d(10),
        volume: 1,
    }];
    let out = resample_bars(&bars, Interval::H1, &Exchange::Nse).unwrap();
    assert_eq!(out[0].ts, Utc.with_ymd_and_hms(2024, 1, 2, 3, 30, 0).unwrap());
}

#[test]
fn empty_input_yields_empty_output() {
    let out = resample_bars(&[], Interval::M5, &utc_exchange()).unwrap();
    assert!(out.is_empty());
}
