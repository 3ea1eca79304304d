use chrono::offset::{LocalResult, Offset};
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use barscale_types::{Bar, BarscaleError, Exchange, Interval};

const DAY: i64 = 86_400;

/// Start of the bucket containing `ts` for the given target cadence, in the
/// exchange's local time.
///
/// - Minute/hour buckets floor local seconds-since-midnight to the step, so
///   5-minute buckets start at :00, :05, :10 local time.
/// - Daily buckets start at local midnight (the session-day boundary).
/// - Weekly buckets start at the local Monday midnight.
///
/// Around DST transitions, an ambiguous local bucket start resolves to the
/// offset of `ts` itself, which keeps the fall-back overlap hour in distinct
/// buckets; a nonexistent local time falls back to the UTC-floored bucket.
#[must_use]
pub fn bucket_start(ts: DateTime<Utc>, target: Interval, tz: Tz) -> DateTime<Utc> {
    match target {
        Interval::M1 | Interval::M5 | Interval::M15 | Interval::M30 | Interval::H1 => {
            bucket_minutes(ts, target.nominal_seconds(), tz)
        }
        Interval::D1 => bucket_day(ts, tz),
        Interval::W1 => bucket_week(ts, tz),
    }
}

fn bucket_minutes(ts: DateTime<Utc>, step: i64, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    let secs = i64::from(local.num_seconds_from_midnight());
    let bucket_sec = secs - secs.rem_euclid(step);
    let Some(midnight) = local.date_naive().and_hms_opt(0, 0, 0) else {
        return utc_floor(ts, step);
    };
    let naive = midnight + Duration::seconds(bucket_sec);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(dt1, dt2) => {
            // Pick the mapping matching the offset of ts so the fall-back
            // overlap hour stays in two distinct buckets.
            let local_offset = local.offset().fix().local_minus_utc();
            if dt1.offset().fix().local_minus_utc() == local_offset {
                dt1.with_timezone(&Utc)
            } else {
                dt2.with_timezone(&Utc)
            }
        }
        LocalResult::None => utc_floor(ts, step),
    }
}

fn bucket_day(ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    local_midnight(ts, local.date_naive(), tz)
}

fn bucket_week(ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    let date = local.date_naive();
    let back = i64::from(local.weekday().num_days_from_monday());
    let monday = date
        .checked_sub_signed(Duration::days(back))
        .unwrap_or(date);
    local_midnight(ts, monday, tz)
}

fn local_midnight(ts: DateTime<Utc>, date: chrono::NaiveDate, tz: Tz) -> DateTime<Utc> {
    let Some(naive) = date.and_hms_opt(0, 0, 0) else {
        return utc_floor(ts, DAY);
    };
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(dt1, _) => dt1.with_timezone(&Utc),
        LocalResult::None => utc_floor(ts, DAY),
    }
}

fn utc_floor(ts: DateTime<Utc>, step: i64) -> DateTime<Utc> {
    let floored = ts.timestamp() - ts.timestamp().rem_euclid(step);
    DateTime::from_timestamp(floored, 0).unwrap_or(ts)
}

struct BucketAcc {
    start: DateTime<Utc>,
    open: rust_decimal::Decimal,
    high: rust_decimal::Decimal,
    low: rust_decimal::Decimal,
    close: rust_decimal::Decimal,
    volume: u128,
}

impl BucketAcc {
    fn begin(start: DateTime<Utc>, bar: &Bar) -> Self {
        Self {
            start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: u128::from(bar.volume),
        }
    }

    fn absorb(&mut self, bar: &Bar) {
        if bar.high > self.high {
            self.high = bar.high;
        }
        if bar.low < self.low {
            self.low = bar.low;
        }
        self.close = bar.close;
        self.volume += u128::from(bar.volume);
    }

    fn finish(self) -> Result<Bar, BarscaleError> {
        let volume = u64::try_from(self.volume).map_err(|_| {
            BarscaleError::invariant(format!("bucket volume overflows u64 at {}", self.start))
        })?;
        Ok(Bar {
            ts: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume,
        })
    }
}

/// Aggregate strictly time-ordered 1-minute bars into `target`-cadence bars
/// aligned to the exchange's local session boundaries.
///
/// One linear pass: open = first bar's open, high = max, low = min,
/// close = last bar's close, volume = sum, bucket timestamp = bucket start.
/// Buckets with no source bars are omitted; no synthetic bars are produced.
/// A trailing partial bucket is emitted and may be revised once more minute
/// data lands in that bucket.
///
/// # Errors
/// Returns `BarscaleError::MalformedInput` when the input is not strictly
/// increasing in time. Ordering is the validator's job; this is a backstop,
/// not a repair.
pub fn resample_bars(
    bars: &[Bar],
    target: Interval,
    exchange: &Exchange,
) -> Result<Vec<Bar>, BarscaleError> {
    if target == Interval::M1 {
        // Identity cadence: nothing to aggregate.
        return Ok(bars.to_vec());
    }
    let tz = exchange.timezone();

    let mut iter = bars.iter();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let mut prev_ts = first.ts;
    let mut acc = BucketAcc::begin(bucket_start(first.ts, target, tz), first);

    for bar in iter {
        if bar.ts <= prev_ts {
            return Err(BarscaleError::malformed(format!(
                "bars not strictly time-ordered: {} follows {}",
                bar.ts, prev_ts
            )));
        }
        prev_ts = bar.ts;

        let bucket = bucket_start(bar.ts, target, tz);
        if bucket == acc.start {
            acc.absorb(bar);
        } else {
            out.push(acc.finish()?);
            acc = BucketAcc::begin(bucket, bar);
        }
    }
    out.push(acc.finish()?);

    Ok(out)
}
