use chrono::Duration;

use barscale_types::{Exchange, Interval, TimeRange};

use crate::aggregate::bucket_start;

/// Split `range` into contiguous sub-ranges of roughly `threshold` source
/// minutes each, with every internal boundary landing exactly on a target
/// bucket start.
///
/// Because no bucket ever spans two chunks, aggregating chunk-by-chunk and
/// concatenating in time order produces output identical to aggregating the
/// whole range at once. Chunking is a memory/progress concern only.
///
/// A chunk grows past `threshold` when a single bucket is longer than the
/// threshold (weekly buckets against a small threshold); it is never split.
#[must_use]
pub fn plan_chunks(
    range: TimeRange,
    target: Interval,
    exchange: &Exchange,
    threshold: usize,
) -> Vec<TimeRange> {
    let step = i64::try_from(threshold.max(1)).unwrap_or(i64::MAX);
    if range.minutes() <= step {
        return vec![range];
    }
    let tz = exchange.timezone();

    let mut chunks = Vec::new();
    let mut cur = range.start;
    while cur < range.end {
        let mut probe = cur + Duration::minutes(step);
        let end = loop {
            if probe >= range.end {
                break range.end;
            }
            // Cut at the start of the bucket containing the probe point, so
            // that bucket belongs entirely to the next chunk.
            let boundary = bucket_start(probe, target, tz);
            if boundary > cur {
                break boundary;
            }
            probe += Duration::minutes(step);
        };
        chunks.push(TimeRange { start: cur, end });
        cur = end;
    }
    chunks
}

/// Progress value after `completed` of `total` chunks, as a 0-100 integer.
#[must_use]
pub fn progress_after(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = completed.saturating_mul(100) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}
