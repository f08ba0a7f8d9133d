//! Time-bucketed aggregation of raw records into chart points.

use std::collections::BTreeMap;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat,
    TimeDelta, Timelike, Utc,
};

use crate::normalizer::{extract_timestamp, extract_value};
use crate::types::{
    Aggregation, Granularity, MetricKind, NormalizedMetricPoint, Period, RawHealthRecord,
};

struct Bucket {
    start: DateTime<Utc>,
    sum: f64,
    count: usize,
}

/// Bucket and reduce `records` with bucket boundaries in UTC.
pub fn to_chart_points(
    records: &[RawHealthRecord],
    period: Period,
    kind: MetricKind,
) -> Vec<NormalizedMetricPoint> {
    to_chart_points_in(records, period, kind, Utc.fix())
}

/// Bucket and reduce `records` with hour/day/month boundaries taken in local
/// time at `offset`. Output is ascending by bucket start.
pub fn to_chart_points_in(
    records: &[RawHealthRecord],
    period: Period,
    kind: MetricKind,
    offset: FixedOffset,
) -> Vec<NormalizedMetricPoint> {
    if !kind.is_supported() {
        return Vec::new();
    }
    let granularity = period.granularity();

    // Keyed by local bucket start; ordering of local keys matches UTC ordering
    // under a single fixed offset.
    let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();
    for record in records {
        let Some(at) = extract_timestamp(record) else {
            continue;
        };
        let Some(value) = extract_value(record, kind) else {
            continue;
        };
        // instants whose bucket falls outside chrono's range are dropped
        let Some((key, start)) = bucket_for(at, granularity, offset) else {
            continue;
        };
        let bucket = buckets.entry(key).or_insert(Bucket {
            start,
            sum: 0.0,
            count: 0,
        });
        bucket.sum += value;
        bucket.count += 1;
    }

    buckets
        .into_iter()
        .map(|(local_start, bucket)| NormalizedMetricPoint {
            label: label_for(local_start, period),
            value: reduce(&bucket, kind),
            timestamp: Some(iso_millis(bucket.start)),
        })
        .collect()
}

/// Local bucket start and the same instant in UTC.
fn bucket_for(
    at: DateTime<Utc>,
    granularity: Granularity,
    offset: FixedOffset,
) -> Option<(NaiveDateTime, DateTime<Utc>)> {
    let shift = TimeDelta::seconds(offset.local_minus_utc().into());
    let local = at.naive_utc().checked_add_signed(shift)?;
    let start = bucket_start(local, granularity)?;
    Some((start, start.checked_sub_signed(shift)?.and_utc()))
}

fn bucket_start(local: NaiveDateTime, granularity: Granularity) -> Option<NaiveDateTime> {
    let date = local.date();
    match granularity {
        Granularity::Hour => date
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::hours(local.hour().into())),
        Granularity::Day => Some(date.and_time(NaiveTime::MIN)),
        Granularity::Month => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).map(|d| d.and_time(NaiveTime::MIN))
        }
    }
}

fn reduce(bucket: &Bucket, kind: MetricKind) -> f64 {
    match kind.aggregation() {
        Aggregation::Sum => bucket.sum,
        Aggregation::Mean => {
            let mean = bucket.sum / bucket.count as f64;
            // spo2 stays a fraction at three decimals, heart rate is whole beats
            let factor = if kind == MetricKind::Spo2 { 1000.0 } else { 1.0 };
            (mean * factor).round() / factor
        }
    }
}

fn label_for(local_start: NaiveDateTime, period: Period) -> String {
    match period {
        Period::Day => local_start.format("%H").to_string(),
        Period::Week => local_start.format("%a").to_string(),
        Period::Month => local_start.day().to_string(),
        Period::Year => local_start.format("%b").to_string(),
    }
}

fn iso_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
