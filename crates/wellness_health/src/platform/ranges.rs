//! Query windows, computed in the device's local time.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::types::{Period, TimeRange};

/// Convert a local wall-clock time under `offset` to UTC.
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    (local - TimeDelta::seconds(offset.local_minus_utc().into())).and_utc()
}

/// Local midnight at the start of `now`'s day.
pub fn start_of_day(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    local_to_utc(midnight, *now.offset())
}

/// Last millisecond of `now`'s local day.
pub fn end_of_day(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    start_of_day(now) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

/// Local midnight through 23:59:59.999 local.
pub fn today(now: DateTime<FixedOffset>) -> TimeRange {
    TimeRange::new(start_of_day(now), end_of_day(now))
}

/// The `days` days ending now.
pub fn last_days(now: DateTime<FixedOffset>, days: i64) -> TimeRange {
    let end = now.with_timezone(&Utc);
    TimeRange::new(end - TimeDelta::days(days), end)
}

pub fn weekly(now: DateTime<FixedOffset>) -> TimeRange {
    last_days(now, 7)
}

/// Today's window widened back to 8pm the previous evening, so sessions that
/// begin before midnight are included.
pub fn sleep_window(now: DateTime<FixedOffset>) -> TimeRange {
    TimeRange::new(start_of_day(now) - TimeDelta::hours(4), end_of_day(now))
}

/// Fetch window for a chart query: `Day` is local midnight to now, the other
/// periods look back a fixed number of days from now.
pub fn for_period(period: Period, now: DateTime<FixedOffset>) -> TimeRange {
    match period.lookback_days() {
        None => TimeRange::new(start_of_day(now), now.with_timezone(&Utc)),
        Some(days) => last_days(now, days),
    }
}
