use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc};
use tracing::warn;

pub const DEFAULT_BUSINESS_OFFSET_MINUTES: i32 = -180;

/// The single fixed offset all dates and times are interpreted in.
pub fn business_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60))
        .or_else(|| {
            warn!("Business offset of {} minutes is out of range, using default", minutes);
            FixedOffset::east_opt(DEFAULT_BUSINESS_OFFSET_MINUTES * 60)
        })
        .unwrap_or_else(|| Utc.fix())
}

/// Instant of `date` at `time` in business time, truncated to the minute.
pub fn business_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
    let local = date.and_time(time);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc)
}

/// Calendar date of an instant as seen in business time.
pub fn business_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
