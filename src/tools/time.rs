//! Timestamps, date formatting and sleeping.

use std::{ops::RangeInclusive, thread, time::Duration};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::Rng;

use crate::error::{MagicError, Result};

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats tried in order by [`to_timestamp`] when no format is given.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d%H%M%S",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

pub fn timestamp() -> i64 {
    Utc::now().timestamp()
}

pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn timestamp_us() -> i64 {
    Utc::now().timestamp_micros()
}

pub fn timestamp_f64() -> f64 {
    timestamp_us() as f64 / 1_000_000.0
}

/// Current local time, e.g. `now_string(DEFAULT_FORMAT)`.
pub fn now_string(fmt: &str) -> String {
    Local::now().format(fmt).to_string()
}

/// Current local time as digits only: `20261019143005`.
pub fn date_number() -> String {
    now_string("%Y%m%d%H%M%S")
}

/// Format a unix timestamp (seconds) in local time.
pub fn format_timestamp(secs: i64, fmt: &str) -> Result<String> {
    let dt: DateTime<Local> = Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| MagicError::time(format!("timestamp out of range: {secs}")))?;
    Ok(dt.format(fmt).to_string())
}

/// Parse local time text into a unix timestamp (seconds).
///
/// With `fmt = None` the text may be RFC 3339 (offset respected) or one of a
/// handful of common layouts.
pub fn to_timestamp(text: &str, fmt: Option<&str>) -> Result<i64> {
    let text = text.trim();
    if let Some(fmt) = fmt {
        let naive = match NaiveDateTime::parse_from_str(text, fmt) {
            Ok(naive) => naive,
            Err(e) => NaiveDate::parse_from_str(text, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .ok_or_else(|| MagicError::time(format!("{text:?} does not match {fmt:?}: {e}")))?,
        };
        return local_timestamp(naive);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp());
    }
    for fmt in FALLBACK_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return local_timestamp(naive);
        }
    }
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return local_timestamp(naive);
            }
        }
    }
    Err(MagicError::time(format!("unrecognised time: {text:?}")))
}

fn local_timestamp(naive: NaiveDateTime) -> Result<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| MagicError::time(format!("{naive} does not exist in the local time zone")))
}

/// Negative or non-finite values do not sleep.
pub fn sleep_secs(secs: f64) {
    if let Ok(wait) = Duration::try_from_secs_f64(secs) {
        thread::sleep(wait);
    }
}

/// Sleep a random number of seconds (fractional) within `range`.
pub fn sleep_random(range: RangeInclusive<f64>) -> Duration {
    let secs = if range.start() < range.end() {
        rand::thread_rng().gen_range(range)
    } else {
        *range.start()
    };
    let wait = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
    thread::sleep(wait);
    wait
}

/// Sleep a random whole number of seconds within `range`.
pub fn sleep_random_int(range: RangeInclusive<u64>) -> Duration {
    let secs = if range.start() < range.end() {
        rand::thread_rng().gen_range(range)
    } else {
        *range.start()
    };
    let wait = Duration::from_secs(secs);
    thread::sleep(wait);
    wait
}
