use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

/// Lower bound for the `updatedMin` filter: `now - lookback`, rendered as RFC 3339
/// in the given timezone with whole seconds (`Z` suffix for UTC).
/// `None` when the subtraction leaves chrono's representable range.
pub fn updated_min<Tz>(now: DateTime<Utc>, lookback: Duration, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.checked_sub_signed(lookback).map(|cutoff| {
        cutoff
            .with_timezone(tz)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    })
}
