use chrono::{DateTime, Local, TimeZone, Utc};

use crate::core::{Error, Result};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const NTP_UNIX_OFFSET_SECS: i64 = 2_208_988_800;

/// Milliseconds since the NTP epoch for an NTP seconds/fraction pair.
///
/// The fraction is scaled with truncating integer division, so the result is
/// exactly `seconds * 1000 + fraction * 1000 / 2^32`.
pub fn ntp_millis(seconds: u32, fraction: u32) -> u64 {
    u64::from(seconds) * 1000 + ((u64::from(fraction) * 1000) >> 32)
}

/// The NTP epoch, 1900-01-01T00:00:00 UTC
pub fn ntp_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(-NTP_UNIX_OFFSET_SECS, 0)
        .single()
        .unwrap_or_default()
}

/// Converts an NTP seconds/fraction pair to a UTC timestamp
pub fn ntp_to_utc(seconds: u32, fraction: u32) -> Result<DateTime<Utc>> {
    let unix_millis = ntp_millis(seconds, fraction) as i64 - NTP_UNIX_OFFSET_SECS * 1000;
    Utc.timestamp_millis_opt(unix_millis)
        .single()
        .ok_or_else(|| Error::malformed(format!("Timestamp {}.{} out of range", seconds, fraction)))
}

/// Converts an NTP seconds/fraction pair to local time
pub fn ntp_to_local(seconds: u32, fraction: u32) -> Result<DateTime<Local>> {
    ntp_to_utc(seconds, fraction).map(|utc| utc.with_timezone(&Local))
}
