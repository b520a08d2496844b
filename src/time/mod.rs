//! Time sources and NTP timestamp conversion
//! 
//! The synchronized clock needs two things from the host: a monotonic clock
//! to extrapolate from the last NTP sample, and the local wall clock to fall
//! back on before any sample exists. Both live behind the [`Clock`] trait so
//! tests can drive time by hand.

mod clock;
mod epoch;

pub use self::clock::{Clock, SystemClock};
pub use self::epoch::{ntp_epoch, ntp_millis, ntp_to_local, ntp_to_utc, NTP_UNIX_OFFSET_SECS};

#[cfg(test)]
pub(crate) use self::clock::manual::ManualClock;
