//! NTP clock: background network time synchronization
//! 
//! This library queries an NTP server in the background and exposes a clock
//! that, once a reply has been applied, advances the server time with the
//! local monotonic clock. Until then it falls back to the local wall clock.
//!
//! ```no_run
//! use ntp_clock::{TimeSyncConfig, TimeSyncService};
//!
//! #[tokio::main]
//! async fn main() -> ntp_clock::Result<()> {
//!     let service = TimeSyncService::new(TimeSyncConfig::default())?;
//!     service.start();
//!
//!     let clock = service.handle();
//!     clock.wait_synchronized().await?;
//!     println!("{}", clock.now());
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod network;
pub mod protocol;
pub mod sync;
pub mod time;
pub mod util;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use crate::core::{Error, Result, TimeSyncConfig};
pub use crate::sync::{Anchor, SyncHandle, SyncState, SyncStats, TimeSyncService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
