//! Core types for the NTP clock
//! 
//! This module contains the error type, configuration and protocol constants
//! shared by the rest of the library.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{Error, Result};
pub use self::types::TimeSyncConfig;

/// Default NTP server queried when none is configured
pub const DEFAULT_SERVER: &str = "time.google.com";

/// Well-known NTP port
pub const DEFAULT_PORT: u16 = 123;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Upper bound accepted for the request timeout in seconds
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 10;
