//! Synchronization module
//! 
//! This module owns the synchronization lifecycle: the retry loop, the
//! per-attempt request and the published clock state.

mod attempt;
mod handle;
mod service;
mod state;

pub use self::handle::SyncHandle;
pub use self::service::{TimeSyncService, TimeSyncServiceBuilder};
pub use self::state::{Anchor, SyncState, SyncStats};
