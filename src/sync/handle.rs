use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::{Error, Result};
use crate::time::Clock;
use super::state::{Anchor, SyncState};

/// Read-only view of the synchronized clock.
///
/// Handles are cheap to clone and are what consumers should hold instead of
/// the service itself.
#[derive(Clone)]
pub struct SyncHandle {
    state: watch::Receiver<SyncState>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl SyncHandle {
    pub(crate) fn new(
        state: watch::Receiver<SyncState>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        SyncHandle {
            state,
            clock,
            shutdown,
        }
    }

    /// Whether an NTP sample has been applied
    pub fn is_synchronized(&self) -> bool {
        self.state.borrow().is_synchronized()
    }

    /// Current time estimate, the local clock until synchronized
    pub fn now(&self) -> DateTime<Local> {
        self.state.borrow().now(self.clock.as_ref())
    }

    /// Latest published snapshot
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Waits until the service has applied an NTP sample.
    ///
    /// Fails with [`Error::Cancelled`] if the service is shut down or
    /// dropped first.
    pub async fn wait_synchronized(&self) -> Result<Anchor> {
        let mut state = self.state.clone();

        tokio::select! {
            biased;
            snapshot = state.wait_for(SyncState::is_synchronized) => {
                let snapshot = snapshot.map_err(|_| Error::Cancelled)?;
                snapshot.anchor().ok_or(Error::Cancelled)
            }
            _ = self.shutdown.cancelled() => Err(Error::Cancelled),
        }
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("state", &*self.state.borrow())
            .field("clock", &self.clock)
            .finish()
    }
}
