use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::{Error, Result};
use crate::network::NtpConnection;
use crate::protocol::NtpRequest;
use super::service::Shared;
use super::state::Anchor;

/// One resolve, request and parse cycle.
///
/// The attempt owns its socket for its whole life; cancelling the token or
/// hitting the timeout drops the in-flight exchange and closes the socket.
#[derive(Debug)]
pub(crate) struct SyncAttempt {
    generation: u64,
    token: CancellationToken,
}

impl SyncAttempt {
    pub(crate) fn new(generation: u64, token: CancellationToken) -> Self {
        SyncAttempt { generation, token }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs the attempt to completion, timeout or cancellation
    pub(crate) async fn run(&self, shared: &Shared) -> Result<Anchor> {
        let request_timeout = shared.config.request_timeout;

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(generation = self.generation, "NTP request cancelled");
                Err(Error::Cancelled)
            }
            result = timeout(request_timeout, Self::exchange(shared)) => {
                result.map_err(|_| Error::Timeout(request_timeout))?
            }
        }
    }

    async fn exchange(shared: &Shared) -> Result<Anchor> {
        let peer = shared
            .resolver
            .resolve(&shared.config.server, shared.config.port)
            .await?;

        let mut connection = NtpConnection::open(peer, &shared.sockets).await?;
        let response = connection.exchange(NtpRequest::new()).await?;
        let monotonic = shared.clock.instant();
        drop(connection);

        Ok(Anchor {
            time: response.transmit_local()?,
            monotonic,
        })
    }
}
