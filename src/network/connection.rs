use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::core::{Error, Result};
use crate::protocol::{NtpCodec, NtpRequest, NtpResponse, MAX_DATAGRAM_SIZE};

/// Counts sockets that are currently open
#[derive(Debug, Clone, Default)]
pub struct SocketTracker {
    open: Arc<AtomicUsize>,
}

impl SocketTracker {
    /// Creates a new tracker with no open sockets
    pub fn new() -> Self {
        SocketTracker::default()
    }

    /// Number of sockets not yet closed
    pub fn open_sockets(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn lease(&self) -> SocketLease {
        self.open.fetch_add(1, Ordering::SeqCst);
        SocketLease {
            open: self.open.clone(),
        }
    }
}

/// Released when the owning connection is dropped
#[derive(Debug)]
struct SocketLease {
    open: Arc<AtomicUsize>,
}

impl Drop for SocketLease {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// UDP association with a single NTP server.
///
/// The socket is owned exclusively by the connection and closed when it is
/// dropped.
#[derive(Debug)]
pub struct NtpConnection {
    socket: UdpSocket,
    peer: SocketAddr,
    codec: NtpCodec,
    _lease: SocketLease,
}

impl NtpConnection {
    /// Opens a socket in the peer's address family and connects it
    pub async fn open(peer: SocketAddr, tracker: &SocketTracker) -> Result<Self> {
        let socket = Socket::new(Domain::for_address(peer), Type::DGRAM, Some(Protocol::UDP))?;
        let lease = tracker.lease();
        socket.set_nonblocking(true)?;

        let unspecified = match peer.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        socket.bind(&SocketAddr::new(unspecified, 0).into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        socket.connect(peer).await?;

        trace!(%peer, "NTP socket connected");

        Ok(NtpConnection {
            socket,
            peer,
            codec: NtpCodec::new(),
            _lease: lease,
        })
    }

    /// Sends a request and waits for the server's reply.
    ///
    /// No timeout is applied here; the caller bounds the exchange.
    pub async fn exchange(&mut self, request: NtpRequest) -> Result<NtpResponse> {
        let mut send_buffer = BytesMut::new();
        self.codec.encode(request, &mut send_buffer)?;
        self.socket.send(&send_buffer).await?;

        let mut recv_buffer = BytesMut::zeroed(MAX_DATAGRAM_SIZE);
        let size = self.socket.recv(&mut recv_buffer).await?;
        recv_buffer.truncate(size);

        trace!(peer = %self.peer, size, "NTP datagram received");

        match self.codec.decode(&mut recv_buffer)? {
            Some(response) => Ok(response),
            None => Err(Error::malformed(format!(
                "Reply is {} bytes, expected at least {}",
                size,
                crate::protocol::NTP_PACKET_SIZE
            ))),
        }
    }

    /// Returns the server address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Returns the local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
