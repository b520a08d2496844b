//! Loopback NTP server for exercising the synchronization cycle

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::core::TimeSyncConfig;
use crate::protocol::NtpResponse;

/// What the mock server does with the n-th request (0-based)
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Answer with a server packet after `delay`
    Transmit {
        seconds: u32,
        fraction: u32,
        delay: Duration,
    },
    /// Send these bytes verbatim
    Raw(Vec<u8>),
    /// Never answer
    Ignore,
}

impl Reply {
    pub(crate) fn transmit(seconds: u32) -> Self {
        Reply::Transmit {
            seconds,
            fraction: 0,
            delay: Duration::ZERO,
        }
    }
}

pub(crate) struct MockNtpServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockNtpServer {
    pub(crate) async fn spawn<F>(script: F) -> Self
    where
        F: Fn(usize) -> Reply + Send + 'static,
    {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = socket.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        let task = tokio::spawn(async move {
            let mut buf = [0u8; 512];
            loop {
                let (size, from) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(_) => continue,
                };
                assert_eq!(size, 48, "client sent a short request");
                assert_eq!(buf[0], 0x1B);

                let index = counter.fetch_add(1, Ordering::SeqCst);
                match script(index) {
                    Reply::Transmit { seconds, fraction, delay } => {
                        let socket = socket.clone();
                        let packet = NtpResponse::with_transmit(seconds, fraction);
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = socket.send_to(packet.as_bytes(), from).await;
                        });
                    }
                    Reply::Raw(bytes) => {
                        let _ = socket.send_to(&bytes, from).await;
                    }
                    Reply::Ignore => {}
                }
            }
        });

        MockNtpServer {
            addr,
            requests,
            task,
        }
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Requests received so far
    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Config pointing at this server with short timings
    pub(crate) fn config(&self, request_timeout: Duration, retry_interval: Duration) -> TimeSyncConfig {
        TimeSyncConfig {
            server: self.addr.ip().to_string(),
            port: self.addr.port(),
            request_timeout,
            retry_interval: Some(retry_interval),
        }
    }
}

impl Drop for MockNtpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
