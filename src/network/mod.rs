//! Network access for the synchronization cycle
//! 
//! This module resolves the server name, owns the per-attempt UDP socket and
//! answers whether the network is worth trying at all.

mod connection;
mod reachability;
mod resolver;

pub use self::connection::{NtpConnection, SocketTracker};
pub use self::reachability::{AlwaysReachable, Reachability};
pub use self::resolver::{DnsResolver, Resolve};
