/// Advisory check for network connectivity.
///
/// Consulted before every attempt; when it reports no network the attempt is
/// skipped for that tick.
pub trait Reachability: Send + Sync {
    /// Returns whether the network is reachable
    fn is_reachable(&self) -> bool;
}

/// Probe that always reports a reachable network
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl Reachability for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

impl<F> Reachability for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_reachable(&self) -> bool {
        self()
    }
}
