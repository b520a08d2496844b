use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{Error, Result, TimeSyncConfig};
use crate::network::{AlwaysReachable, DnsResolver, Reachability, Resolve, SocketTracker};
use crate::time::{Clock, SystemClock};
use super::attempt::SyncAttempt;
use super::handle::SyncHandle;
use super::state::{Anchor, Counters, SyncState, SyncStats};

/// State shared between the service and its retry loop
pub(crate) struct Shared {
    pub(crate) config: TimeSyncConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) resolver: Arc<dyn Resolve>,
    pub(crate) reachability: Arc<dyn Reachability>,
    pub(crate) sockets: SocketTracker,
    state: watch::Sender<SyncState>,
    /// Only loops of this generation may publish
    generation: Mutex<u64>,
    counters: Counters,
}

impl Shared {
    fn current_generation(&self) -> u64 {
        *lock(&self.generation)
    }

    fn advance_generation(&self) -> u64 {
        let mut generation = lock(&self.generation);
        *generation += 1;
        *generation
    }

    /// Applies an anchor unless a newer cycle has started since
    fn publish(&self, generation: u64, anchor: Anchor) -> bool {
        let current = lock(&self.generation);
        if *current != generation {
            return false;
        }

        self.state.send_replace(SyncState::synchronized(anchor));
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A spawned retry loop and the token that stops it
struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Keeps a process-wide clock synchronized with an NTP server.
///
/// Construct one service at startup, call [`start`](Self::start) from within
/// a Tokio runtime and hand out [`SyncHandle`]s to consumers. Until the first
/// reply is applied, [`now`](Self::now) returns the local clock.
pub struct TimeSyncService {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    worker: Mutex<Option<Worker>>,
}

impl TimeSyncService {
    /// Creates a service using DNS, the system clock and no reachability probe
    pub fn new(config: TimeSyncConfig) -> Result<Self> {
        TimeSyncService::builder(config).build()
    }

    /// Starts building a service with custom collaborators
    pub fn builder(config: TimeSyncConfig) -> TimeSyncServiceBuilder {
        TimeSyncServiceBuilder::new(config)
    }

    /// Starts the retry loop.
    ///
    /// Only the first call spawns a loop; later calls and calls after
    /// [`shutdown`](Self::shutdown) are ignored.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a Tokio runtime.
    pub fn start(&self) {
        if self.shutdown.is_cancelled() {
            warn!("Time sync service already shut down, ignoring start");
            return;
        }

        let mut worker = lock(&self.worker);
        if worker.is_some() {
            debug!("Time sync loop already started");
            return;
        }

        let generation = self.shared.current_generation();
        *worker = Some(self.spawn_loop(generation, None));
    }

    /// Restarts synchronization even if a sample was already applied.
    ///
    /// Any outstanding request is cancelled and its socket released before
    /// the new loop sends anything. The previous sample keeps serving
    /// [`now`](Self::now) until the new one arrives.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a Tokio runtime.
    pub fn resynchronize(&self) {
        if self.shutdown.is_cancelled() {
            warn!("Time sync service already shut down, ignoring resynchronize");
            return;
        }

        let mut worker = lock(&self.worker);
        let previous = worker.take().map(|previous| {
            previous.token.cancel();
            previous.handle
        });

        let generation = self.shared.advance_generation();
        info!(generation, "NTP resynchronization requested");
        *worker = Some(self.spawn_loop(generation, previous));
    }

    /// Stops the retry loop and waits for it to release its socket
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.shared.advance_generation();

        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.handle.await {
                warn!(error = %e, "Time sync loop ended abnormally");
            }
        }

        info!("Time sync service stopped");
    }

    /// Whether an NTP sample has been applied
    pub fn is_synchronized(&self) -> bool {
        self.shared.state.borrow().is_synchronized()
    }

    /// Current time estimate, the local clock until synchronized
    pub fn now(&self) -> DateTime<Local> {
        self.shared.state.borrow().now(self.shared.clock.as_ref())
    }

    /// Latest published snapshot
    pub fn state(&self) -> SyncState {
        *self.shared.state.borrow()
    }

    /// Returns a read-only handle for consumers
    pub fn handle(&self) -> SyncHandle {
        SyncHandle::new(
            self.shared.state.subscribe(),
            self.shared.clock.clone(),
            self.shutdown.child_token(),
        )
    }

    /// Whether a retry loop is currently running
    pub fn is_running(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .map_or(false, |worker| !worker.handle.is_finished())
    }

    /// Activity counters
    pub fn stats(&self) -> SyncStats {
        self.shared
            .counters
            .snapshot(self.shared.sockets.open_sockets())
    }

    /// Returns the service configuration
    pub fn config(&self) -> &TimeSyncConfig {
        &self.shared.config
    }

    fn spawn_loop(&self, generation: u64, previous: Option<JoinHandle<()>>) -> Worker {
        let token = self.shutdown.child_token();
        let shared = self.shared.clone();
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                // The cancelled loop drops its socket on the way out
                let _ = previous.await;
            }
            run_loop(shared, generation, loop_token).await;
        });

        Worker { token, handle }
    }
}

impl Drop for TimeSyncService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl fmt::Debug for TimeSyncService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSyncService")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Retry loop: ticks every retry interval until one attempt succeeds.
///
/// Without an explicit retry interval ticks are counted from the start of
/// each attempt; with one, a failed attempt waits the full interval.
async fn run_loop(shared: Arc<Shared>, generation: u64, token: CancellationToken) {
    let mut ticker = interval(shared.config.retry_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(generation, "Time sync loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        if !shared.reachability.is_reachable() {
            shared.counters.record_skip();
            debug!("Network unreachable, skipping NTP request");
            continue;
        }

        let attempt = SyncAttempt::new(generation, token.child_token());
        shared.counters.record_attempt();
        info!(
            server = %shared.config.server,
            generation = attempt.generation(),
            "NTP request started"
        );

        match attempt.run(&shared).await {
            Ok(anchor) => {
                if shared.publish(attempt.generation(), anchor) {
                    info!(time = %anchor.time, "Date is synchronized");
                } else {
                    debug!(generation, "Discarding NTP response from a superseded cycle");
                }
                return;
            }
            Err(Error::Cancelled) => return,
            Err(e) => {
                shared.counters.record_failure();
                if shared.config.retry_interval.is_some() {
                    ticker.reset();
                }
                warn!(error = %e, retry_in = ?shared.config.retry_interval(), "NTP sync failed");
            }
        }
    }
}

/// Builder for [`TimeSyncService`]
pub struct TimeSyncServiceBuilder {
    config: TimeSyncConfig,
    clock: Arc<dyn Clock>,
    resolver: Arc<dyn Resolve>,
    reachability: Arc<dyn Reachability>,
}

impl TimeSyncServiceBuilder {
    fn new(config: TimeSyncConfig) -> Self {
        TimeSyncServiceBuilder {
            config,
            clock: Arc::new(SystemClock),
            resolver: Arc::new(DnsResolver::new()),
            reachability: Arc::new(AlwaysReachable),
        }
    }

    /// Replaces the clock used for anchoring and fallback
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the server name resolver
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Installs a connectivity probe consulted before each request
    pub fn reachability(mut self, reachability: impl Reachability + 'static) -> Self {
        self.reachability = Arc::new(reachability);
        self
    }

    /// Validates the configuration and builds the service
    pub fn build(self) -> Result<TimeSyncService> {
        self.config.validate()?;

        let (state, _) = watch::channel(SyncState::unsynchronized());
        let shared = Arc::new(Shared {
            config: self.config,
            clock: self.clock,
            resolver: self.resolver,
            reachability: self.reachability,
            sockets: SocketTracker::new(),
            state,
            generation: Mutex::new(0),
            counters: Counters::default(),
        });

        Ok(TimeSyncService {
            shared,
            shutdown: CancellationToken::new(),
            worker: Mutex::new(None),
        })
    }
}
