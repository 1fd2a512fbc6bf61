//! Peer monitor — background reachability checks for one remote peer.
//!
//! Each `PeerMonitor` owns one tokio task that loops until shut down:
//!
//! ```text
//! loop {
//!     shutdown requested?  → stop
//!     eligible and due?    → probe, update confidence
//!     sleep(interval - jitter)
//! }
//! ```
//!
//! Confidence, the last check instant and the jitter generator sit behind a
//! single async mutex. The mutex is held for the whole check cycle,
//! including the probe itself, so `update_success`, `update_failure` and
//! `consider` wait for an in-flight probe on the same peer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use conncheck_metadata::{Container, Host, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::checker::{Confidence, Transition};
use crate::config::MonitorConfig;
use crate::eligibility::{self, Ineligible};
use crate::error::{MonitorError, MonitorResult};
use crate::probe::ReachabilityProbe;
use crate::schedule;

/// What a single check cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Skipped: the peer is not a valid check target right now.
    Ineligible(Ineligible),
    /// Skipped: less than one check interval since the last check.
    NotDue,
    /// A probe ran and its result was recorded.
    Probed { reachable: bool },
}

/// Mutable per-peer state, guarded by one mutex.
struct PeerState {
    confidence: Confidence,
    last_checked: Option<Instant>,
    rng: StdRng,
}

struct Shared {
    id: String,
    config: MonitorConfig,
    host: Snapshot<Host>,
    container: Snapshot<Container>,
    companion: Snapshot<Container>,
    probe: Arc<dyn ReachabilityProbe>,
    state: Mutex<PeerState>,
    /// Debounced reachability, republished on every edge.
    reachable_tx: watch::Sender<bool>,
}

/// Monitors reachability of one peer container.
///
/// Dropping the monitor also stops its task at the next cycle boundary.
pub struct PeerMonitor {
    shared: Arc<Shared>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl PeerMonitor {
    /// Create a monitor for peer `id`.
    ///
    /// `host` and `container` describe the remote peer, `companion` is the
    /// local connectivity-check container. The monitor only reads them.
    pub fn new(
        id: impl Into<String>,
        config: MonitorConfig,
        host: Snapshot<Host>,
        container: Snapshot<Container>,
        companion: Snapshot<Container>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        let (reachable_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                config,
                host,
                container,
                companion,
                probe,
                state: Mutex::new(PeerState {
                    confidence: Confidence::new(),
                    last_checked: None,
                    rng: StdRng::seed_from_u64(schedule::time_seed()),
                }),
                reachable_tx,
            }),
            handle: std::sync::Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Start the check loop on the current tokio runtime.
    ///
    /// Reseeds the jitter generator from the current host snapshot and
    /// returns without waiting for the first cycle.
    pub fn start(&self) -> MonitorResult<()> {
        let id = &self.shared.id;
        if self.stopped.load(Ordering::SeqCst) {
            return Err(MonitorError::Stopped(id.clone()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| MonitorError::NoRuntime(id.clone()))?;
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::AlreadyStarted(id.clone()));
        }

        let rng = schedule::seeded_rng(id, self.shared.host.latest().as_ref());
        let handle = runtime.spawn(run_peer_loop(
            self.shared.clone(),
            self.shutdown_tx.subscribe(),
            rng,
        ));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        debug!(peer = %id, interval_ms = self.shared.config.check_interval_ms, "peer monitor started");
        Ok(())
    }

    /// Ask the check loop to stop.
    ///
    /// Takes effect at the top of the next cycle; an in-flight probe or
    /// sleep is not interrupted. Calling it again is a no-op.
    pub fn shutdown(&self) -> MonitorResult<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            debug!(peer = %self.shared.id, "peer monitor already shut down");
            return Ok(());
        }
        self.shutdown_tx.send_replace(true);
        debug!(peer = %self.shared.id, "peer monitor shutdown requested");
        Ok(())
    }

    /// Wait for the check loop to exit.
    ///
    /// Returns immediately if the monitor was never started or has already
    /// been waited on. Wrap in `tokio::time::timeout` for a bounded wait.
    pub async fn wait(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(peer = %self.shared.id, error = %e, "peer check loop failed");
            }
        }
    }

    /// Whether the check loop task is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Run one check cycle now, subject to eligibility and the throttle.
    pub async fn check_once(&self) -> CycleOutcome {
        self.shared.check_cycle().await
    }

    /// Whether the peer is currently a valid check target.
    pub async fn consider(&self) -> bool {
        let _state = self.shared.state.lock().await;
        self.shared.view().evaluate().is_ok()
    }

    /// Record a success from an external source.
    pub async fn update_success(&self) -> Option<Transition> {
        let mut state = self.shared.state.lock().await;
        let view = self.shared.view();
        self.shared.record(&mut state, &view, true)
    }

    /// Record a failure from an external source.
    pub async fn update_failure(&self) -> Option<Transition> {
        let mut state = self.shared.state.lock().await;
        let view = self.shared.view();
        self.shared.record(&mut state, &view, false)
    }

    /// Current confidence counter value.
    pub async fn confidence(&self) -> u8 {
        self.shared.state.lock().await.confidence.value()
    }

    /// Instant of the last completed check, if any.
    pub async fn last_checked(&self) -> Option<Instant> {
        self.shared.state.lock().await.last_checked
    }

    /// Debounced reachability.
    ///
    /// Reads the published signal and does not wait for an in-flight probe.
    pub fn is_reachable(&self) -> bool {
        *self.shared.reachable_tx.borrow()
    }

    /// Subscribe to the debounced reachability signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.reachable_tx.subscribe()
    }
}

/// One read of the peer's metadata. A cycle uses a single view for the
/// eligibility check, the probe URL and the edge log.
struct PeerView {
    host: Option<Host>,
    container: Option<Container>,
    companion: Option<Container>,
}

impl PeerView {
    fn evaluate(&self) -> Result<(), Ineligible> {
        eligibility::evaluate(
            self.host.as_ref(),
            self.container.as_ref(),
            self.companion.as_ref(),
        )
    }

    fn host_ip(&self) -> &str {
        self.host.as_ref().map_or("", |h| h.agent_ip.as_str())
    }

    fn container_ip(&self) -> &str {
        self.container.as_ref().map_or("", |c| c.primary_ip.as_str())
    }
}

impl Shared {
    fn view(&self) -> PeerView {
        PeerView {
            host: self.host.latest(),
            container: self.container.latest(),
            companion: self.companion.latest(),
        }
    }

    async fn check_cycle(&self) -> CycleOutcome {
        let mut state = self.state.lock().await;
        let view = self.view();

        if let Err(reason) = view.evaluate() {
            debug!(peer = %self.id, %reason, "peer not considered");
            return CycleOutcome::Ineligible(reason);
        }

        let interval = self.config.check_interval();
        if !schedule::is_time_to_check(state.last_checked, Instant::now(), interval) {
            debug!(
                peer = %self.id,
                since_last_check = ?state.last_checked.map(|t| t.elapsed()),
                ?interval,
                "skipping check"
            );
            return CycleOutcome::NotDue;
        }

        let url = self.config.ping_url(view.container_ip());
        let outcome = self
            .probe
            .probe(&url, &self.config.expected_body, self.config.probe_timeout())
            .await;
        if let Some(e) = &outcome.error {
            debug!(peer = %self.id, %url, error = %e, "checking reachability got error");
        }

        self.record(&mut state, &view, outcome.reachable);
        CycleOutcome::Probed {
            reachable: outcome.reachable,
        }
    }

    /// Apply one result to the hysteresis counter. Caller holds the lock.
    fn record(
        &self,
        state: &mut PeerState,
        view: &PeerView,
        reachable: bool,
    ) -> Option<Transition> {
        let transition = state.confidence.record(reachable);
        state.last_checked = Some(Instant::now());

        if let Some(edge) = transition {
            let host_ip = view.host_ip();
            let container_ip = view.container_ip();
            match edge {
                Transition::BecameReachable => {
                    info!(peer = %self.id, %host_ip, %container_ip, "peer became reachable");
                }
                Transition::BecameUnreachable => {
                    error!(peer = %self.id, %host_ip, %container_ip, "peer became unreachable");
                }
            }
            self.reachable_tx.send_replace(state.confidence.is_reachable());
        }

        debug!(
            peer = %self.id,
            reachable,
            confidence = state.confidence.value(),
            "check recorded"
        );
        transition
    }

    async fn next_sleep(&self) -> Duration {
        let mut state = self.state.lock().await;
        schedule::jittered_sleep(self.config.check_interval(), &mut state.rng)
    }
}

/// The check loop for a single peer.
async fn run_peer_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>, rng: StdRng) {
    shared.state.lock().await.rng = rng;
    debug!(peer = %shared.id, "peer check loop starting");

    loop {
        // A dropped sender means the monitor itself is gone.
        let stop = match shutdown.has_changed() {
            Ok(_) => *shutdown.borrow_and_update(),
            Err(_) => true,
        };
        if stop {
            info!(peer = %shared.id, "peer deleted, stopping check");
            break;
        }

        shared.check_cycle().await;

        let sleep_for = shared.next_sleep().await;
        debug!(peer = %shared.id, ?sleep_for, "sleeping");
        if sleep_for.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{BoxFuture, ProbeOutcome};

    struct AlwaysUp;

    impl ReachabilityProbe for AlwaysUp {
        fn probe<'a>(
            &'a self,
            _url: &'a str,
            _expected_body: &'a str,
            _timeout: Duration,
        ) -> BoxFuture<'a, ProbeOutcome> {
            Box::pin(async { ProbeOutcome::reachable() })
        }
    }

    fn unset_monitor() -> PeerMonitor {
        PeerMonitor::new(
            "peer-1",
            MonitorConfig::new(2000, 500),
            Snapshot::unset(),
            Snapshot::unset(),
            Snapshot::unset(),
            Arc::new(AlwaysUp),
        )
    }

    #[test]
    fn start_outside_runtime_fails() {
        let monitor = unset_monitor();
        assert!(matches!(monitor.start(), Err(MonitorError::NoRuntime(id)) if id == "peer-1"));
        assert!(!monitor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_fails() {
        let monitor = unset_monitor();
        monitor.start().unwrap();
        assert!(matches!(
            monitor.start(),
            Err(MonitorError::AlreadyStarted(_))
        ));
        monitor.shutdown().unwrap();
        monitor.wait().await;
    }

    #[tokio::test]
    async fn start_after_shutdown_fails() {
        let monitor = unset_monitor();
        monitor.shutdown().unwrap();
        assert!(matches!(monitor.start(), Err(MonitorError::Stopped(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_idempotent() {
        let monitor = unset_monitor();
        monitor.start().unwrap();
        monitor.shutdown().unwrap();
        monitor.shutdown().unwrap();
        monitor.shutdown().unwrap();
        monitor.wait().await;
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn wait_without_start_returns() {
        let monitor = unset_monitor();
        monitor.wait().await;
    }

    #[tokio::test]
    async fn unset_metadata_is_ineligible() {
        let monitor = unset_monitor();
        assert!(!monitor.consider().await);
        assert_eq!(
            monitor.check_once().await,
            CycleOutcome::Ineligible(Ineligible::MissingHost)
        );
        assert_eq!(monitor.last_checked().await, None);
    }

    #[tokio::test]
    async fn external_updates_publish_signal() {
        let monitor = unset_monitor();
        let rx = monitor.subscribe();
        assert!(!*rx.borrow());

        assert_eq!(
            monitor.update_success().await,
            Some(Transition::BecameReachable)
        );
        assert!(*rx.borrow());
        assert!(monitor.is_reachable());

        assert_eq!(
            monitor.update_failure().await,
            Some(Transition::BecameUnreachable)
        );
        assert!(!monitor.is_reachable());
        assert!(monitor.last_checked().await.is_some());
    }
}
