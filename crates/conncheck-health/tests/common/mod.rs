//! Shared fixtures for peer monitor tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use conncheck_health::{
    BoxFuture, MonitorConfig, PeerMonitor, ProbeError, ProbeOutcome, ReachabilityProbe,
};
use conncheck_metadata::{Container, Host, Publisher, snapshot};

/// Probe that replays a script of outcomes, then repeats a fallback.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<ProbeOutcome>>,
    fallback: bool,
    delay: Duration,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self::with_outcomes(script.into_iter().map(outcome), fallback)
    }

    /// Probe that always answers `reachable`.
    pub fn always(reachable: bool) -> Self {
        Self::with_outcomes(Vec::new(), reachable)
    }

    pub fn with_outcomes(script: impl IntoIterator<Item = ProbeOutcome>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Make every probe take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

fn outcome(reachable: bool) -> ProbeOutcome {
    if reachable {
        ProbeOutcome::reachable()
    } else {
        ProbeOutcome::unreachable(ProbeError::Connect("scripted failure".to_string()))
    }
}

impl ReachabilityProbe for ScriptedProbe {
    fn probe<'a>(
        &'a self,
        url: &'a str,
        _expected_body: &'a str,
        _timeout: Duration,
    ) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| outcome(self.fallback))
        })
    }
}

pub fn active_host() -> Host {
    Host {
        uuid: "host-1".to_string(),
        name: "node-a".to_string(),
        agent_ip: "10.0.0.11".to_string(),
        state: "active".to_string(),
        agent_state: String::new(),
    }
}

pub fn running_container(primary_ip: &str) -> Container {
    Container {
        uuid: format!("c-{primary_ip}"),
        name: "connectivity-check".to_string(),
        primary_ip: primary_ip.to_string(),
        state: "running".to_string(),
    }
}

/// A monitor wired to publishers the test controls.
pub struct Fixture {
    pub host: Publisher<Host>,
    pub container: Publisher<Container>,
    pub companion: Publisher<Container>,
    pub probe: Arc<ScriptedProbe>,
    pub monitor: Arc<PeerMonitor>,
}

/// Fixture where the peer is eligible from the start.
pub fn eligible(check_interval_ms: u64, probe: ScriptedProbe) -> Fixture {
    let (host, host_snap) = snapshot();
    let (container, container_snap) = snapshot();
    let (companion, companion_snap) = snapshot();
    host.publish(active_host());
    container.publish(running_container("10.42.1.7"));
    companion.publish(running_container("10.42.1.2"));

    let probe = Arc::new(probe);
    let monitor = Arc::new(PeerMonitor::new(
        "peer-1",
        MonitorConfig::new(check_interval_ms, 500),
        host_snap,
        container_snap,
        companion_snap,
        probe.clone(),
    ));

    Fixture {
        host,
        container,
        companion,
        probe,
        monitor,
    }
}
