//! conncheck-health — reachability monitoring for peers of a service.
//!
//! Each remote peer gets its own [`PeerMonitor`] running as a background
//! task. The monitor periodically pings the peer's container and smooths
//! the results into a debounced reachable/unreachable signal.
//!
//! # Architecture
//!
//! ```text
//! PeerRegistry
//!   └── PeerMonitor (one task per peer)
//!       ├── eligibility::evaluate(host, container, companion)
//!       ├── schedule: jittered sleep + is_time_to_check throttle
//!       ├── ReachabilityProbe::probe() → ProbeOutcome
//!       └── Confidence (0..=3 hysteresis) → watch::Receiver<bool>
//! ```
//!
//! # Hysteresis
//!
//! A success raises the confidence counter and a failure lowers it, both
//! saturating at `0` and [`MAX_CONFIDENCE`]. The peer is reachable while the
//! counter is above zero, so only crossing the `0`/`1` boundary flips the
//! signal.

pub mod checker;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod peer;
pub mod probe;
pub mod registry;
pub mod schedule;

pub use checker::{Confidence, MAX_CONFIDENCE, Transition};
pub use config::MonitorConfig;
pub use eligibility::Ineligible;
pub use error::{MonitorError, MonitorResult};
pub use peer::{CycleOutcome, PeerMonitor};
pub use probe::{BoxFuture, HttpProbe, ProbeError, ProbeOutcome, ReachabilityProbe};
pub use registry::{PeerRegistry, PeerStatus};
