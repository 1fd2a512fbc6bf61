//! Confidence counter — hysteresis over probe results.
//!
//! Converts individual probe outcomes into a debounced reachability signal.
//! The counter saturates at both ends so that a single flaky result after a
//! run of consistent ones never flips the signal on its own.

/// Upper bound of the confidence counter.
pub const MAX_CONFIDENCE: u8 = 3;

/// Edge in the debounced reachability signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The counter went from `0` to `1`.
    BecameReachable,
    /// The counter went from `1` to `0`.
    BecameUnreachable,
}

/// Bounded counter in `0..=MAX_CONFIDENCE`.
///
/// Starts at `0`: a peer is unreachable until proven otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confidence(u8);

impl Confidence {
    pub fn new() -> Self {
        Self(0)
    }

    /// Record a successful probe.
    ///
    /// Returns `BecameReachable` when this success lifts the counter off zero.
    pub fn record_success(&mut self) -> Option<Transition> {
        if self.0 < MAX_CONFIDENCE {
            self.0 += 1;
            if self.0 == 1 {
                return Some(Transition::BecameReachable);
            }
        }
        None
    }

    /// Record a failed probe.
    ///
    /// Returns `BecameUnreachable` when this failure drops the counter to zero.
    pub fn record_failure(&mut self) -> Option<Transition> {
        if self.0 > 0 {
            self.0 -= 1;
            if self.0 == 0 {
                return Some(Transition::BecameUnreachable);
            }
        }
        None
    }

    /// Record a probe result.
    pub fn record(&mut self, reachable: bool) -> Option<Transition> {
        if reachable {
            self.record_success()
        } else {
            self.record_failure()
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether the peer is currently considered reachable.
    pub fn is_reachable(&self) -> bool {
        self.0 > 0
    }
}
