//! Check scheduling: jittered sleeps and the check throttle.
//!
//! Every monitor sleeps `check_interval - uniform(0..1000ms)` between
//! cycles so that peers with equal intervals drift apart instead of
//! probing in lockstep. The throttle additionally refuses to probe before
//! a full interval has passed since the last check, whatever the sleep did.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use conncheck_metadata::Host;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::warn;

/// Upper bound (exclusive) of the jitter subtracted from the interval.
pub const MAX_JITTER: Duration = Duration::from_millis(1000);

/// Derive a seed from a dotted agent address, e.g. `10.42.0.5` → `104205`.
///
/// Returns `None` for addresses that do not collapse into a number.
pub fn seed_from_agent_ip(agent_ip: &str) -> Option<u64> {
    agent_ip.replace('.', "").parse::<u64>().ok()
}

/// Seed from the wall clock.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Build a peer's generator.
///
/// Seeding from the host address gives monitors on the same host a
/// reproducible jitter phase across restarts.
pub fn seeded_rng(peer_id: &str, host: Option<&Host>) -> StdRng {
    let seed = match host {
        Some(h) => seed_from_agent_ip(&h.agent_ip).unwrap_or_else(|| {
            warn!(peer = %peer_id, agent_ip = %h.agent_ip, "couldn't derive jitter seed from host address, using time");
            time_seed()
        }),
        None => time_seed(),
    };
    StdRng::seed_from_u64(seed)
}

/// Sleep before the next cycle: the interval minus up to one second of jitter.
///
/// Saturates at zero, which means "proceed immediately".
pub fn jittered_sleep<R: Rng>(check_interval: Duration, rng: &mut R) -> Duration {
    let jitter = Duration::from_millis(rng.gen_range(0..MAX_JITTER.as_millis() as u64));
    check_interval.saturating_sub(jitter)
}

/// Whether at least `check_interval` has passed since `last_checked`.
pub fn is_time_to_check(
    last_checked: Option<Instant>,
    now: Instant,
    check_interval: Duration,
) -> bool {
    match last_checked {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= check_interval,
    }
}
