//! Simulated environment with a virtual clock and seeded RNG.
//!
//! Time never moves on its own: it advances only through
//! [`SimEnv::advance`] or [`Environment::sleep`], so a test decides exactly
//! when deadlines pass. Randomness comes from a ChaCha20 stream seeded per
//! test, so a failing seed replays the same keys, ciphertexts and nonces.

use std::{
    ops::{Add, Sub},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use kemlink_core::env::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Point in virtual time, measured from the start of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Start of the simulation.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Time since the start of the simulation.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

/// Saturates at zero when `rhs` is later.
impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

/// Deterministic environment for simulation.
///
/// Clones share the clock and the RNG stream.
#[derive(Debug, Clone)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha20Rng>>,
    seed: u64,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment whose RNG stream is determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            seed,
        }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Time since the start of the simulation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_only_when_advanced() {
        let env = SimEnv::new();
        let start = env.now();
        assert_eq!(env.now(), start);

        env.advance(Duration::from_secs(90));
        assert_eq!(env.now() - start, Duration::from_secs(90));
        assert_eq!(env.now().since_start(), Duration::from_secs(90));
    }

    #[test]
    fn instant_subtraction_saturates() {
        let later = SimInstant::ZERO + Duration::from_secs(5);
        assert_eq!(SimInstant::ZERO - later, Duration::ZERO);
    }

    #[test]
    fn same_seed_same_stream() {
        let a: [u8; 32] = SimEnv::with_seed(7).random_array();
        let b: [u8; 32] = SimEnv::with_seed(7).random_array();
        let c: [u8; 32] = SimEnv::with_seed(8).random_array();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn clones_share_clock_and_stream() {
        let env = SimEnv::with_seed(1);
        let clone = env.clone();

        clone.advance(Duration::from_secs(1));
        assert_eq!(env.elapsed(), Duration::from_secs(1));

        let first: [u8; 16] = env.random_array();
        let second: [u8; 16] = clone.random_array();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn sleep_advances_virtual_time() {
        let env = SimEnv::new();
        env.sleep(Duration::from_secs(3)).await;
        assert_eq!(env.elapsed(), Duration::from_secs(3));
    }
}
