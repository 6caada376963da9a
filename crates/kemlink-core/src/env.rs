//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system resources (time, randomness). Enables
//! deterministic simulation (virtual clock, seeded RNG) and production use
//! with real system resources.

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Monotonic point in time usable by the expiration scheduler.
///
/// Subtraction yields the elapsed [`Duration`] and must saturate at zero when
/// the right-hand side is later. `std::time::Instant` satisfies this.
pub trait Timestamp:
    Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> Timestamp for T where
    T: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = T>
{
}

/// Abstract environment providing time, randomness, and async primitives.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Timestamp;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - This method MUST return values that never decrease within a single
    ///   execution context. Subsequent calls must return times >= previous
    ///   calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not session logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Fixed-size random array.
    ///
    /// Used for keygen seeds, encapsulation seeds and AEAD nonces.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// Environments for unit tests in this and downstream crates.
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use super::Environment;

    /// Manually advanced clock with a deterministic byte stream.
    ///
    /// Time only moves when [`MockEnv::advance`] is called. Clones share the
    /// clock. Randomness is a counter-driven xorshift stream, so it is
    /// reproducible but NOT suitable for anything outside tests.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        origin: Instant,
        offset_nanos: Arc<AtomicU64>,
        stream: Arc<AtomicU64>,
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockEnv {
        /// Create an environment whose clock starts now and stays put.
        #[allow(clippy::disallowed_methods)]
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset_nanos: Arc::new(AtomicU64::new(0)),
                stream: Arc::new(AtomicU64::new(0x9E37_79B9_7F4A_7C15)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, duration: Duration) {
            self.offset_nanos.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        }

        /// Time elapsed since construction.
        pub fn elapsed(&self) -> Duration {
            Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.advance(duration);
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for chunk in buffer.chunks_mut(8) {
                let mut x = self.stream.fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::SeqCst);
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                let bytes = x.to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{test_utils::MockEnv, *};

    #[test]
    fn mock_clock_only_moves_when_advanced() {
        let env = MockEnv::new();
        let t0 = env.now();
        assert_eq!(env.now(), t0);

        env.advance(Duration::from_secs(3));
        assert_eq!(env.now() - t0, Duration::from_secs(3));
    }

    #[test]
    fn clones_share_the_clock() {
        let env = MockEnv::new();
        let clone = env.clone();
        clone.advance(Duration::from_secs(1));
        assert_eq!(env.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn random_arrays_differ_between_calls() {
        let env = MockEnv::new();
        let a: [u8; 32] = env.random_array();
        let b: [u8; 32] = env.random_array();
        assert_ne!(a, b);
    }

    #[test]
    fn random_bytes_fill_odd_lengths() {
        let env = MockEnv::new();
        let mut buf = [0u8; 13];
        env.random_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
