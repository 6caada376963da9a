//! Wall-clock environment for the interactive console.
//!
//! Countdowns run on `std::time::Instant`, idle waits on the tokio timer, and
//! every keygen seed, encapsulation seed and AES-GCM nonce comes from the OS
//! RNG. Nothing here is reproducible; deterministic runs use the simulation
//! environment instead.

use std::time::Duration;

use kemlink_core::env::Environment;

/// Real time and OS randomness.
///
/// # Panics
///
/// [`Environment::random_bytes`] panics if the OS RNG fails. ML-KEM keys and
/// nonces cannot be produced without it.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Environment backed by the system clock and OS RNG.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - keys cannot be generated safely");
    }
}
