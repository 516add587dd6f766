//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` reads tokio's clock (which tracks real time unless a test
//! pauses it) and draws randomness from the OS via getrandom. Randomness is
//! only used for the offline fallback identity, so reproducibility is not a
//! concern here.

use std::time::Duration;

use bingo_core::Environment;

/// Production environment using system time and OS randomness.
///
/// # Panics
///
/// Panics if the OS RNG fails. RNG failure indicates an OS-level fault and
/// there is no meaningful identity to fall back to.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
