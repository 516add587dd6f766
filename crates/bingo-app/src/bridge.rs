//! Host bridge capability.
//!
//! The embedding host supplies authentication material through a bridge
//! whose token and availability may change at any time. The runtime only
//! sees the bridge through [`HostBridge`], so tests and the standalone binary
//! can inject their own.

use std::future::Future;

use bingo_core::BridgeInput;
use tokio::sync::watch;

/// Raw reading from the host bridge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BridgeStatus {
    /// Bearer token, once delivered.
    pub token: Option<String>,
    /// Whether a host bridge exists at all.
    pub available: bool,
}

impl BridgeStatus {
    /// Bridge present, token delivered.
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()), available: true }
    }

    /// Bridge present, token not yet delivered.
    pub fn pending() -> Self {
        Self { token: None, available: true }
    }

    /// No bridge in this runtime.
    pub fn unavailable() -> Self {
        Self { token: None, available: false }
    }

    /// Reduce to the identity resolver's input.
    pub fn to_input(&self) -> BridgeInput {
        BridgeInput::from_bridge(self.token.as_deref(), self.available)
    }
}

/// Injected source of bridge readings.
pub trait HostBridge: Send + 'static {
    /// Current reading.
    fn status(&self) -> BridgeStatus;

    /// Wait for the next reading.
    ///
    /// Returns `None` once the bridge can no longer change. Must be cancel
    /// safe: the runtime polls it inside `select!`.
    fn changed(&mut self) -> impl Future<Output = Option<BridgeStatus>> + Send;
}

/// Bridge backed by a watch channel. Readings are pushed through the paired
/// [`BridgeHandle`].
#[derive(Debug, Clone)]
pub struct WatchBridge {
    rx: watch::Receiver<BridgeStatus>,
}

/// Writer side of a [`WatchBridge`].
#[derive(Debug)]
pub struct BridgeHandle {
    tx: watch::Sender<BridgeStatus>,
}

/// Create a bridge and its writer, starting from `initial`.
pub fn channel(initial: BridgeStatus) -> (BridgeHandle, WatchBridge) {
    let (tx, rx) = watch::channel(initial);
    (BridgeHandle { tx }, WatchBridge { rx })
}

impl BridgeHandle {
    /// Replace the whole reading.
    pub fn set(&self, status: BridgeStatus) {
        self.tx.send_if_modified(|current| {
            let modified = *current != status;
            *current = status;
            modified
        });
    }

    /// Deliver (or withdraw) the token.
    pub fn set_token(&self, token: Option<String>) {
        self.tx.send_if_modified(|current| {
            let modified = current.token != token;
            current.token = token;
            modified
        });
    }

    /// Flip the availability flag.
    pub fn set_available(&self, available: bool) {
        self.tx.send_if_modified(|current| {
            let modified = current.available != available;
            current.available = available;
            modified
        });
    }

    /// Current reading.
    pub fn status(&self) -> BridgeStatus {
        self.tx.borrow().clone()
    }
}

impl HostBridge for WatchBridge {
    fn status(&self) -> BridgeStatus {
        self.rx.borrow().clone()
    }

    fn changed(&mut self) -> impl Future<Output = Option<BridgeStatus>> + Send {
        async move {
            self.rx.changed().await.ok()?;
            Some(self.rx.borrow_and_update().clone())
        }
    }
}
