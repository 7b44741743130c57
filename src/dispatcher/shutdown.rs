//! Shutdown coordinator: `Running -> Draining -> Closed`, matching the
//! explicit-state-machine style used by `transport::circuit_breaker`.
//!
//! New `tools/call` requests are rejected once draining starts;
//! in-flight calls have up to `drainTimeout` to finish before the drain
//! gives up and forces an exit. Registered shutdown handlers run in
//! reverse-registration order; a handler failure is logged but does not
//! abort the sequence.

use crate::error::Error;
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Draining,
    Closed,
}

impl State {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

type Handler = Box<dyn Fn() -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

pub struct ShutdownCoordinator {
    state: AtomicU8,
    inflight: AtomicI64,
    drained: Notify,
    cancel: CancellationToken,
    drain_timeout: Duration,
    handlers: Mutex<Vec<Handler>>,
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new(drain_timeout_secs: u64) -> Self {
        Self {
            state: AtomicU8::new(0),
            inflight: AtomicI64::new(0),
            drained: Notify::new(),
            cancel: CancellationToken::new(),
            drain_timeout: Duration::from_secs(drain_timeout_secs),
            handlers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// A clone of the shared cancellation token, cancelled the moment
    /// drain begins. Every suspension point in the executor selects
    /// against it.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Registers a handler to run during shutdown. Handlers registered
    /// earlier run later (reverse-registration order).
    pub fn register<F>(&self, handler: F)
    where
        F: Fn() -> BoxFuture<'static, Result<(), Error>> + Send + Sync + 'static,
    {
        self.handlers.lock().expect("shutdown handlers lock poisoned").push(Box::new(handler));
    }

    /// Admits one new in-flight call.
    ///
    /// # Errors
    /// Returns `Error::UpstreamUnavailable` if the coordinator is
    /// already draining or closed.
    pub fn enter_call(&self) -> Result<CallGuard<'_>, Error> {
        if self.state() != State::Running {
            return Err(Error::UpstreamUnavailable { reason: "server is draining".to_string(), request_id: String::new() });
        }
        self.inflight.fetch_add(1, Ordering::SeqCst);
        Ok(CallGuard { coordinator: self })
    }

    fn leave_call(&self) {
        let remaining = self.inflight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 && self.state() != State::Running {
            self.drained.notify_one();
        }
    }

    /// Runs the drain sequence end to end and returns the process exit
    /// code: 0 on clean drain, 1 on forced drain or handler failure.
    pub async fn shutdown(&self) -> i32 {
        self.state.store(1, Ordering::SeqCst);
        self.cancel.cancel();

        let mut forced = false;
        if self.inflight.load(Ordering::SeqCst) > 0 {
            forced = tokio::time::timeout(self.drain_timeout, self.drained.notified()).await.is_err();
        }

        let handlers: Vec<Handler> = {
            let mut guard = self.handlers.lock().expect("shutdown handlers lock poisoned");
            std::mem::take(&mut *guard)
        };

        let mut handler_failed = false;
        for handler in handlers.into_iter().rev() {
            if let Err(e) = handler().await {
                tracing::warn!(error = %e, "shutdown handler failed");
                handler_failed = true;
            }
        }

        self.state.store(2, Ordering::SeqCst);
        i32::from(forced || handler_failed)
    }
}

/// Held for the lifetime of one in-flight `tools/call`; dropping it
/// decrements the in-flight count and wakes a draining shutdown once it
/// reaches zero.
pub struct CallGuard<'a> {
    coordinator: &'a ShutdownCoordinator,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.leave_call();
    }
}
