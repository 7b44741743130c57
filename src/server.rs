//! Root `Server` value: owns the registry, executor, metrics, and
//! shutdown coordinator, passed by reference to collaborators instead of
//! being reached for as lazily-initialized global singletons (§9 design
//! note). Only the logger and metrics collector retain a tiny
//! module-level accessor, per that same note.

use crate::config::{Credentials, Settings};
use crate::dispatcher::shutdown::ShutdownCoordinator;
use crate::error::Error;
use crate::executor::Executor;
use crate::metrics::Metrics;
use crate::registry::Registry;
use crate::transport::Transport;
use std::path::Path;
use std::sync::Arc;

pub struct Server {
    pub registry: Registry,
    pub executor: Executor,
    pub metrics: Arc<Metrics>,
    pub shutdown: ShutdownCoordinator,
}

impl Server {
    /// Loads the registry from `spec_root`, builds the transport from
    /// `credentials`/`settings`, and wires the executor and shutdown
    /// coordinator together.
    ///
    /// # Errors
    /// Returns `Error::Config` if the registry is empty after load, or
    /// whatever error the transport's HTTP client construction surfaces.
    pub fn new(
        spec_root: &Path,
        credentials: Credentials,
        settings: &Settings,
        drain_timeout_secs: u64,
    ) -> Result<Self, Error> {
        let registry = Registry::load(spec_root)?;
        let metrics = Arc::new(Metrics::new());
        let stats = registry.stats();
        metrics.record_registry_load(stats.total as u64, stats.by_product.len() as u64, 0);
        metrics.record_process_start();

        let account_key = credentials.account_key.clone();
        let transport = Transport::new(credentials, settings, &user_agent())?;
        let executor = Executor::new(transport, account_key);

        Ok(Self { registry, executor, metrics, shutdown: ShutdownCoordinator::new(drain_timeout_secs) })
    }
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
