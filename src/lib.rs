//! Akamai dynamic API gateway: exposes a vendor REST catalog over a
//! line-delimited JSON-RPC tool-call transport. See `server::Server` for
//! the composition root and `dispatcher::run` for the protocol loop.

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod transport;

pub use error::Error;
pub use server::Server;
