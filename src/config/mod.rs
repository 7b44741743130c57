//! Credential and settings loading: environment over file, fail-fast
//! validation, never-log-secrets discipline.

pub mod credentials;
pub mod loader;
pub mod settings;

pub use credentials::Credentials;
pub use loader::{load_credentials, load_settings};
pub use settings::Settings;
