//! Operation Registry: OpenAPI ingestion, `$ref` resolution, tool-name
//! generation, pagination detection, and the indexed lookup surface
//! consumed by the dispatcher and executor.
//!
//! Immutable after [`Registry::load`] returns — concurrent reads need
//! no synchronization.

pub mod index;
pub mod loader;
pub mod model;
pub mod naming;
pub mod pagination;
pub mod schema;

pub use index::{RegistryStats, SearchFilter};
pub use model::{HttpMethod, Operation, PaginationKind, ParamLocation, ParameterDescriptor, SchemaShape};

use crate::error::Error;
use index::Index;
use std::path::Path;

pub struct Registry {
    index: Index,
}

impl Registry {
    /// Loads every spec file under `root` and builds the index.
    ///
    /// # Errors
    /// Returns `Error::Config` if zero operations were ingested across
    /// the entire spec tree.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let outcome = loader::load(root)?;
        for (file, reason) in &outcome.skipped {
            tracing::warn!(file = %file.display(), reason = %reason, "skipping malformed spec file");
        }
        tracing::info!(
            operations = outcome.operations.len(),
            skipped = outcome.skipped.len(),
            "registry loaded"
        );
        Ok(Self { index: Index::build(outcome.operations) })
    }

    #[must_use]
    pub fn get(&self, tool_name: &str) -> Option<&Operation> {
        self.index.get(tool_name)
    }

    #[must_use]
    pub fn search(&self, filter: &SearchFilter<'_>) -> Vec<&Operation> {
        self.index.search(filter)
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.index.stats()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
