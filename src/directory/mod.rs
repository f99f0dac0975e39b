//! Directory Layer
//!
//! Responsibilities:
//! - Ask the directory for a service's selector
//! - Ask the directory for the backends matching that selector
//!
//! Every `resolve` is a fresh read. Nothing is cached between calls.

mod memory;

pub use memory::{BackendRecord, MemoryDirectory, ServiceRecord, WatchEvent};

use async_trait::async_trait;

use crate::common::{BackendCandidate, Selector};
use crate::error::{DirectoryError, Error, Result};

/// Read-only query interface of the external directory service
///
/// Both calls must be idempotent reads with no side effects.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Fetch the backend-matching selector of service `name`
    async fn service_selector(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<Selector, DirectoryError>;

    /// List backends in `namespace` whose labels are a superset of `selector`
    async fn list_backends(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> std::result::Result<Vec<BackendCandidate>, DirectoryError>;
}

/// Resolve a logical service to its current backend candidates.
///
/// Performs exactly two directory queries. The returned list is a snapshot
/// and is never empty.
pub async fn resolve(
    directory: &dyn Directory,
    name: &str,
    namespace: &str,
) -> Result<Vec<BackendCandidate>> {
    let lookup_err = |source| Error::ServiceLookup {
        service: name.to_string(),
        namespace: namespace.to_string(),
        source,
    };

    let selector = directory
        .service_selector(namespace, name)
        .await
        .map_err(lookup_err)?;

    // An empty selector can never match deterministically; not worth retrying.
    if selector.is_empty() {
        return Err(Error::NoSelector {
            service: name.to_string(),
            namespace: namespace.to_string(),
        });
    }

    let backends = directory
        .list_backends(namespace, &selector)
        .await
        .map_err(lookup_err)?;

    if backends.is_empty() {
        return Err(Error::NoBackends {
            service: name.to_string(),
            namespace: namespace.to_string(),
            selector,
        });
    }

    Ok(backends)
}
