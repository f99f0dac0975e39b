//! svcdial - dial logical cluster services through port-forward tunnels
//!
//! # Architecture (Layered Pipeline)
//!
//! ```text
//! "name.namespace:port"
//! → Address   (parse)
//! → Directory (selector + matching backends)
//! → Balance   (uniform random pick)
//! → Tunnel    (upgrade, error stream + monitor, data stream)
//! → TunnelConn (async socket with ordered teardown)
//! ```
//!
//! ## Core Principles
//!
//! - The directory and the tunnel transport are traits; this crate implements neither protocol
//! - Every dial is a fresh lookup: no cache, no pool, no shared mutable state
//! - Diagnostics go through an injected `Logger`, never global state
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── common/          # Core types: ServiceAddress, Selector, BackendCandidate
//! ├── directory/       # Directory seam, resolve, in-memory directory
//! ├── balance.rs       # Backend selection
//! ├── transport/       # Tunnel transport seam and stream headers
//! ├── tunnel/          # Builder, error monitor, TunnelConn
//! └── dialer.rs        # ServiceDialer entry points
//! ```

// Core types
pub mod common;
pub mod error;

// Layered architecture
pub mod balance;
pub mod directory;
pub mod transport;
pub mod tunnel;
pub mod dialer;

// Supporting modules
pub mod config;
pub mod logger;

#[cfg(test)]
mod mock;

// Re-exports for convenience
pub use common::{BackendCandidate, Selector, ServiceAddress, Stream};
pub use error::{DirectoryError, Error, ErrorKind, Result};
pub use config::DialerConfig;
pub use logger::{Logger, NoopLogger, TracingLogger};

// Architecture re-exports
pub use dialer::ServiceDialer;
pub use directory::{Directory, MemoryDirectory};
pub use transport::{MuxConnection, MuxStream, TunnelTransport};
pub use tunnel::{TunnelBuilder, TunnelConn};
