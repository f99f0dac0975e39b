//! Tunnel Layer
//!
//! Responsibilities:
//! - Upgrade to a backend's port-forward endpoint and open the error and data
//!   sub-streams
//! - Watch the error stream for the tunnel's whole lifetime
//! - Present the data stream as one async socket with an ordered teardown

mod builder;
mod conn;
mod monitor;

pub use builder::TunnelBuilder;
pub use conn::{TunnelAddr, TunnelConn};
pub use monitor::{spawn_monitor, MonitorHandle};
