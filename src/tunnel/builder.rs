//! Tunnel builder
//!
//! Linear, no retries:
//!
//! ```text
//! upgrade → error stream → spawn monitor → data stream → TunnelConn
//! ```
//!
//! A close guard owns the teardown until the finished [`TunnelConn`] takes
//! over, so a failure at any step (or dropping the build future) closes the
//! half-built connection.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::transport::{
    BackendTarget, MuxConnection, MuxStream, StreamHeaders, StreamType, TunnelTransport,
};

use super::conn::TunnelConn;
use super::monitor::spawn_monitor;

const DEFAULT_MONITOR_GRACE: Duration = Duration::from_secs(1);

/// Builds tunnels to concrete backends
pub struct TunnelBuilder {
    transport: Arc<dyn TunnelTransport>,
    logger: Arc<dyn Logger>,
    request_id: String,
    monitor_grace: Duration,
}

impl TunnelBuilder {
    pub fn new(
        transport: Arc<dyn TunnelTransport>,
        logger: Arc<dyn Logger>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            logger,
            request_id: request_id.into(),
            monitor_grace: DEFAULT_MONITOR_GRACE,
        }
    }

    /// Builder: how long the built connection's close waits for its monitor
    pub fn with_monitor_grace(mut self, grace: Duration) -> Self {
        self.monitor_grace = grace;
        self
    }

    /// Open a tunnel to `port` on `target`
    pub async fn build(&self, target: &BackendTarget, port: u16) -> Result<TunnelConn> {
        let path = target.portforward_path();
        self.logger
            .debug(format_args!("upgrading {} (port {})", path, port));

        let conn = self
            .transport
            .open(target, &path)
            .await
            .map_err(|source| Error::Upgrade {
                namespace: target.namespace.clone(),
                backend: target.name.clone(),
                port,
                source,
            })?;
        let guard = CloseGuard::new(conn.as_ref(), self.logger.as_ref(), target);

        let headers = StreamHeaders::new(StreamType::Error, port, self.request_id.as_str());
        let error_stream = self.create_stream(conn.as_ref(), &headers, target).await?;
        let monitor = spawn_monitor(error_stream, Arc::clone(&self.logger), target.to_string());

        let data_stream = self
            .create_stream(conn.as_ref(), &headers.with_type(StreamType::Data), target)
            .await?;

        guard.disarm();
        self.logger
            .debug(format_args!("tunnel to {} port {} established", target, port));

        Ok(TunnelConn::new(
            data_stream,
            conn,
            monitor,
            self.monitor_grace,
            Arc::clone(&self.logger),
            target.clone(),
            port,
        ))
    }

    async fn create_stream(
        &self,
        conn: &dyn MuxConnection,
        headers: &StreamHeaders,
        target: &BackendTarget,
    ) -> Result<Box<dyn MuxStream>> {
        self.logger.debug(format_args!(
            "creating {} stream to {} port {}",
            headers.stream_type, target, headers.port
        ));

        conn.create_stream(headers)
            .await
            .map_err(|source| Error::Stream {
                stream_type: headers.stream_type,
                namespace: target.namespace.clone(),
                backend: target.name.clone(),
                port: headers.port,
                source,
            })
    }
}

/// Closes the connection on drop unless disarmed
struct CloseGuard<'a> {
    conn: &'a dyn MuxConnection,
    logger: &'a dyn Logger,
    target: &'a BackendTarget,
    armed: bool,
}

impl<'a> CloseGuard<'a> {
    fn new(
        conn: &'a dyn MuxConnection,
        logger: &'a dyn Logger,
        target: &'a BackendTarget,
    ) -> Self {
        Self {
            conn,
            logger,
            target,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CloseGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.logger.debug(format_args!(
            "closing partially built tunnel to {}",
            self.target
        ));
        if let Err(e) = self.conn.close() {
            self.logger
                .warn(format_args!("close of tunnel to {} failed: {}", self.target, e));
        }
    }
}
