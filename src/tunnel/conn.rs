//! Tunnel connection
//!
//! Wraps the data stream of a tunnel together with the multiplexed connection
//! that owns it, and presents them as one async socket.
//!
//! Limitations of the multiplexed transport:
//! - there are no real local/peer addresses; a fixed [`TunnelAddr`] is returned
//! - there is no deadline primitive; `set_*deadline` accept and ignore the value,
//!   so cancel through `close` (or by dropping) instead

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::logger::Logger;
use crate::transport::{BackendTarget, MuxConnection, MuxStream};

use super::monitor::MonitorHandle;

/// Placeholder address of a tunnel endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TunnelAddr;

impl TunnelAddr {
    pub fn network(&self) -> &'static str {
        "tunnel"
    }
}

impl fmt::Display for TunnelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tunnel-conn")
    }
}

/// Progress of the teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    Open,
    /// Data stream reset; the connection is still open
    Closing,
    Done,
}

/// Byte-stream connection to one backend port through a tunnel
pub struct TunnelConn {
    stream: Box<dyn MuxStream>,
    conn: Box<dyn MuxConnection>,
    monitor: MonitorHandle,
    monitor_grace: Duration,
    logger: Arc<dyn Logger>,
    target: BackendTarget,
    port: u16,
    teardown: Teardown,
}

impl TunnelConn {
    pub(crate) fn new(
        stream: Box<dyn MuxStream>,
        conn: Box<dyn MuxConnection>,
        monitor: MonitorHandle,
        monitor_grace: Duration,
        logger: Arc<dyn Logger>,
        target: BackendTarget,
        port: u16,
    ) -> Self {
        Self {
            stream,
            conn,
            monitor,
            monitor_grace,
            logger,
            target,
            port,
            teardown: Teardown::Open,
        }
    }

    /// Backend this connection reaches
    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local_addr(&self) -> TunnelAddr {
        TunnelAddr
    }

    pub fn peer_addr(&self) -> TunnelAddr {
        TunnelAddr
    }

    /// Accepted and ignored.
    pub fn set_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    /// Accepted and ignored.
    pub fn set_read_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    /// Accepted and ignored.
    pub fn set_write_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.teardown != Teardown::Open
    }

    /// Whether the error monitor task has ended
    pub fn monitor_finished(&self) -> bool {
        self.monitor.is_finished()
    }

    /// Tear the tunnel down.
    ///
    /// Order: reset the data stream, close it, remove it from the connection,
    /// close the connection. Runs once; later calls return `Ok(())`. Then waits
    /// up to the configured grace period for the error monitor to observe the
    /// closure.
    ///
    /// If this future is dropped before it completes, the rest of the teardown
    /// runs on drop of the connection.
    pub async fn close(&mut self) -> io::Result<()> {
        match self.teardown {
            Teardown::Done => return Ok(()),
            Teardown::Open => {
                self.reset_stream();
                self.teardown = Teardown::Closing;
            }
            Teardown::Closing => {}
        }

        let id = self.stream.identifier();
        if let Err(e) = self.stream.shutdown().await {
            self.logger
                .debug(format_args!("close of stream {} to {}: {}", id, self.target, e));
        }
        let result = self.release();

        if !self.monitor.wait(self.monitor_grace).await {
            self.logger.warn(format_args!(
                "error monitor for {} still running {:?} after close",
                self.target, self.monitor_grace
            ));
        }

        result
    }

    fn reset_stream(&mut self) {
        if let Err(e) = self.stream.reset() {
            self.logger.debug(format_args!(
                "reset of stream {} to {}: {}",
                self.stream.identifier(),
                self.target,
                e
            ));
        }
    }

    /// Remove the data stream and close the connection. The error stream goes
    /// with the connection.
    fn release(&mut self) -> io::Result<()> {
        self.teardown = Teardown::Done;
        self.conn.remove_stream(self.stream.identifier());
        self.conn.close()
    }

    fn closed_error() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "tunnel connection closed")
    }
}

impl AsyncRead for TunnelConn {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.is_closed() {
            return Poll::Ready(Err(Self::closed_error()));
        }
        Pin::new(&mut *self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TunnelConn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.is_closed() {
            return Poll::Ready(Err(Self::closed_error()));
        }
        Pin::new(&mut *self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.is_closed() {
            return Poll::Ready(Err(Self::closed_error()));
        }
        Pin::new(&mut *self.stream).poll_flush(cx)
    }

    /// Half-close of the data stream only; use [`TunnelConn::close`] to tear down.
    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.is_closed() {
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut *self.stream).poll_shutdown(cx)
    }
}

impl fmt::Debug for TunnelConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConn")
            .field("target", &self.target)
            .field("port", &self.port)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Drop for TunnelConn {
    fn drop(&mut self) {
        // No await here: skip the graceful close, the reset already aborted it.
        match self.teardown {
            Teardown::Done => return,
            Teardown::Open => self.reset_stream(),
            Teardown::Closing => {}
        }
        if let Err(e) = self.release() {
            self.logger
                .debug(format_args!("close of tunnel to {} on drop: {}", self.target, e));
        }
    }
}
