//! Transport Layer
//!
//! Seam to the tunnel transport: an upgraded, multiplexed connection to one
//! backend's port-forward endpoint, carrying independently closable sub-streams.
//!
//! This layer does NOT implement the upgrade protocol. It names the operations
//! the tunnel builder needs and the headers it sends.

mod headers;

pub use headers::{
    BackendTarget, StreamHeaders, StreamType, PORT_HEADER, REQUEST_ID_HEADER, STREAM_TYPE_HEADER,
};

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Performs the upgrade handshake against a backend
#[async_trait]
pub trait TunnelTransport: Send + Sync {
    /// Open an upgraded connection to `subresource` of `target`
    async fn open(&self, target: &BackendTarget, subresource: &str)
        -> io::Result<Box<dyn MuxConnection>>;
}

/// Upgraded, multiplexed connection
///
/// `remove_stream` and `close` are synchronous so that teardown can run from
/// `Drop`. Closing the connection must end every stream still open on it:
/// pending and future reads observe EOF or an error.
#[async_trait]
pub trait MuxConnection: Send + Sync {
    /// Open a sub-stream described by `headers`
    async fn create_stream(&self, headers: &StreamHeaders) -> io::Result<Box<dyn MuxStream>>;

    /// Drop the connection's bookkeeping for stream `id`
    fn remove_stream(&self, id: u32);

    /// Close the connection and every stream on it
    ///
    /// Streams never passed to `remove_stream` are released here. A tunnel
    /// only removes its data stream; the error stream is released by this call.
    fn close(&self) -> io::Result<()>;
}

/// One logical byte channel of a [`MuxConnection`]
///
/// Graceful close is `AsyncWrite::poll_shutdown`.
pub trait MuxStream: AsyncRead + AsyncWrite + Unpin + Send {
    /// Identifier of this stream within its connection
    fn identifier(&self) -> u32;

    /// Abort the stream in both directions immediately
    fn reset(&mut self) -> io::Result<()>;
}
