//! In-memory tunnel transport for tests
//!
//! Every sub-stream is a `tokio::io::duplex` pair. The local end is handed to
//! the code under test; the remote end is kept in a [`Peer`] so a test can play
//! the backend. Every reset/shutdown/remove/close is appended to a shared
//! event log.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::transport::{
    BackendTarget, MuxConnection, MuxStream, StreamHeaders, StreamType, TunnelTransport,
};

const DUPLEX_BUFFER: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(BackendTarget, String),
    Create(StreamType, u32),
    Reset(u32),
    Shutdown(u32),
    Remove(u32),
    Close,
}

/// Remote side of one opened connection
#[derive(Default)]
pub struct Peer {
    pub headers: Vec<StreamHeaders>,
    pub error: Option<DuplexStream>,
    pub data: Option<DuplexStream>,
}

#[derive(Default)]
pub struct MockTransport {
    events: Arc<Mutex<Vec<Event>>>,
    peers: Arc<Mutex<Vec<Peer>>>,
    fail_upgrade: bool,
    fail_stream: Option<StreamType>,
    stall_stream: Option<StreamType>,
    stall_shutdown: bool,
    fail_reset: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upgrade(mut self) -> Self {
        self.fail_upgrade = true;
        self
    }

    pub fn failing_stream(mut self, stream_type: StreamType) -> Self {
        self.fail_stream = Some(stream_type);
        self
    }

    /// `create_stream` for `stream_type` never completes
    pub fn stalled_stream(mut self, stream_type: StreamType) -> Self {
        self.stall_stream = Some(stream_type);
        self
    }

    /// Graceful stream close never completes
    pub fn stalled_shutdown(mut self) -> Self {
        self.stall_shutdown = true;
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Take the remote ends of the `index`-th opened connection
    pub fn take_peer(&self, index: usize) -> Peer {
        std::mem::take(&mut self.peers.lock()[index])
    }
}

#[async_trait]
impl TunnelTransport for MockTransport {
    async fn open(
        &self,
        target: &BackendTarget,
        subresource: &str,
    ) -> io::Result<Box<dyn MuxConnection>> {
        if self.fail_upgrade {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "upgrade rejected",
            ));
        }

        self.events
            .lock()
            .push(Event::Open(target.clone(), subresource.to_string()));
        let index = {
            let mut peers = self.peers.lock();
            peers.push(Peer::default());
            peers.len() - 1
        };

        Ok(Box::new(MockConnection {
            index,
            events: Arc::clone(&self.events),
            peers: Arc::clone(&self.peers),
            fail_stream: self.fail_stream,
            stall_stream: self.stall_stream,
            stall_shutdown: self.stall_shutdown,
            fail_reset: self.fail_reset,
            next_id: AtomicU32::new(1),
            closed: CancellationToken::new(),
        }))
    }
}

struct MockConnection {
    index: usize,
    events: Arc<Mutex<Vec<Event>>>,
    peers: Arc<Mutex<Vec<Peer>>>,
    fail_stream: Option<StreamType>,
    stall_stream: Option<StreamType>,
    stall_shutdown: bool,
    fail_reset: bool,
    next_id: AtomicU32,
    closed: CancellationToken,
}

#[async_trait]
impl MuxConnection for MockConnection {
    async fn create_stream(&self, headers: &StreamHeaders) -> io::Result<Box<dyn MuxStream>> {
        if self.closed.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"));
        }
        if self.fail_stream == Some(headers.stream_type) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "stream refused",
            ));
        }
        if self.stall_stream == Some(headers.stream_type) {
            std::future::pending::<()>().await;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (local, remote) = tokio::io::duplex(DUPLEX_BUFFER);

        self.events.lock().push(Event::Create(headers.stream_type, id));
        {
            let mut peers = self.peers.lock();
            let peer = &mut peers[self.index];
            peer.headers.push(headers.clone());
            match headers.stream_type {
                StreamType::Error => peer.error = Some(remote),
                StreamType::Data => peer.data = Some(remote),
            }
        }

        Ok(Box::new(MockStream {
            id,
            inner: local,
            events: Arc::clone(&self.events),
            closed: self.closed.clone(),
            closed_wait: Box::pin(self.closed.clone().cancelled_owned()),
            reset: false,
            stall_shutdown: self.stall_shutdown,
            fail_reset: self.fail_reset,
        }))
    }

    fn remove_stream(&self, id: u32) {
        self.events.lock().push(Event::Remove(id));
    }

    fn close(&self) -> io::Result<()> {
        self.events.lock().push(Event::Close);
        self.closed.cancel();
        Ok(())
    }
}

struct MockStream {
    id: u32,
    inner: DuplexStream,
    events: Arc<Mutex<Vec<Event>>>,
    closed: CancellationToken,
    closed_wait: Pin<Box<WaitForCancellationFutureOwned>>,
    reset: bool,
    stall_shutdown: bool,
    fail_reset: bool,
}

impl MuxStream for MockStream {
    fn identifier(&self) -> u32 {
        self.id
    }

    fn reset(&mut self) -> io::Result<()> {
        self.events.lock().push(Event::Reset(self.id));
        self.reset = true;
        if self.fail_reset {
            return Err(io::Error::new(io::ErrorKind::Other, "reset rejected"));
        }
        Ok(())
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.reset {
            return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
        }
        // Closing the connection ends every stream on it
        if self.closed_wait.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.reset || self.closed.is_cancelled() {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let id = self.id;
        self.events.lock().push(Event::Shutdown(id));
        if self.stall_shutdown {
            return Poll::Pending;
        }
        if self.reset {
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
