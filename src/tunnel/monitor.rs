//! Error stream monitor
//!
//! One background task per tunnel drains the error stream until the remote
//! side closes it or the connection goes away. Whatever arrives is a
//! diagnostic from the remote side and is logged at error level. Nothing here
//! touches the data stream: callers see failures through their own reads and
//! writes.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::logger::Logger;
use crate::transport::MuxStream;

const READ_CHUNK: usize = 4 * 1024;
/// Bytes of a remote diagnostic kept for the log; the rest is drained and dropped
const MAX_MESSAGE: usize = 64 * 1024;

/// Handle to a running monitor task
///
/// Dropping the handle detaches the task; it still ends once the stream does.
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait up to `grace` for the task to end. Returns whether it did.
    pub async fn wait(&mut self, grace: Duration) -> bool {
        if self.task.is_finished() {
            return true;
        }
        tokio::time::timeout(grace, &mut self.task).await.is_ok()
    }
}

/// Start draining `stream` in the background
pub fn spawn_monitor(
    stream: Box<dyn MuxStream>,
    logger: Arc<dyn Logger>,
    target: String,
) -> MonitorHandle {
    MonitorHandle {
        task: tokio::spawn(drain(stream, logger, target)),
    }
}

async fn drain(mut stream: Box<dyn MuxStream>, logger: Arc<dyn Logger>, target: String) {
    let mut message = BytesMut::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    let mut truncated = false;

    let read_error = loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break None,
            Ok(n) => {
                let keep = n.min(MAX_MESSAGE - message.len());
                message.extend_from_slice(&chunk[..keep]);
                truncated |= keep < n;
            }
            Err(e) => break Some(e),
        }
    };

    if !message.is_empty() {
        logger.error(format_args!(
            "got error from error stream of {}: {}{}",
            target,
            String::from_utf8_lossy(&message).trim_end(),
            if truncated { " (truncated)" } else { "" }
        ));
    }
    if let Some(e) = read_error {
        logger.error(format_args!(
            "got error when reading error stream of {}: {}",
            target, e
        ));
    }
}
