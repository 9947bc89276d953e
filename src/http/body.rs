//! Bridge from the blocking CSV writer to an async response body.
//!
//! The exporter writes through [`std::io::Write`] on a blocking thread; the
//! response body is an async stream. [`ChannelWriter`] sends each encoded
//! chunk over a bounded channel. A full channel blocks the exporter, which is
//! the only backpressure there is. A dropped receiver (client gone) turns the
//! next write into a `BrokenPipe` error that ends the export.

use axum::body::{Body, Bytes};
use std::io::{self, Write};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Item type carried to the response body.
pub type Chunk = io::Result<Bytes>;

/// [`Write`] adapter feeding a bounded channel.
///
/// Must be used from a blocking context (e.g. `spawn_blocking`), never from
/// inside an async task.
#[derive(Debug)]
pub struct ChannelWriter {
    tx: mpsc::Sender<Chunk>,
    bytes_sent: usize,
}

impl ChannelWriter {
    /// Wraps a channel sender.
    #[must_use]
    pub const fn new(tx: mpsc::Sender<Chunk>) -> Self {
        Self { tx, bytes_sent: 0 }
    }

    /// Bytes handed to the channel so far.
    #[must_use]
    pub const fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response stream closed"))?;
        self.bytes_sent += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.tx.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response stream closed",
            ));
        }
        Ok(())
    }
}

/// Runs `job` on a blocking thread and streams what it writes as a body.
///
/// At most `buffer` chunks are queued ahead of the client. If `job` fails,
/// the body ends with an error instead of a clean end of stream, so a client
/// never mistakes a truncated export for a complete one.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_streaming_body<F, T>(buffer: usize, job: F) -> Body
where
    F: FnOnce(ChannelWriter) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let abort = tx.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = job(ChannelWriter::new(tx)) {
            // The receiver is gone if the client disconnected.
            let _ = abort.blocking_send(Err(io::Error::other(e.to_string())));
        }
    });
    Body::from_stream(ReceiverStream::new(rx))
}
