//! Streaming delivery of stored objects.
//!
//! Bytes flow from disk to a [`DeliverySink`] in bounded chunks. A failure
//! before the head went out is an error the caller can still turn into a
//! status code. After the head, the only honest thing left is to cut the
//! connection, so the sink is aborted and the outcome reports truncation.

use std::io;
use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use photovault_core::constants::DELIVERY_CONTENT_TYPE;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio_util::io::ReaderStream;

use crate::resolver::StorageLocation;
use crate::traits::{DeliveryHead, DeliverySink, SinkClosed, StorageError, StorageResult};

/// Read size per chunk.
pub const DELIVERY_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Completed { bytes_sent: u64 },
    /// Downstream went away; nothing more to do.
    ClientDisconnected { bytes_sent: u64 },
    /// Read failed after the head was sent.
    Truncated { bytes_sent: u64 },
}

pub fn cache_control(cache_ttl_secs: u64) -> String {
    format!("private, max-age={}", cache_ttl_secs)
}

/// Stream the file at `location` into `sink`.
pub async fn deliver<S>(
    location: &StorageLocation,
    sink: &mut S,
    cache_ttl_secs: u64,
) -> StorageResult<DeliveryOutcome>
where
    S: DeliverySink + ?Sized,
{
    deliver_path(&location.physical, sink, cache_ttl_secs).await
}

pub async fn deliver_path<S>(
    physical: &Path,
    sink: &mut S,
    cache_ttl_secs: u64,
) -> StorageResult<DeliveryOutcome>
where
    S: DeliverySink + ?Sized,
{
    let file = tokio::fs::File::open(physical).await.map_err(|e| {
        tracing::error!(error = %e, path = %physical.display(), "Failed to open object for delivery");
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(physical.display().to_string())
        } else {
            StorageError::DownloadFailed(format!("Failed to open object: {}", e))
        }
    })?;

    let metadata = file.metadata().await.map_err(|e| {
        tracing::error!(error = %e, path = %physical.display(), "Failed to read object metadata");
        StorageError::DownloadFailed(format!("Failed to read object metadata: {}", e))
    })?;

    deliver_from_reader(file, metadata.len(), sink, cache_ttl_secs).await
}

pub(crate) async fn deliver_from_reader<R, S>(
    reader: R,
    content_length: u64,
    sink: &mut S,
    cache_ttl_secs: u64,
) -> StorageResult<DeliveryOutcome>
where
    R: AsyncRead + Send + Unpin,
    S: DeliverySink + ?Sized,
{
    let head = DeliveryHead {
        content_length,
        content_type: DELIVERY_CONTENT_TYPE,
        cache_control: cache_control(cache_ttl_secs),
    };

    if sink.send_head(head).await.is_err() {
        tracing::debug!("Client went away before delivery started");
        return Ok(DeliveryOutcome::ClientDisconnected { bytes_sent: 0 });
    }

    let mut stream = ReaderStream::with_capacity(reader, DELIVERY_CHUNK_SIZE);
    let mut bytes_sent: u64 = 0;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                let len = chunk.len() as u64;
                if sink.send_chunk(chunk).await.is_err() {
                    tracing::debug!(bytes_sent, content_length, "Client disconnected during delivery");
                    return Ok(DeliveryOutcome::ClientDisconnected { bytes_sent });
                }
                bytes_sent += len;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bytes_sent,
                    content_length,
                    "Read failed mid-delivery, terminating response"
                );
                sink.abort(format!("read failed after {} bytes: {}", bytes_sent, e))
                    .await;
                return Ok(DeliveryOutcome::Truncated { bytes_sent });
            }
        }
    }

    tracing::debug!(bytes_sent, "Delivery completed");
    Ok(DeliveryOutcome::Completed { bytes_sent })
}

/// Sink that forwards into a bounded channel consumed by an HTTP body.
pub struct ChannelSink {
    head: Option<oneshot::Sender<DeliveryHead>>,
    body: mpsc::Sender<Result<Bytes, io::Error>>,
}

/// Body half of a [`ChannelSink`]. Errors end the response mid-stream.
pub type DeliveryBody = std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Build a sink together with the receiving ends for its head and body.
///
/// `buffer` bounds how many chunks may sit in memory between the reader and
/// the connection.
pub fn channel_sink(buffer: usize) -> (ChannelSink, oneshot::Receiver<DeliveryHead>, DeliveryBody) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(buffer.max(1));

    let body = futures::stream::unfold(body_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    (
        ChannelSink {
            head: Some(head_tx),
            body: body_tx,
        },
        head_rx,
        Box::pin(body),
    )
}

#[async_trait::async_trait]
impl DeliverySink for ChannelSink {
    async fn send_head(&mut self, head: DeliveryHead) -> Result<(), SinkClosed> {
        let tx = self.head.take().ok_or(SinkClosed)?;
        tx.send(head).map_err(|_| SinkClosed)
    }

    async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SinkClosed> {
        self.body.send(Ok(chunk)).await.map_err(|_| SinkClosed)
    }

    async fn abort(&mut self, reason: String) {
        let _ = self.body.send(Err(io::Error::other(reason))).await;
    }
}
