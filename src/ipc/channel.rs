//! Message framing for replication links.
//!
//! A link is a pair of byte streams carrying newline-delimited JSON, one
//! message per line. Between coordinator and worker the streams are the
//! worker's stdin and stdout, but the framing is generic over any
//! `AsyncRead`/`AsyncWrite` so tests can run it over in-memory pipes.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::common::Result;
use crate::ipc::message::ReplicationMessage;

/// Writing half of a replication link.
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Encode and send one message, flushing so the peer sees it promptly.
    pub async fn send(&mut self, msg: &ReplicationMessage) -> Result<()> {
        let mut line = msg.encode()?;
        line.push('\n');
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

/// Reading half of a replication link.
pub struct MessageReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
        }
    }

    /// Receive the next message. Returns `Ok(None)` once the peer closes
    /// its end. A line that fails to decode returns an error but leaves
    /// the reader positioned at the next line, so callers can log and
    /// keep reading.
    pub async fn recv(&mut self) -> Result<Option<ReplicationMessage>> {
        loop {
            match self.lines.next_line().await? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return ReplicationMessage::decode(&line).map(Some),
            }
        }
    }
}
