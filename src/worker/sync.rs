//! Replica synchronization over the coordinator link.
//!
//! Two pumps, one per direction. Outbound carries handler-forwarded
//! mutations (and the startup snapshot request) to the coordinator.
//! Inbound applies snapshots to the replica; a snapshot replaces the
//! replica wholesale, it is never merged. Both are generic over the
//! underlying streams so tests can run them over in-memory pipes instead
//! of real stdio.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::common::{Error, Result};
use crate::ipc::{MessageReader, MessageWriter, ReplicationMessage};
use crate::store::SharedUserStore;

/// Pump forwarded messages to the coordinator. Sends a snapshot request
/// first so a fresh worker converges without waiting for the next write
/// elsewhere in the cluster.
pub async fn run_outbound<W>(
    mut rx: mpsc::UnboundedReceiver<ReplicationMessage>,
    link: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = MessageWriter::new(link);
    writer.send(&ReplicationMessage::SnapshotRequest).await?;
    while let Some(msg) = rx.recv().await {
        writer.send(&msg).await?;
    }
    Ok(())
}

/// Apply inbound snapshots to the replica until the link closes.
///
/// Returns when the coordinator goes away; the caller treats that as the
/// worker's cue to exit. Anything other than a snapshot is out of
/// contract coming from the coordinator and is logged and skipped.
pub async fn run_inbound<R>(store: SharedUserStore, link: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = MessageReader::new(link);
    loop {
        match reader.recv().await {
            Ok(Some(ReplicationMessage::Snapshot(users))) => {
                debug!(count = users.len(), "applying snapshot");
                store.write().unwrap().replace_all(users);
            }
            Ok(Some(msg)) => {
                warn!(kind = msg.kind(), "unexpected message from coordinator");
            }
            Ok(None) => return,
            Err(e @ Error::Protocol(_)) => {
                warn!("bad message from coordinator: {}", e);
            }
            Err(e) => {
                debug!("link read failed: {}", e);
                return;
            }
        }
    }
}
