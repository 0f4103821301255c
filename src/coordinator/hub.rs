//! The replication hub: sole owner of the authoritative user store.
//!
//! Every state change in the cluster funnels through this one task.
//! Worker links push inbound messages onto a single event queue; the hub
//! applies mutations to its store one at a time and pushes a full snapshot
//! to every registered link after each one. Snapshot delivery is
//! fire-and-forget: a slow or dead link drops the snapshot and catches up
//! from a later one (or asks for one when its replacement worker boots).
//!
//! Because the store is owned by the hub rather than shared, there is no
//! locking anywhere on the write path and mutations from different workers
//! interleave at whole-message granularity.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coordinator::SlotId;
use crate::ipc::ReplicationMessage;
use crate::store::UserStore;

/// How many outbound snapshots may queue per worker link before new ones
/// are dropped.
pub const LINK_QUEUE: usize = 64;

/// Everything the hub reacts to.
#[derive(Debug)]
pub enum HubEvent {
    /// A message arrived from the worker in this slot.
    Inbound(SlotId, ReplicationMessage),
    /// A freshly spawned worker's stdin is ready to receive snapshots.
    LinkUp(SlotId, mpsc::Sender<ReplicationMessage>),
    /// The worker in this slot exited; stop sending to it.
    LinkDown(SlotId),
}

/// Cheap handle for feeding events to the hub from other tasks.
#[derive(Clone)]
pub struct HubHandle {
    events: mpsc::UnboundedSender<HubEvent>,
}

impl HubHandle {
    pub fn inbound(&self, slot: SlotId, msg: ReplicationMessage) {
        self.send(HubEvent::Inbound(slot, msg));
    }

    pub fn link_up(&self, slot: SlotId, tx: mpsc::Sender<ReplicationMessage>) {
        self.send(HubEvent::LinkUp(slot, tx));
    }

    pub fn link_down(&self, slot: SlotId) {
        self.send(HubEvent::LinkDown(slot));
    }

    fn send(&self, event: HubEvent) {
        if self.events.send(event).is_err() {
            debug!("replication hub is gone, event dropped");
        }
    }
}

#[cfg(test)]
impl HubHandle {
    /// A handle wired to a bare receiver, for tests that observe events
    /// without running a hub task.
    pub(crate) fn test_pair() -> (Self, mpsc::UnboundedReceiver<HubEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }
}

/// The hub task state. Create with [`ReplicationHub::new`], then hand the
/// hub to `tokio::spawn(hub.run())` and keep the handle.
pub struct ReplicationHub {
    store: UserStore,
    events: mpsc::UnboundedReceiver<HubEvent>,
    links: HashMap<SlotId, mpsc::Sender<ReplicationMessage>>,
}

impl ReplicationHub {
    pub fn new() -> (HubHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            store: UserStore::authoritative(),
            events: rx,
            links: HashMap::new(),
        };
        (HubHandle { events: tx }, hub)
    }

    /// Process events until every handle is dropped.
    pub async fn run(mut self) {
        info!("replication hub started");
        while let Some(event) = self.events.recv().await {
            self.handle(event);
        }
        info!("replication hub stopped");
    }

    fn handle(&mut self, event: HubEvent) {
        match event {
            HubEvent::Inbound(slot, ReplicationMessage::Mutate(mutation)) => {
                info!(slot, kind = mutation.kind(), "committing mutation");
                self.store.apply(mutation);
                self.broadcast_snapshot();
            }
            HubEvent::Inbound(slot, ReplicationMessage::SnapshotRequest) => {
                debug!(slot, "snapshot requested");
                self.send_snapshot(slot);
            }
            HubEvent::Inbound(slot, ReplicationMessage::Snapshot(_)) => {
                // Workers have nothing authoritative to push; answer with
                // the real state instead.
                warn!(slot, "worker sent a snapshot, replying with ours");
                self.send_snapshot(slot);
            }
            HubEvent::LinkUp(slot, tx) => {
                debug!(slot, "replication link up");
                self.links.insert(slot, tx);
            }
            HubEvent::LinkDown(slot) => {
                debug!(slot, "replication link down");
                self.links.remove(&slot);
            }
        }
    }

    /// Push the current state to every link. Full or closed queues drop
    /// the snapshot for that link only.
    fn broadcast_snapshot(&self) {
        let users = self.store.list();
        for (&slot, link) in &self.links {
            if let Err(e) = link.try_send(ReplicationMessage::Snapshot(users.clone())) {
                debug!(slot, "snapshot dropped: {}", e);
            }
        }
    }

    fn send_snapshot(&self, slot: SlotId) {
        let Some(link) = self.links.get(&slot) else {
            debug!(slot, "no link for requested snapshot");
            return;
        };
        if let Err(e) = link.try_send(ReplicationMessage::Snapshot(self.store.list())) {
            debug!(slot, "snapshot dropped: {}", e);
        }
    }
}
