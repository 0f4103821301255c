//! Worker process supervision.
//!
//! One supervision task per slot. Each task spawns its worker with the
//! slot's fixed port, wires the child's stdio into the replication hub,
//! and waits. When the worker dies, for any reason, with any exit status,
//! a replacement is spawned immediately on the same port; the slot's
//! position in the balancer rotation never changes. There is no exit
//! handshake and no backoff between respawns, only spawn failures
//! themselves are retried on a short delay so a missing binary cannot
//! spin the loop.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::common::{Error, Result, WORKER_PORT_ENV};
use crate::coordinator::hub::{HubHandle, LINK_QUEUE};
use crate::coordinator::SlotId;
use crate::ipc::{MessageReader, MessageWriter};

const SPAWN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How worker processes get launched.
///
/// The default is to re-invoke the current executable with the `worker`
/// subcommand; the port travels in an environment variable. Children are
/// killed when their handle drops, so workers cannot outlive the
/// coordinator.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
}

impl WorkerLauncher {
    pub fn from_current_exe() -> Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
        })
    }

    /// Launch an explicit program instead of the current executable. It
    /// still receives the `worker` subcommand and the port variable.
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    fn spawn(&self, port: u16) -> std::io::Result<Child> {
        Command::new(&self.program)
            .arg("worker")
            .env(WORKER_PORT_ENV, port.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

pub struct Supervisor {
    launcher: WorkerLauncher,
    hub: HubHandle,
}

impl Supervisor {
    pub fn new(launcher: WorkerLauncher, hub: HubHandle) -> Self {
        Self { launcher, hub }
    }

    /// Start one supervision task per slot. Tasks run until the process
    /// exits; the returned handles are only useful for aborting in tests.
    pub fn start(&self, ports: &[u16]) -> Vec<JoinHandle<()>> {
        ports
            .iter()
            .enumerate()
            .map(|(slot, &port)| {
                let launcher = self.launcher.clone();
                let hub = self.hub.clone();
                tokio::spawn(supervise_slot(slot, port, launcher, hub))
            })
            .collect()
    }
}

async fn supervise_slot(slot: SlotId, port: u16, launcher: WorkerLauncher, hub: HubHandle) {
    loop {
        let mut child = match launcher.spawn(port) {
            Ok(child) => child,
            Err(e) => {
                error!(slot, port, "failed to spawn worker: {}", e);
                tokio::time::sleep(SPAWN_RETRY_DELAY).await;
                continue;
            }
        };
        info!(slot, port, pid = child.id(), "worker started");

        match run_worker(slot, &mut child, &hub).await {
            Ok(status) => warn!(slot, port, %status, "worker exited"),
            Err(e) => error!(slot, port, "lost track of worker: {}", e),
        }
        hub.link_down(slot);
        info!(slot, port, "respawning worker");
    }
}

/// Bridge the child's stdio to the hub and wait for it to exit.
///
/// The helper tasks die with the child: the stdout reader sees EOF, the
/// stdin writer fails its next write, and whatever is left gets aborted
/// once `wait` returns.
async fn run_worker(slot: SlotId, child: &mut Child, hub: &HubHandle) -> std::io::Result<ExitStatus> {
    let (tx, mut rx) = mpsc::channel(LINK_QUEUE);
    let mut tasks = Vec::new();

    if let Some(stdin) = child.stdin.take() {
        tasks.push(tokio::spawn(async move {
            let mut writer = MessageWriter::new(stdin);
            while let Some(msg) = rx.recv().await {
                if let Err(e) = writer.send(&msg).await {
                    debug!(slot, "replication write failed: {}", e);
                    break;
                }
            }
        }));
    }
    hub.link_up(slot, tx);

    if let Some(stdout) = child.stdout.take() {
        let hub = hub.clone();
        tasks.push(tokio::spawn(async move {
            let mut reader = MessageReader::new(stdout);
            loop {
                match reader.recv().await {
                    Ok(Some(msg)) => hub.inbound(slot, msg),
                    Ok(None) => break,
                    Err(e @ Error::Protocol(_)) => {
                        warn!(slot, "bad message from worker: {}", e);
                    }
                    Err(e) => {
                        debug!(slot, "replication read failed: {}", e);
                        break;
                    }
                }
            }
        }));
    }

    if let Some(stderr) = child.stderr.take() {
        tasks.push(tokio::spawn(drain_worker_stderr(slot, stderr)));
    }

    let status = child.wait().await;
    for task in tasks {
        task.abort();
    }
    status
}

/// Re-emit the worker's stderr on the coordinator's log, tagged with the
/// slot. Workers log plain lines to stderr precisely so this stays a
/// passthrough.
async fn drain_worker_stderr(slot: SlotId, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => info!(slot, "worker: {}", line),
            Ok(None) => return,
            Err(e) => {
                debug!(slot, "stderr drain failed: {}", e);
                return;
            }
        }
    }
}
