//! Worker process wiring.
//!
//! A worker serves the user API from a local replica and forwards every
//! write to the coordinator over its own stdio; nothing is ever committed
//! locally. Logs go to stderr, stdout belongs to the replication link.
//! When stdin reaches EOF the coordinator is gone and the worker exits.

use axum::middleware;
use tokio::sync::mpsc;

use crate::api::middleware::request_tracing;
use crate::api::routes::{router, ApiContext};
use crate::common::{Result, WorkerConfig};
use crate::store::UserStore;
use crate::worker::sync;

pub struct WorkerServer {
    config: WorkerConfig,
}

impl WorkerServer {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        let store = UserStore::replica().into_shared();
        let (upstream_tx, upstream_rx) = mpsc::unbounded_channel();
        let app = router(ApiContext::forwarding(store.clone(), upstream_tx))
            .layer(middleware::from_fn(request_tracing));

        // Workers are internal: they only ever answer the balancer.
        let listener =
            tokio::net::TcpListener::bind(format!("127.0.0.1:{}", self.config.port)).await?;
        tracing::info!(port = self.config.port, "worker listening");

        let outbound = tokio::spawn(sync::run_outbound(upstream_rx, tokio::io::stdout()));
        let inbound = tokio::spawn(sync::run_inbound(store, tokio::io::stdin()));

        tokio::select! {
            res = axum::serve(listener, app) => {
                if let Err(e) = res {
                    tracing::error!("worker server error: {}", e);
                }
            }
            _ = inbound => {
                tracing::info!("replication link closed, exiting");
            }
            res = outbound => {
                tracing::warn!("outbound replication stopped: {:?}", res);
            }
        }

        Ok(())
    }
}
