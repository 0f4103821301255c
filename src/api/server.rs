//! Standalone single-process server.
//!
//! Runs the user API against a local authoritative store, with no workers
//! and no replication. Useful for development and for exercising the API
//! without cluster plumbing.

use axum::middleware;

use crate::api::middleware::request_tracing;
use crate::api::routes::{router, ApiContext};
use crate::common::{Result, ServeConfig};
use crate::store::UserStore;

pub struct StandaloneServer {
    config: ServeConfig,
}

impl StandaloneServer {
    pub fn new(config: ServeConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        let store = UserStore::authoritative().into_shared();
        let app = router(ApiContext::local(store)).layer(middleware::from_fn(request_tracing));

        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(port = self.config.port, "standalone server listening");

        tokio::select! {
            res = axum::serve(listener, app) => {
                if let Err(e) = res {
                    tracing::error!("server error: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
            }
        }

        Ok(())
    }
}
