//! Coordinator wiring.
//!
//! The coordinator runs three things side by side: the replication hub
//! that owns the authoritative store, one supervision task per worker
//! slot, and the public load balancer. Workers are separate OS processes;
//! everything else lives on this process's runtime.

use axum::middleware;

use crate::api::middleware::request_tracing;
use crate::common::{ClusterConfig, Error, Result};
use crate::coordinator::balancer::{self, BalancerState};
use crate::coordinator::hub::ReplicationHub;
use crate::coordinator::supervisor::{Supervisor, WorkerLauncher};

pub struct Coordinator {
    config: ClusterConfig,
}

impl Coordinator {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        let worker_ports = self.config.worker_ports()?;
        if worker_ports.is_empty() {
            return Err(Error::InvalidConfig(
                "worker pool must have at least one slot".into(),
            ));
        }
        tracing::info!(
            port = self.config.port,
            workers = worker_ports.len(),
            "starting coordinator"
        );

        let (hub_handle, hub) = ReplicationHub::new();
        let hub_task = tokio::spawn(hub.run());

        let launcher = match &self.config.worker_command {
            Some(program) => WorkerLauncher::new(program.clone()),
            None => WorkerLauncher::from_current_exe()?,
        };
        let supervisor = Supervisor::new(launcher, hub_handle);
        let _slots = supervisor.start(&worker_ports);

        let app = balancer::router(BalancerState::new(worker_ports))
            .layer(middleware::from_fn(request_tracing));
        let listener =
            tokio::net::TcpListener::bind(format!("0.0.0.0:{}", self.config.port)).await?;
        tracing::info!(port = self.config.port, "load balancer listening");

        tokio::select! {
            res = axum::serve(listener, app) => {
                if let Err(e) = res {
                    tracing::error!("load balancer error: {}", e);
                }
            }
            res = hub_task => {
                tracing::error!("replication hub stopped unexpectedly: {:?}", res);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
            }
        }

        // Dropping the supervisors' children kills the worker pool; their
        // stdin pipes close first, so workers that are mid-write get EOF
        // rather than a broken pipe.
        Ok(())
    }
}
