//! minihive binary.
//!
//! Three ways to run:
//! - `minihive serve` starts a single-process server, no workers.
//! - `minihive cluster` starts the coordinator, which spawns and
//!   supervises the worker pool behind a round-robin load balancer.
//! - `minihive worker` is how the coordinator launches each worker; it is
//!   hidden because its stdio is the replication link and running it by
//!   hand gets you a worker wired to your terminal.

use clap::{Parser, Subcommand};
use minihive::common::{ClusterConfig, Config, ServeConfig, WorkerConfig, WORKER_PORT_ENV};
use minihive::{Coordinator, StandaloneServer, WorkerServer};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minihive")]
#[command(about = "Clustered in-memory user API with a supervised worker pool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a single-process server without workers
    Serve {
        /// Port for the HTTP API
        #[arg(long)]
        port: Option<u16>,
    },

    /// Start the coordinator: load balancer plus supervised worker pool
    Cluster {
        /// Port for the load balancer; worker slot `i` listens on port + i
        #[arg(long)]
        port: Option<u16>,

        /// Worker pool size (defaults to available cores minus one)
        #[arg(long)]
        workers: Option<usize>,

        /// Program to spawn per worker slot instead of this binary
        #[arg(long, hide = true)]
        worker_command: Option<PathBuf>,
    },

    /// Run one worker (spawned by the coordinator)
    #[command(hide = true)]
    Worker {
        /// Port override for running a worker by hand
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = Config::load();

    // Logs always go to stderr: in a worker, stdout carries the
    // replication link. Color only when stderr is a terminal; worker
    // stderr is a pipe to the coordinator, which re-logs it.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&file.log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();

    match cli.command {
        Commands::Serve { port } => {
            let defaults = ServeConfig::default();
            let config = ServeConfig {
                port: port.or(file.port).unwrap_or(defaults.port),
            };
            StandaloneServer::new(config).serve().await?;
        }
        Commands::Cluster {
            port,
            workers,
            worker_command,
        } => {
            let defaults = ClusterConfig::default();
            let config = ClusterConfig {
                port: port.or(file.port).unwrap_or(defaults.port),
                workers: workers.or(file.workers).unwrap_or(defaults.workers),
                worker_command,
            };
            Coordinator::new(config).serve().await?;
        }
        Commands::Worker { port } => {
            let port = match port {
                Some(port) => port,
                None => std::env::var(WORKER_PORT_ENV)
                    .map_err(|_| {
                        anyhow::anyhow!(
                            "{WORKER_PORT_ENV} is not set; workers are spawned by the coordinator"
                        )
                    })?
                    .parse::<u16>()?,
            };
            WorkerServer::new(WorkerConfig { port }).serve().await?;
        }
    }

    Ok(())
}
