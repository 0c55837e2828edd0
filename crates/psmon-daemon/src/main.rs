//! # psmon-daemon
//!
//! Monitor server binary — wires the registry, collectors, and the
//! HTTP/WebSocket server together and runs until interrupted.

#![deny(unsafe_code)]

mod logging;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use psmon_collect::{HostSource, InterfaceCollector, NetworkSource, SystemCollector};
use psmon_core::WorkerRegistry;
use psmon_server::config::ServerConfig;
use psmon_server::metrics;
use psmon_server::server::MonitorServer;

/// Local host/network telemetry streaming service.
#[derive(Parser, Debug)]
#[command(name = "psmon-daemon", about = "Local telemetry streaming service")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "4500")]
    port: u16,

    /// Execution slots for blocking collector calls.
    #[arg(long, default_value = "16")]
    pool_slots: usize,

    /// Seconds an unclaimed worker token stays valid.
    #[arg(long, default_value = "3")]
    claim_ttl_secs: u64,

    /// Network interface to stream (first non-loopback when omitted).
    #[arg(long)]
    nic: Option<String>,

    /// Emit logs as newline-delimited JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_logs);

    let metrics_handle = metrics::install_recorder();

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        pool_slots: cli.pool_slots,
        claim_ttl_secs: cli.claim_ttl_secs,
        nic: cli.nic.clone(),
        ..ServerConfig::default()
    };

    let registry = Arc::new(WorkerRegistry::new());
    let host: Arc<dyn HostSource> = Arc::new(SystemCollector::new());
    let net: Arc<dyn NetworkSource> = Arc::new(InterfaceCollector::new(cli.nic));

    let server = MonitorServer::new(config, registry, host, net, metrics_handle);
    let (addr, serve_task) = server.listen().await?;
    tracing::info!(addr = %addr, "psmon ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");
    server.shutdown().signal();
    server.shutdown().drain(vec![serve_task], None).await;
    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["psmon-daemon"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 4500);
        assert_eq!(cli.pool_slots, 16);
        assert_eq!(cli.claim_ttl_secs, 3);
        assert!(cli.nic.is_none());
        assert!(!cli.json_logs);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from([
            "psmon-daemon",
            "--host",
            "0.0.0.0",
            "--port",
            "0",
            "--pool-slots",
            "4",
            "--claim-ttl-secs",
            "10",
            "--nic",
            "eth0",
            "--json-logs",
        ]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 0);
        assert_eq!(cli.pool_slots, 4);
        assert_eq!(cli.claim_ttl_secs, 10);
        assert_eq!(cli.nic.as_deref(), Some("eth0"));
        assert!(cli.json_logs);
    }
}
