//! ais-bridge: reconnecting SBS-to-AIS bridge daemon.
//!
//! Composition root only — constructs the config, the upstream reader, and
//! the downstream publisher, wires them together, and handles shutdown. No
//! pipeline logic lives here (§12).

mod config;
mod downstream;
mod upstream;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use downstream::DownstreamServer;
use upstream::UpstreamClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let config = Config::parse();
    let (ais_host, ais_port) = config.ais_sender_addr();

    let listener = match TcpListener::bind((ais_host.as_str(), ais_port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(host = %ais_host, port = ais_port, error = %e, "failed to bind downstream listener");
            return ExitCode::FAILURE;
        }
    };
    info!(host = %ais_host, port = ais_port, "downstream listener bound");

    let downstream = Arc::new(DownstreamServer::new());
    let (ads_host, ads_port) = config.ads_receiver_addr();
    let upstream = UpstreamClient::new(ads_host, ads_port, config.ads_reconnect_delay_seconds);

    let cancel = CancellationToken::new();

    let accept_handle = {
        let downstream = downstream.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { downstream.accept_loop(listener, cancel).await })
    };

    let upstream_handle = {
        let downstream = downstream.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { upstream.run(&downstream, cancel).await })
    };

    wait_for_stop_signal().await;
    info!("shutdown requested");
    cancel.cancel();

    let _ = accept_handle.await;
    let _ = upstream_handle.await;
    downstream.shutdown().await;

    info!("ais-bridge stopped");
    ExitCode::SUCCESS
}

/// Waits for SIGINT or SIGTERM. A second signal while already shutting down
/// forces an immediate exit rather than waiting on in-flight tasks.
async fn wait_for_stop_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
            error!("second stop signal received, forcing exit");
            std::process::exit(1);
        });
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
