// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fixgate: a FIX 4.4 proxy between downstream trading clients (FIX/TCP or
//! JSON-RPC over WebSocket) and upstream venues.

pub mod client;
pub mod codec;
pub mod config;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod server;
pub mod settings;
pub mod shared;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::controller::Controller;
use crate::settings::{Connection, Settings};
use crate::shared::Shared;

/// Run the gateway until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let config = Config::parse_file(&settings.config_file)?;
    let connections = settings
        .connections
        .iter()
        .map(|arg| Connection::parse(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let settings = Arc::new(settings);
    let shared = Arc::new(Shared::new(settings.crypto_method(), &config)?);
    let shutdown = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let server_manager =
        server::Manager::new(&settings, &shared, event_tx.clone(), &shutdown, &connections);

    let client_manager = client::Manager::new(
        Arc::clone(&settings),
        Arc::clone(&shared),
        event_tx.clone(),
        shutdown.clone(),
    );

    let fix_addr = format!("{}:{}", settings.host, settings.fix_port);
    let fix_listener = TcpListener::bind(&fix_addr).await?;
    tracing::info!(addr = %fix_addr, "fix listener bound");
    client_manager.spawn_fix_listener(fix_listener);

    let json_addr = format!("{}:{}", settings.host, settings.json_port);
    let json_listener = TcpListener::bind(&json_addr).await?;
    tracing::info!(addr = %json_addr, "json listener bound");
    let router = client::json::build_router(client::json::AppState {
        settings: Arc::clone(&settings),
        shared: Arc::clone(&shared),
        manager: Arc::clone(&client_manager),
        event_tx: event_tx.clone(),
    });
    let serve_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(json_listener, router)
            .with_graceful_shutdown(serve_shutdown.cancelled_owned())
            .await
        {
            tracing::error!(err = %e, "json listener failed");
        }
    });

    // Signals end the controller loop; the token fans out to every session.
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("signal received, shutting down");
            signal_shutdown.cancel();
        }
    });

    let controller =
        Controller::new(shared, server_manager, client_manager, event_rx, shutdown.clone());
    controller.run().await;

    Ok(())
}
