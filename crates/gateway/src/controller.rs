// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level routing loop: timer ticks, shutdown, and cross-side dispatch of
//! session traffic by username.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client;
use crate::client::session::business_reject;
use crate::codec::{self, FixMessage};
use crate::error::Error;
use crate::server;
use crate::shared::Shared;

/// Semantic traffic emitted by sessions, routed here.
#[derive(Debug)]
pub enum ProxyEvent {
    /// A validated business request from a client session.
    FromClient { session_id: u64, username: String, message: FixMessage },
    /// A venue message; `username` is the routing key, `None` broadcasts.
    FromServer { component: String, username: Option<String>, message: FixMessage },
}

pub struct Controller {
    shared: Arc<Shared>,
    server_manager: server::Manager,
    client_manager: Arc<client::Manager>,
    event_rx: mpsc::UnboundedReceiver<ProxyEvent>,
    shutdown: CancellationToken,
}

enum Turn {
    Stopped,
    Event(Option<ProxyEvent>),
    Tick,
}

impl Controller {
    pub fn new(
        shared: Arc<Shared>,
        server_manager: server::Manager,
        client_manager: Arc<client::Manager>,
        event_rx: mpsc::UnboundedReceiver<ProxyEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { shared, server_manager, client_manager, event_rx, shutdown }
    }

    /// Run until shutdown is requested.
    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let turn = tokio::select! {
                _ = self.shutdown.cancelled() => Turn::Stopped,
                event = self.event_rx.recv() => Turn::Event(event),
                _ = tick.tick() => Turn::Tick,
            };
            match turn {
                Turn::Stopped | Turn::Event(None) => break,
                Turn::Event(Some(event)) => self.dispatch(event).await,
                Turn::Tick => self.client_manager.sweep().await,
            }
        }

        self.shared.set_accepting(false);
        // One final sweep so queued zombies do not outlive the loop.
        self.client_manager.sweep().await;
        tracing::info!("controller stopped");
    }

    async fn dispatch(&mut self, event: ProxyEvent) {
        match event {
            ProxyEvent::FromClient { session_id, username, message } => {
                self.dispatch_to_server(session_id, username, message).await;
            }
            ProxyEvent::FromServer { component, username, message } => {
                self.dispatch_to_client(component, username, message).await;
            }
        }
    }

    /// Route a client request to the venue session bound to the user's
    /// component; reject NOT_READY when the venue is unavailable.
    async fn dispatch_to_server(&mut self, session_id: u64, username: String, message: FixMessage) {
        let component = match self.shared.user(&username) {
            Some(user) => user.component,
            None => {
                tracing::warn!(session_id, username = %username, "request from unknown user");
                self.reject_not_ready(session_id, &message).await;
                return;
            }
        };
        if !self.shared.component_ready(&component) {
            self.reject_not_ready(session_id, &message).await;
            return;
        }
        if let Err(message) = self.server_manager.forward(&component, username, message) {
            self.reject_not_ready(session_id, &message).await;
        }
    }

    async fn reject_not_ready(&self, session_id: u64, message: &FixMessage) {
        let reject = business_reject(
            0,
            message,
            codec::BUSINESS_REJECT_REASON_APPLICATION_NOT_AVAILABLE,
            Error::NotReady.as_str(),
        );
        if !self.client_manager.deliver(session_id, reject).await {
            tracing::debug!(session_id, "client gone, reject dropped");
        }
    }

    /// Route a venue response to the client bound to `username`, or fan out
    /// broadcasts (security definitions) to every client session.
    async fn dispatch_to_client(
        &mut self,
        component: String,
        username: Option<String>,
        message: FixMessage,
    ) {
        let Some(username) = username else {
            self.client_manager.broadcast(&message).await;
            return;
        };
        let Some(session_id) = self.shared.session_find(&username) else {
            tracing::debug!(
                component = %component,
                username = %username,
                msg_type = message.msg_type().wire(),
                "client gone, venue message dropped"
            );
            return;
        };
        if !self.client_manager.deliver(session_id, message).await {
            tracing::debug!(session_id, username = %username, "client channel closed");
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
