// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client session registry: accept loop, delivery, zombie sweep.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::client::fix;
use crate::codec::FixMessage;
use crate::controller::ProxyEvent;
use crate::settings::Settings;
use crate::shared::Shared;

struct Handle {
    deliver_tx: mpsc::UnboundedSender<FixMessage>,
    cancel: CancellationToken,
}

pub struct Manager {
    settings: Arc<Settings>,
    shared: Arc<Shared>,
    event_tx: mpsc::UnboundedSender<ProxyEvent>,
    cancel: CancellationToken,
    sessions: RwLock<HashMap<u64, Handle>>,
}

impl Manager {
    pub fn new(
        settings: Arc<Settings>,
        shared: Arc<Shared>,
        event_tx: mpsc::UnboundedSender<ProxyEvent>,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self { settings, shared, event_tx, cancel, sessions: RwLock::new(HashMap::new()) })
    }

    /// Allocate a session id and register a delivery channel for it.
    pub async fn register(&self) -> (u64, mpsc::UnboundedReceiver<FixMessage>, CancellationToken) {
        let session_id = self.shared.next_session_id();
        let (deliver_tx, deliver_rx) = mpsc::unbounded_channel();
        let cancel = self.cancel.child_token();
        let handle = Handle { deliver_tx, cancel: cancel.clone() };
        self.sessions.write().await.insert(session_id, handle);
        (session_id, deliver_rx, cancel)
    }

    /// Deliver a venue message to one client session.
    pub async fn deliver(&self, session_id: u64, message: FixMessage) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&session_id) {
            Some(handle) => handle.deliver_tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Fan a venue message out to every client session.
    pub async fn broadcast(&self, message: &FixMessage) {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            let _ = handle.deliver_tx.send(message.clone());
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drain the reap queue: drop handles and cancel zombie session tasks.
    pub async fn sweep(&self) {
        let mut reaped = Vec::new();
        self.shared.session_cleanup(|session_id| reaped.push(session_id));
        if reaped.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().await;
        for session_id in reaped {
            if let Some(handle) = sessions.remove(&session_id) {
                handle.cancel.cancel();
                tracing::debug!(session_id, "session reaped");
            }
        }
    }

    /// Accept downstream FIX/TCP connections until shutdown.
    pub fn spawn_fix_listener(self: &Arc<Self>, listener: TcpListener) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let accepted = tokio::select! {
                    _ = manager.cancel.cancelled() => break,
                    accepted = listener.accept() => accepted,
                };
                match accepted {
                    Ok((stream, peer)) => {
                        let (session_id, deliver_rx, cancel) = manager.register().await;
                        tracing::debug!(session_id, peer = %peer, "client accepted");
                        let session = fix::Session::new(
                            session_id,
                            Arc::clone(&manager.settings),
                            Arc::clone(&manager.shared),
                            manager.event_tx.clone(),
                            cancel,
                        );
                        tokio::spawn(session.run(stream, deliver_rx));
                    }
                    Err(e) => {
                        tracing::warn!(err = %e, "accept failed");
                    }
                }
            }
        });
    }
}
