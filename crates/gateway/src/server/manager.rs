// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::codec::FixMessage;
use crate::controller::ProxyEvent;
use crate::server::session::{Command, Session};
use crate::settings::{Connection, Settings};
use crate::shared::Shared;

/// Spawns and addresses the venue sessions, one per configured component.
pub struct Manager {
    handles: HashMap<String, mpsc::UnboundedSender<Command>>,
}

impl Manager {
    pub fn new(
        settings: &Arc<Settings>,
        shared: &Arc<Shared>,
        event_tx: mpsc::UnboundedSender<ProxyEvent>,
        cancel: &CancellationToken,
        connections: &[Connection],
    ) -> Self {
        let mut handles = HashMap::with_capacity(connections.len());
        for connection in connections {
            let (command_tx, command_rx) = mpsc::unbounded_channel();
            let session = Session::new(
                connection.component.clone(),
                connection.address.clone(),
                Arc::clone(settings),
                Arc::clone(shared),
                event_tx.clone(),
                command_rx,
                cancel.child_token(),
            );
            tokio::spawn(session.run());
            handles.insert(connection.component.clone(), command_tx);
        }
        Self { handles }
    }

    /// Hand a client request to the session for `component`.
    ///
    /// Returns false when no such component is configured (the message is
    /// given back via the error).
    pub fn forward(
        &self,
        component: &str,
        username: String,
        message: FixMessage,
    ) -> Result<(), FixMessage> {
        match self.handles.get(component) {
            Some(command_tx) => {
                match command_tx.send(Command::Forward { username, message }) {
                    Ok(()) => Ok(()),
                    Err(mpsc::error::SendError(Command::Forward { message, .. })) => Err(message),
                }
            }
            None => Err(message),
        }
    }

    pub fn has_component(&self, component: &str) -> bool {
        self.handles.contains_key(component)
    }
}
