// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One FIX session to an upstream venue.
//!
//! Lifecycle: connect → Logon (sequence numbers reset) → security-list
//! download → READY → business dispatch, reconnecting forever on disconnect.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::codec::message::*;
use crate::codec::{self, encode, next_frame, Envelope, FixMessage, Header};
use crate::controller::ProxyEvent;
use crate::error::Error;
use crate::settings::Settings;
use crate::shared::Shared;

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Outbound work handed to a venue session by the controller.
#[derive(Debug)]
pub enum Command {
    /// Forward a client business request, keyed by the originating username.
    Forward { username: String, message: FixMessage },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Disconnected,
    LogonSent,
    GetSecurityList,
    Ready,
}

/// Why a connection attempt ended.
enum Disconnect {
    Stopped,
    Transport(&'static str),
    Protocol(&'static str),
}

/// One resolved `select!` outcome; handlers run after the select borrows end.
enum Turn {
    Stopped,
    Read(std::io::Result<usize>),
    Command(Option<Command>),
    Tick,
}

pub struct Session {
    component: String,
    address: String,
    settings: Arc<Settings>,
    shared: Arc<Shared>,
    event_tx: mpsc::UnboundedSender<ProxyEvent>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,

    state: State,
    inbound_seq: u64,
    outbound_seq: u64,
    next_heartbeat: tokio::time::Instant,
    /// Venue-confirmed instruments, per exchange.
    exchange_symbols: HashMap<String, HashSet<String>>,
    /// cl_ord_id → username, for routing order responses.
    order_routes: HashMap<String, String>,
    /// md_req_id → username, for routing market-data responses.
    md_routes: HashMap<String, String>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        component: String,
        address: String,
        settings: Arc<Settings>,
        shared: Arc<Shared>,
        event_tx: mpsc::UnboundedSender<ProxyEvent>,
        command_rx: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            component,
            address,
            settings,
            shared,
            event_tx,
            command_rx,
            cancel,
            state: State::Disconnected,
            inbound_seq: 0,
            outbound_seq: 0,
            next_heartbeat: tokio::time::Instant::now(),
            exchange_symbols: HashMap::new(),
            order_routes: HashMap::new(),
            md_routes: HashMap::new(),
        }
    }

    /// Connect-and-reconnect loop; runs until shutdown.
    pub async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            match TcpStream::connect(&self.address).await {
                Ok(stream) => {
                    backoff = INITIAL_BACKOFF;
                    tracing::info!(
                        component = %self.component,
                        address = %self.address,
                        "venue connected"
                    );
                    let disconnect = self.run_connection(stream).await;
                    self.enter_disconnected();
                    match disconnect {
                        Disconnect::Stopped => break,
                        Disconnect::Transport(reason) => {
                            tracing::warn!(component = %self.component, reason, "venue disconnected");
                        }
                        Disconnect::Protocol(reason) => {
                            tracing::error!(component = %self.component, reason, "venue protocol error");
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        component = %self.component,
                        err = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "venue connect failed, retrying"
                    );
                }
            }

            // Drain (and reject) client requests that race the disconnect.
            let sleep = tokio::time::sleep(backoff);
            tokio::pin!(sleep);
            loop {
                let turn = tokio::select! {
                    _ = self.cancel.cancelled() => Turn::Stopped,
                    _ = &mut sleep => Turn::Tick,
                    command = self.command_rx.recv() => Turn::Command(command),
                };
                match turn {
                    Turn::Stopped | Turn::Command(None) => return,
                    Turn::Tick => break,
                    Turn::Command(Some(command)) => self.reject_not_ready(command),
                    Turn::Read(_) => {}
                }
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    fn enter_disconnected(&mut self) {
        self.state = State::Disconnected;
        self.shared.set_component_ready(&self.component, false);
        self.exchange_symbols.clear();
    }

    async fn run_connection(&mut self, stream: TcpStream) -> Disconnect {
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = BytesMut::with_capacity(8192);

        // Sequence numbers reset on every connection (logon carries 141=Y).
        self.inbound_seq = 0;
        self.outbound_seq = 0;

        let logon = FixMessage::Logon(Logon {
            encrypt_method: 0,
            heart_bt_int: self.settings.fix_ping_freq_secs,
            reset_seq_num_flag: true,
            username: self.settings.fix_username.clone(),
            password: Some(self.settings.fix_password.clone()),
            raw_data: None,
        });
        if let Err(disconnect) = self.send(&mut writer, &logon).await {
            return disconnect;
        }
        self.state = State::LogonSent;

        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            let turn = tokio::select! {
                _ = self.cancel.cancelled() => Turn::Stopped,
                read = reader.read_buf(&mut buf) => Turn::Read(read),
                command = self.command_rx.recv() => Turn::Command(command),
                _ = tick.tick() => Turn::Tick,
            };
            match turn {
                Turn::Stopped | Turn::Command(None) => {
                    let logout = FixMessage::Logout(Logout { text: None });
                    let _ = self.send(&mut writer, &logout).await;
                    return Disconnect::Stopped;
                }
                Turn::Read(Ok(0)) => return Disconnect::Transport("eof"),
                Turn::Read(Ok(_)) => {
                    if buf.len() > self.settings.fix_decode_buffer_size {
                        return Disconnect::Protocol("decode buffer overflow");
                    }
                    if let Err(disconnect) = self.drain_frames(&mut writer, &mut buf).await {
                        return disconnect;
                    }
                }
                Turn::Read(Err(e)) => {
                    tracing::debug!(component = %self.component, err = %e, "venue read error");
                    return Disconnect::Transport("read error");
                }
                Turn::Command(Some(command)) => {
                    if let Err(disconnect) = self.handle_command(&mut writer, command).await {
                        return disconnect;
                    }
                }
                Turn::Tick => {
                    if tokio::time::Instant::now() >= self.next_heartbeat {
                        let test_request = FixMessage::TestRequest(TestRequest {
                            test_req_id: (self.outbound_seq + 1).to_string(),
                        });
                        if let Err(disconnect) = self.send(&mut writer, &test_request).await {
                            return disconnect;
                        }
                    }
                }
            }
        }
    }

    async fn drain_frames(
        &mut self,
        writer: &mut OwnedWriteHalf,
        buf: &mut BytesMut,
    ) -> Result<(), Disconnect> {
        loop {
            let len = match next_frame(buf) {
                Ok(Some(len)) => len,
                Ok(None) => return Ok(()),
                Err(e) => {
                    tracing::error!(component = %self.component, err = %e, "venue frame error");
                    return Err(Disconnect::Protocol("frame error"));
                }
            };
            let decoded = codec::decode(&buf[..len]);
            buf.advance(len);
            match decoded {
                Ok((header, message)) => self.handle_message(writer, header, message).await?,
                Err(e) => {
                    tracing::error!(component = %self.component, err = %e, "venue decode error");
                    return Err(Disconnect::Protocol("decode error"));
                }
            }
        }
    }

    async fn handle_message(
        &mut self,
        writer: &mut OwnedWriteHalf,
        header: Header,
        message: FixMessage,
    ) -> Result<(), Disconnect> {
        if header.sender_comp_id != self.settings.fix_target_comp_id
            || header.target_comp_id != self.settings.fix_sender_comp_id
        {
            let logout = FixMessage::Logout(Logout { text: Some("comp_id mismatch".into()) });
            let _ = self.send(writer, &logout).await;
            return Err(Disconnect::Protocol("comp_id mismatch"));
        }
        if header.msg_seq_num != self.inbound_seq + 1 {
            let logout = FixMessage::Logout(Logout { text: Some("msg_seq_num mismatch".into()) });
            let _ = self.send(writer, &logout).await;
            return Err(Disconnect::Protocol("msg_seq_num mismatch"));
        }
        self.inbound_seq = header.msg_seq_num;

        match message {
            FixMessage::Logon(_) => {
                if self.state == State::LogonSent {
                    self.state = State::GetSecurityList;
                    let request = FixMessage::SecurityListRequest(SecurityListRequest {
                        security_req_id: self.shared.create_request_id(),
                        security_list_request_type: 4,
                    });
                    self.send(writer, &request).await?;
                } else {
                    tracing::warn!(component = %self.component, "unexpected logon");
                }
            }
            FixMessage::Logout(logout) => {
                tracing::warn!(
                    component = %self.component,
                    text = logout.text.as_deref().unwrap_or_default(),
                    "venue logout"
                );
                return Err(Disconnect::Transport("logout"));
            }
            FixMessage::TestRequest(request) => {
                let heartbeat = FixMessage::Heartbeat(Heartbeat {
                    test_req_id: Some(request.test_req_id),
                });
                self.send(writer, &heartbeat).await?;
            }
            FixMessage::Heartbeat(_) => {}
            FixMessage::ResendRequest(request) => {
                // Sequences reset on every logon; nothing is stored to replay.
                tracing::warn!(
                    component = %self.component,
                    begin = request.begin_seq_no,
                    end = request.end_seq_no,
                    "resend request ignored"
                );
            }
            FixMessage::Reject(reject) => {
                tracing::error!(
                    component = %self.component,
                    ref_seq_num = reject.ref_seq_num,
                    text = reject.text.as_deref().unwrap_or_default(),
                    "venue reject"
                );
            }
            FixMessage::SecurityList(list) => self.on_security_list(writer, list).await?,
            FixMessage::SecurityDefinition(definition) => {
                if self.shared.include(&definition.symbol) {
                    self.shared.add_known_symbol(&definition.symbol);
                    self.emit(None, FixMessage::SecurityDefinition(definition));
                }
            }
            FixMessage::ExecutionReport(report) => {
                let username = self.execution_report_route(&report);
                self.emit(Some(username), FixMessage::ExecutionReport(report));
            }
            FixMessage::OrderCancelReject(reject) => {
                let username = self
                    .order_routes
                    .get(&reject.orig_cl_ord_id)
                    .or_else(|| self.order_routes.get(&reject.cl_ord_id))
                    .cloned()
                    .unwrap_or_else(|| self.settings.fix_username.clone());
                self.emit(Some(username), FixMessage::OrderCancelReject(reject));
            }
            FixMessage::BusinessMessageReject(reject) => {
                let username = reject
                    .business_reject_ref_id
                    .as_ref()
                    .and_then(|ref_id| {
                        self.order_routes.get(ref_id).or_else(|| self.md_routes.get(ref_id))
                    })
                    .cloned()
                    .unwrap_or_else(|| self.settings.fix_username.clone());
                self.emit(Some(username), FixMessage::BusinessMessageReject(reject));
            }
            FixMessage::MarketDataSnapshotFullRefresh(refresh) => {
                if let Some(username) = self.md_route(refresh.md_req_id.as_deref()) {
                    self.emit(Some(username), FixMessage::MarketDataSnapshotFullRefresh(refresh));
                }
            }
            FixMessage::MarketDataIncrementalRefresh(refresh) => {
                if let Some(username) = self.md_route(refresh.md_req_id.as_deref()) {
                    self.emit(Some(username), FixMessage::MarketDataIncrementalRefresh(refresh));
                }
            }
            FixMessage::MarketDataRequestReject(reject) => {
                if let Some(username) = self.md_route(Some(&reject.md_req_id)) {
                    self.md_routes.remove(&reject.md_req_id);
                    self.emit(Some(username), FixMessage::MarketDataRequestReject(reject));
                }
            }
            other => {
                tracing::warn!(
                    component = %self.component,
                    msg_type = other.msg_type().wire(),
                    "unexpected venue message"
                );
            }
        }
        Ok(())
    }

    async fn on_security_list(
        &mut self,
        writer: &mut OwnedWriteHalf,
        list: SecurityList,
    ) -> Result<(), Disconnect> {
        if list.security_request_result != 0 {
            tracing::warn!(
                component = %self.component,
                result = list.security_request_result,
                "security list request failed"
            );
        }
        for entry in &list.securities {
            if !self.shared.include(&entry.symbol) {
                continue;
            }
            let added = self
                .exchange_symbols
                .entry(entry.security_exchange.clone())
                .or_default()
                .insert(entry.symbol.clone());
            if !added {
                continue;
            }
            let request = FixMessage::SecurityDefinitionRequest(SecurityDefinitionRequest {
                security_req_id: self.shared.create_request_id(),
                security_request_type: 3,
                symbol: entry.symbol.clone(),
                security_exchange: entry.security_exchange.clone(),
            });
            self.send(writer, &request).await?;
        }
        if list.last_fragment && self.state == State::GetSecurityList {
            self.state = State::Ready;
            self.shared.set_component_ready(&self.component, true);
            let symbols: usize = self.exchange_symbols.values().map(HashSet::len).sum();
            tracing::info!(component = %self.component, symbols, "venue ready");
        }
        Ok(())
    }

    async fn handle_command(
        &mut self,
        writer: &mut OwnedWriteHalf,
        command: Command,
    ) -> Result<(), Disconnect> {
        let Command::Forward { username, message } = command;
        if self.state != State::Ready {
            self.reject_not_ready(Command::Forward { username, message });
            return Ok(());
        }
        match &message {
            FixMessage::NewOrderSingle(msg) => {
                self.order_routes.insert(msg.cl_ord_id.clone(), username.clone());
            }
            FixMessage::OrderCancelRequest(msg) => {
                self.order_routes.insert(msg.cl_ord_id.clone(), username.clone());
            }
            FixMessage::OrderCancelReplaceRequest(msg) => {
                self.order_routes.insert(msg.cl_ord_id.clone(), username.clone());
            }
            FixMessage::OrderStatusRequest(msg) => {
                self.order_routes.insert(msg.cl_ord_id.clone(), username.clone());
            }
            FixMessage::OrderMassStatusRequest(msg) => {
                self.order_routes.insert(msg.mass_status_req_id.clone(), username.clone());
            }
            FixMessage::OrderMassCancelRequest(msg) => {
                self.order_routes.insert(msg.cl_ord_id.clone(), username.clone());
            }
            FixMessage::MarketDataRequest(msg) => {
                self.md_routes.insert(msg.md_req_id.clone(), username.clone());
            }
            other => {
                tracing::warn!(
                    component = %self.component,
                    msg_type = other.msg_type().wire(),
                    "refusing to forward message type"
                );
                return Ok(());
            }
        }
        self.send(writer, &message).await
    }

    /// Reply to a client request with NOT_READY when the venue is unavailable.
    fn reject_not_ready(&self, command: Command) {
        let Command::Forward { username, message } = command;
        let reject = FixMessage::BusinessMessageReject(BusinessMessageReject {
            ref_seq_num: 0,
            ref_msg_type: message.msg_type().wire().to_owned(),
            business_reject_ref_id: message.request_ref_id().map(str::to_owned),
            business_reject_reason: codec::BUSINESS_REJECT_REASON_APPLICATION_NOT_AVAILABLE,
            text: Some(Error::NotReady.as_str().to_owned()),
        });
        self.emit(Some(username), reject);
    }

    fn execution_report_route(&self, report: &ExecutionReport) -> String {
        report
            .parties
            .iter()
            .find(|party| party.party_role == codec::PARTY_ROLE_CLIENT_ID)
            .map(|party| party.party_id.clone())
            .or_else(|| {
                report.cl_ord_id.as_ref().and_then(|id| self.order_routes.get(id).cloned())
            })
            .or_else(|| {
                report.orig_cl_ord_id.as_ref().and_then(|id| self.order_routes.get(id).cloned())
            })
            .unwrap_or_else(|| self.settings.fix_username.clone())
    }

    fn md_route(&self, md_req_id: Option<&str>) -> Option<String> {
        let username = md_req_id.and_then(|id| self.md_routes.get(id)).cloned();
        if username.is_none() {
            tracing::debug!(component = %self.component, "dropping unroutable market data");
        }
        username
    }

    fn emit(&self, username: Option<String>, message: FixMessage) {
        let event =
            ProxyEvent::FromServer { component: self.component.clone(), username, message };
        let _ = self.event_tx.send(event);
    }

    async fn send(
        &mut self,
        writer: &mut OwnedWriteHalf,
        message: &FixMessage,
    ) -> Result<(), Disconnect> {
        self.outbound_seq += 1;
        let envelope = Envelope {
            sender_comp_id: &self.settings.fix_sender_comp_id,
            target_comp_id: &self.settings.fix_target_comp_id,
            msg_seq_num: self.outbound_seq,
            sending_time: chrono::Utc::now(),
        };
        let mut out = BytesMut::new();
        if let Err(e) = encode(message, &envelope, &mut out, self.settings.fix_encode_buffer_size)
        {
            tracing::error!(component = %self.component, err = %e, "venue encode failed");
            return Err(Disconnect::Protocol("encode failed"));
        }
        if let Err(e) = writer.write_all(&out).await {
            tracing::debug!(component = %self.component, err = %e, "venue write failed");
            return Err(Disconnect::Transport("write failed"));
        }
        // Any send postpones the next heartbeat.
        self.next_heartbeat = tokio::time::Instant::now() + self.settings.ping_freq();
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
