// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One FIX session accepted from a downstream client.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::session::{
    business_reject, is_business_request, stamp_party_ids, symbols_allowed, State,
};
use crate::codec::message::*;
use crate::codec::{self, encode, next_frame, Envelope, FixMessage, Header};
use crate::controller::ProxyEvent;
use crate::error::Error;
use crate::settings::Settings;
use crate::shared::Shared;

/// The session is over; the task unwinds and the reaper drops the handle.
struct SessionOver;

enum Turn {
    Stopped,
    Read(std::io::Result<usize>),
    Deliver(Option<FixMessage>),
    Tick,
}

pub struct Session {
    session_id: u64,
    settings: Arc<Settings>,
    shared: Arc<Shared>,
    event_tx: mpsc::UnboundedSender<ProxyEvent>,
    cancel: CancellationToken,

    state: State,
    inbound_seq: u64,
    outbound_seq: u64,
    /// Learned from the client's Logon header, enforced afterwards.
    peer_comp_id: String,
    username: String,
    strategy_id: u32,
    component: String,
    logon_deadline: tokio::time::Instant,
    last_inbound: tokio::time::Instant,
    next_heartbeat: tokio::time::Instant,
}

impl Session {
    pub fn new(
        session_id: u64,
        settings: Arc<Settings>,
        shared: Arc<Shared>,
        event_tx: mpsc::UnboundedSender<ProxyEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let now = tokio::time::Instant::now();
        let logon_deadline = now + settings.logon_timeout();
        let next_heartbeat = now + settings.ping_freq();
        Self {
            session_id,
            settings,
            shared,
            event_tx,
            cancel,
            state: State::WaitingLogon,
            inbound_seq: 0,
            outbound_seq: 0,
            peer_comp_id: String::new(),
            username: String::new(),
            strategy_id: 0,
            component: String::new(),
            logon_deadline,
            last_inbound: now,
            next_heartbeat,
        }
    }

    pub async fn run(
        mut self,
        stream: TcpStream,
        mut deliver_rx: mpsc::UnboundedReceiver<FixMessage>,
    ) {
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = BytesMut::with_capacity(8192);
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::debug!(session_id = self.session_id, "client connected");

        loop {
            let turn = tokio::select! {
                _ = self.cancel.cancelled() => Turn::Stopped,
                read = reader.read_buf(&mut buf) => Turn::Read(read),
                message = deliver_rx.recv() => Turn::Deliver(message),
                _ = tick.tick() => Turn::Tick,
            };
            let over = match turn {
                Turn::Stopped | Turn::Deliver(None) => {
                    let logout = FixMessage::Logout(Logout { text: None });
                    let _ = self.send(&mut writer, &logout).await;
                    self.make_zombie();
                    break;
                }
                Turn::Read(Ok(0)) => {
                    tracing::debug!(session_id = self.session_id, "client disconnected");
                    self.make_zombie();
                    break;
                }
                Turn::Read(Ok(_)) => {
                    if buf.len() > self.settings.fix_decode_buffer_size {
                        tracing::warn!(session_id = self.session_id, "decode buffer overflow");
                        self.make_zombie();
                        break;
                    }
                    self.drain_frames(&mut writer, &mut buf).await
                }
                Turn::Read(Err(e)) => {
                    tracing::debug!(session_id = self.session_id, err = %e, "client read error");
                    self.make_zombie();
                    break;
                }
                Turn::Deliver(Some(message)) => self.deliver(&mut writer, message).await,
                Turn::Tick => self.on_tick(&mut writer).await,
            };
            if over.is_err() {
                break;
            }
        }
    }

    /// Mark the session for the reaper. Zombies perform no further I/O.
    fn make_zombie(&mut self) {
        if !self.state.zombie() {
            self.state = State::Zombie;
            self.shared.session_remove(self.session_id);
        }
    }

    async fn on_tick(&mut self, writer: &mut OwnedWriteHalf) -> Result<(), SessionOver> {
        let now = tokio::time::Instant::now();
        match self.state {
            State::WaitingLogon => {
                if now >= self.logon_deadline {
                    tracing::warn!(session_id = self.session_id, "logon timeout");
                    self.make_zombie();
                    return Err(SessionOver);
                }
            }
            State::WaitingCreateRoute => {
                if self.shared.component_ready(&self.component) {
                    self.state = State::Ready;
                    tracing::info!(
                        session_id = self.session_id,
                        username = %self.username,
                        "route established"
                    );
                }
                self.check_heartbeats(writer, now).await?;
            }
            State::Ready => {
                self.check_heartbeats(writer, now).await?;
            }
            State::WaitingRemoveRoute => {
                self.make_zombie();
                return Err(SessionOver);
            }
            State::Zombie => return Err(SessionOver),
        }
        Ok(())
    }

    async fn check_heartbeats(
        &mut self,
        writer: &mut OwnedWriteHalf,
        now: tokio::time::Instant,
    ) -> Result<(), SessionOver> {
        if now.duration_since(self.last_inbound) > self.settings.ping_freq() * 2 {
            tracing::warn!(session_id = self.session_id, "client heartbeat lost");
            let logout = FixMessage::Logout(Logout { text: Some("no heartbeat".into()) });
            let _ = self.send(writer, &logout).await;
            let _ = self.shared.session_logout(self.session_id);
            self.make_zombie();
            return Err(SessionOver);
        }
        if now >= self.next_heartbeat {
            let test_request = FixMessage::TestRequest(TestRequest {
                test_req_id: (self.outbound_seq + 1).to_string(),
            });
            self.send(writer, &test_request).await?;
        }
        Ok(())
    }

    async fn drain_frames(
        &mut self,
        writer: &mut OwnedWriteHalf,
        buf: &mut BytesMut,
    ) -> Result<(), SessionOver> {
        loop {
            let len = match next_frame(buf) {
                Ok(Some(len)) => len,
                Ok(None) => return Ok(()),
                Err(e) => {
                    tracing::warn!(session_id = self.session_id, err = %e, "client frame error");
                    self.make_zombie();
                    return Err(SessionOver);
                }
            };
            let decoded = codec::decode(&buf[..len]);
            buf.advance(len);
            match decoded {
                Ok((header, message)) => self.handle_message(writer, header, message).await?,
                Err(e) => {
                    tracing::warn!(session_id = self.session_id, err = %e, "client decode error");
                    self.make_zombie();
                    return Err(SessionOver);
                }
            }
        }
    }

    async fn handle_message(
        &mut self,
        writer: &mut OwnedWriteHalf,
        header: Header,
        message: FixMessage,
    ) -> Result<(), SessionOver> {
        if self.state.zombie() {
            return Err(SessionOver);
        }
        self.last_inbound = tokio::time::Instant::now();

        if header.msg_seq_num != self.inbound_seq + 1 {
            let logout = FixMessage::Logout(Logout { text: Some("msg_seq_num mismatch".into()) });
            let _ = self.send(writer, &logout).await;
            let _ = self.shared.session_logout(self.session_id);
            self.make_zombie();
            return Err(SessionOver);
        }
        self.inbound_seq = header.msg_seq_num;

        if self.state == State::WaitingLogon {
            self.peer_comp_id = header.sender_comp_id.clone();
        }
        if header.sender_comp_id != self.peer_comp_id
            || header.target_comp_id != self.settings.client_comp_id
        {
            self.send_reject_and_close(
                writer,
                &header,
                codec::SESSION_REJECT_REASON_COMP_ID_PROBLEM,
                "comp_id mismatch",
            )
            .await;
            return Err(SessionOver);
        }

        match self.state {
            State::WaitingLogon => self.handle_logon(writer, &header, message).await,
            State::Ready | State::WaitingCreateRoute => {
                self.handle_request(writer, &header, message).await
            }
            State::WaitingRemoveRoute | State::Zombie => Ok(()),
        }
    }

    async fn handle_logon(
        &mut self,
        writer: &mut OwnedWriteHalf,
        header: &Header,
        message: FixMessage,
    ) -> Result<(), SessionOver> {
        let FixMessage::Logon(logon) = message else {
            self.send_reject_and_close(
                writer,
                header,
                codec::SESSION_REJECT_REASON_INVALID_MSG_TYPE,
                "expected logon",
            )
            .await;
            return Err(SessionOver);
        };

        let password = logon.password.clone().unwrap_or_default();
        let raw_data = logon.raw_data.clone().unwrap_or_default();
        match self.shared.session_logon(self.session_id, &logon.username, &password, &raw_data) {
            Ok(strategy_id) => {
                self.username = logon.username;
                self.strategy_id = strategy_id;
                self.component = self
                    .shared
                    .user(&self.username)
                    .map(|user| user.component)
                    .unwrap_or_default();

                let response = FixMessage::Logon(Logon {
                    encrypt_method: 0,
                    heart_bt_int: self.settings.fix_ping_freq_secs,
                    reset_seq_num_flag: true,
                    username: self.username.clone(),
                    password: None,
                    raw_data: None,
                });
                self.send(writer, &response).await?;

                self.state = if self.shared.component_ready(&self.component) {
                    State::Ready
                } else {
                    State::WaitingCreateRoute
                };
                tracing::info!(
                    session_id = self.session_id,
                    username = %self.username,
                    component = %self.component,
                    ready = self.state.ready(),
                    "client logged on"
                );
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    session_id = self.session_id,
                    username = %logon.username,
                    error = %error,
                    "client logon refused"
                );
                let logout =
                    FixMessage::Logout(Logout { text: Some(error.as_str().to_owned()) });
                let _ = self.send(writer, &logout).await;
                self.make_zombie();
                Err(SessionOver)
            }
        }
    }

    async fn handle_request(
        &mut self,
        writer: &mut OwnedWriteHalf,
        header: &Header,
        message: FixMessage,
    ) -> Result<(), SessionOver> {
        match message {
            FixMessage::Heartbeat(_) => Ok(()),
            FixMessage::TestRequest(request) => {
                let heartbeat = FixMessage::Heartbeat(Heartbeat {
                    test_req_id: Some(request.test_req_id),
                });
                self.send(writer, &heartbeat).await
            }
            FixMessage::ResendRequest(_) => {
                // Sequences reset on logon; nothing to replay.
                tracing::debug!(session_id = self.session_id, "resend request ignored");
                Ok(())
            }
            FixMessage::Reject(reject) => {
                tracing::warn!(
                    session_id = self.session_id,
                    ref_seq_num = reject.ref_seq_num,
                    text = reject.text.as_deref().unwrap_or_default(),
                    "client reject"
                );
                Ok(())
            }
            FixMessage::Logout(_) => {
                let _ = self.shared.session_logout(self.session_id);
                let response = FixMessage::Logout(Logout { text: None });
                let _ = self.send(writer, &response).await;
                self.state = State::WaitingRemoveRoute;
                tracing::info!(
                    session_id = self.session_id,
                    username = %self.username,
                    "client logged out"
                );
                Ok(())
            }
            mut message if is_business_request(&message) => {
                if self.state == State::WaitingCreateRoute {
                    let reject = business_reject(
                        header.msg_seq_num,
                        &message,
                        codec::BUSINESS_REJECT_REASON_APPLICATION_NOT_AVAILABLE,
                        Error::NotReady.as_str(),
                    );
                    return self.send(writer, &reject).await;
                }
                if !symbols_allowed(&self.shared, &message) {
                    let reject = business_reject(
                        header.msg_seq_num,
                        &message,
                        codec::BUSINESS_REJECT_REASON_UNKNOWN_SECURITY,
                        Error::UnknownSymbol.as_str(),
                    );
                    return self.send(writer, &reject).await;
                }
                if !stamp_party_ids(&mut message, &self.username, self.strategy_id) {
                    let reject = business_reject(
                        header.msg_seq_num,
                        &message,
                        codec::BUSINESS_REJECT_REASON_OTHER,
                        "party id conflict",
                    );
                    return self.send(writer, &reject).await;
                }
                let event = ProxyEvent::FromClient {
                    session_id: self.session_id,
                    username: self.username.clone(),
                    message,
                };
                let _ = self.event_tx.send(event);
                Ok(())
            }
            other => {
                let reject = business_reject(
                    header.msg_seq_num,
                    &other,
                    codec::BUSINESS_REJECT_REASON_UNSUPPORTED_MSG_TYPE,
                    Error::UnsupportedMsgType.as_str(),
                );
                self.send(writer, &reject).await
            }
        }
    }

    /// Deliver a routed or broadcast venue message to the client.
    async fn deliver(
        &mut self,
        writer: &mut OwnedWriteHalf,
        message: FixMessage,
    ) -> Result<(), SessionOver> {
        if !self.state.logged_on() {
            return Ok(());
        }
        self.send(writer, &message).await
    }

    async fn send_reject_and_close(
        &mut self,
        writer: &mut OwnedWriteHalf,
        header: &Header,
        reason: u32,
        text: &str,
    ) {
        let reject = FixMessage::Reject(Reject {
            ref_seq_num: header.msg_seq_num,
            ref_msg_type: Some(header.msg_type.wire().to_owned()),
            session_reject_reason: Some(reason),
            text: Some(text.to_owned()),
        });
        let _ = self.send(writer, &reject).await;
        let _ = self.shared.session_logout(self.session_id);
        self.make_zombie();
    }

    async fn send(
        &mut self,
        writer: &mut OwnedWriteHalf,
        message: &FixMessage,
    ) -> Result<(), SessionOver> {
        self.outbound_seq += 1;
        let envelope = Envelope {
            sender_comp_id: &self.settings.client_comp_id,
            target_comp_id: &self.peer_comp_id,
            msg_seq_num: self.outbound_seq,
            sending_time: chrono::Utc::now(),
        };
        let mut out = BytesMut::new();
        if let Err(e) = encode(message, &envelope, &mut out, self.settings.fix_encode_buffer_size)
        {
            tracing::warn!(session_id = self.session_id, err = %e, "client encode failed");
            let _ = self.shared.session_logout(self.session_id);
            self.make_zombie();
            return Err(SessionOver);
        }
        if let Err(e) = writer.write_all(&out).await {
            tracing::debug!(session_id = self.session_id, err = %e, "client write failed");
            self.make_zombie();
            return Err(SessionOver);
        }
        self.next_heartbeat = tokio::time::Instant::now() + self.settings.ping_freq();
        Ok(())
    }
}
