// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC client surface: `GET /symbols` plus a WebSocket speaking
//! JSON-RPC 2.0. Semantically identical to the FIX variant; only the wire
//! representation differs.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::client::manager::Manager;
use crate::client::session::{stamp_party_ids, symbols_allowed, State as SessionState};
use crate::codec::message::*;
use crate::codec::FixMessage;
use crate::controller::ProxyEvent;
use crate::error::Error;
use crate::settings::Settings;
use crate::shared::Shared;

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub shared: Arc<Shared>,
    pub manager: Arc<Manager>,
    pub event_tx: mpsc::UnboundedSender<ProxyEvent>,
}

/// Build the axum `Router` for the JSON client side.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/symbols", get(get_symbols))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /symbols` — the venue-confirmed, allow-listed symbol set.
async fn get_symbols(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.shared.known_symbols())
}

/// `GET /ws` — WebSocket upgrade for a JSON-RPC client session.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(state, socket))
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    jsonrpc: String,
    #[serde(default)]
    method: String,
    #[serde(default)]
    params: serde_json::Value,
    #[serde(default)]
    id: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LogonParams {
    username: String,
    password: String,
    #[serde(default)]
    raw_data: String,
}

enum Turn {
    Stopped,
    Inbound(Option<Result<Message, axum::Error>>),
    Deliver(Option<FixMessage>),
    Tick,
}

struct SessionOver;

struct Session {
    session_id: u64,
    shared: Arc<Shared>,
    event_tx: mpsc::UnboundedSender<ProxyEvent>,
    state: SessionState,
    username: String,
    strategy_id: u32,
    component: String,
    logon_deadline: tokio::time::Instant,
}

type WsSink = SplitSink<WebSocket, Message>;

async fn handle_session(app: AppState, socket: WebSocket) {
    let (session_id, mut deliver_rx, cancel) = app.manager.register().await;
    tracing::debug!(session_id, "json client connected");

    let mut session = Session {
        session_id,
        shared: Arc::clone(&app.shared),
        event_tx: app.event_tx.clone(),
        state: SessionState::WaitingLogon,
        username: String::new(),
        strategy_id: 0,
        component: String::new(),
        logon_deadline: tokio::time::Instant::now() + app.settings.logon_timeout(),
    };

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let turn = tokio::select! {
            _ = cancel.cancelled() => Turn::Stopped,
            inbound = ws_rx.next() => Turn::Inbound(inbound),
            message = deliver_rx.recv() => Turn::Deliver(message),
            _ = tick.tick() => Turn::Tick,
        };
        let over = match turn {
            Turn::Stopped | Turn::Deliver(None) => break,
            Turn::Inbound(Some(Ok(Message::Text(text)))) => {
                session.process(&mut ws_tx, text.as_str()).await
            }
            Turn::Inbound(Some(Ok(Message::Close(_)))) | Turn::Inbound(None) => {
                tracing::debug!(session_id, "json client disconnected");
                break;
            }
            Turn::Inbound(Some(Err(_))) => break,
            Turn::Inbound(Some(Ok(_))) => Ok(()), // ping/pong/binary ignored
            Turn::Deliver(Some(message)) => session.notify(&mut ws_tx, &message).await,
            Turn::Tick => session.on_tick(&mut ws_tx).await,
        };
        if over.is_err() {
            break;
        }
    }

    session.teardown();
}

impl Session {
    /// Final bookkeeping: release the binding and queue the session for reaping.
    fn teardown(&mut self) {
        if self.state.logged_on() {
            let _ = self.shared.session_logout(self.session_id);
        }
        self.state = SessionState::Zombie;
        self.shared.session_remove(self.session_id);
    }

    async fn on_tick(&mut self, ws_tx: &mut WsSink) -> Result<(), SessionOver> {
        let now = tokio::time::Instant::now();
        match self.state {
            SessionState::WaitingLogon => {
                if now >= self.logon_deadline {
                    tracing::warn!(session_id = self.session_id, "json logon timeout");
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return Err(SessionOver);
                }
            }
            SessionState::WaitingCreateRoute => {
                if self.shared.component_ready(&self.component) {
                    self.state = SessionState::Ready;
                }
            }
            SessionState::WaitingRemoveRoute => return Err(SessionOver),
            SessionState::Ready => {}
            SessionState::Zombie => return Err(SessionOver),
        }
        Ok(())
    }

    async fn process(&mut self, ws_tx: &mut WsSink, text: &str) -> Result<(), SessionOver> {
        let request: JsonRpcRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(_) => {
                return self
                    .send_error(ws_tx, PARSE_ERROR, "parse error", serde_json::Value::Null)
                    .await;
            }
        };
        if request.jsonrpc != "2.0" {
            return self
                .send_error(ws_tx, INVALID_REQUEST, "invalid request", request.id)
                .await;
        }

        match request.method.as_str() {
            "logon" => self.logon(ws_tx, request.params, request.id).await,
            "logout" => self.logout(ws_tx, request.id).await,
            "order_status_request" => {
                self.business::<OrderStatusRequest>(ws_tx, request.params, request.id, |msg| {
                    FixMessage::OrderStatusRequest(msg)
                })
                .await
            }
            "new_order_single" => {
                self.business::<NewOrderSingle>(ws_tx, request.params, request.id, |msg| {
                    FixMessage::NewOrderSingle(msg)
                })
                .await
            }
            "order_cancel_request" => {
                self.business::<OrderCancelRequest>(ws_tx, request.params, request.id, |msg| {
                    FixMessage::OrderCancelRequest(msg)
                })
                .await
            }
            "order_mass_status_request" => {
                self.business::<OrderMassStatusRequest>(ws_tx, request.params, request.id, |msg| {
                    FixMessage::OrderMassStatusRequest(msg)
                })
                .await
            }
            "order_mass_cancel_request" => {
                self.business::<OrderMassCancelRequest>(ws_tx, request.params, request.id, |msg| {
                    FixMessage::OrderMassCancelRequest(msg)
                })
                .await
            }
            _ => self.send_error(ws_tx, METHOD_NOT_FOUND, "method not found", request.id).await,
        }
    }

    async fn logon(
        &mut self,
        ws_tx: &mut WsSink,
        params: serde_json::Value,
        id: serde_json::Value,
    ) -> Result<(), SessionOver> {
        let Ok(params) = serde_json::from_value::<LogonParams>(params) else {
            return self.send_error(ws_tx, INVALID_PARAMS, "invalid params", id).await;
        };
        if self.state != SessionState::WaitingLogon {
            return self.send_catalog_error(ws_tx, Error::AlreadyLoggedOn, id).await;
        }
        match self.shared.session_logon(
            self.session_id,
            &params.username,
            &params.password,
            &params.raw_data,
        ) {
            Ok(strategy_id) => {
                self.username = params.username;
                self.strategy_id = strategy_id;
                self.component = self
                    .shared
                    .user(&self.username)
                    .map(|user| user.component)
                    .unwrap_or_default();
                self.state = if self.shared.component_ready(&self.component) {
                    SessionState::Ready
                } else {
                    SessionState::WaitingCreateRoute
                };
                tracing::info!(
                    session_id = self.session_id,
                    username = %self.username,
                    "json client logged on"
                );
                self.send_result(ws_tx, id).await
            }
            Err(error) => {
                tracing::warn!(
                    session_id = self.session_id,
                    username = %params.username,
                    error = %error,
                    "json logon refused"
                );
                self.send_catalog_error(ws_tx, error, id).await
            }
        }
    }

    async fn logout(
        &mut self,
        ws_tx: &mut WsSink,
        id: serde_json::Value,
    ) -> Result<(), SessionOver> {
        if !self.state.logged_on() {
            return self.send_catalog_error(ws_tx, Error::NotLoggedOn, id).await;
        }
        let _ = self.shared.session_logout(self.session_id);
        self.state = SessionState::WaitingRemoveRoute;
        tracing::info!(session_id = self.session_id, username = %self.username, "json client logged out");
        self.send_result(ws_tx, id).await
    }

    async fn business<T>(
        &mut self,
        ws_tx: &mut WsSink,
        params: serde_json::Value,
        id: serde_json::Value,
        wrap: fn(T) -> FixMessage,
    ) -> Result<(), SessionOver>
    where
        T: serde::de::DeserializeOwned,
    {
        if !self.state.logged_on() {
            return self.send_catalog_error(ws_tx, Error::NotLoggedOn, id).await;
        }
        if self.state == SessionState::WaitingCreateRoute {
            return self.send_catalog_error(ws_tx, Error::NotReady, id).await;
        }
        let Ok(params) = serde_json::from_value::<T>(params) else {
            return self.send_error(ws_tx, INVALID_PARAMS, "invalid params", id).await;
        };
        let mut message = wrap(params);
        if !symbols_allowed(&self.shared, &message) {
            return self.send_catalog_error(ws_tx, Error::UnknownSymbol, id).await;
        }
        if !stamp_party_ids(&mut message, &self.username, self.strategy_id) {
            return self.send_error(ws_tx, INVALID_PARAMS, "party id conflict", id).await;
        }
        let event = ProxyEvent::FromClient {
            session_id: self.session_id,
            username: self.username.clone(),
            message,
        };
        let _ = self.event_tx.send(event);
        self.send_result(ws_tx, id).await
    }

    /// Deliver a routed or broadcast venue message as a JSON-RPC notification.
    async fn notify(&mut self, ws_tx: &mut WsSink, message: &FixMessage) -> Result<(), SessionOver> {
        if !self.state.logged_on() {
            return Ok(());
        }
        let notification = json!({
            "jsonrpc": "2.0",
            "method": event_name(message),
            "params": message_params(message),
        });
        self.send_json(ws_tx, &notification).await
    }

    async fn send_result(
        &mut self,
        ws_tx: &mut WsSink,
        id: serde_json::Value,
    ) -> Result<(), SessionOver> {
        let response = json!({ "jsonrpc": "2.0", "result": "OK", "id": id });
        self.send_json(ws_tx, &response).await
    }

    async fn send_catalog_error(
        &mut self,
        ws_tx: &mut WsSink,
        error: Error,
        id: serde_json::Value,
    ) -> Result<(), SessionOver> {
        self.send_error(ws_tx, error.jsonrpc_code(), error.as_str(), id).await
    }

    async fn send_error(
        &mut self,
        ws_tx: &mut WsSink,
        code: i64,
        message: &str,
        id: serde_json::Value,
    ) -> Result<(), SessionOver> {
        let response = json!({
            "jsonrpc": "2.0",
            "error": { "code": code, "message": message },
            "id": id,
        });
        self.send_json(ws_tx, &response).await
    }

    async fn send_json(
        &mut self,
        ws_tx: &mut WsSink,
        value: &serde_json::Value,
    ) -> Result<(), SessionOver> {
        let text = value.to_string();
        if ws_tx.send(Message::Text(text.into())).await.is_err() {
            return Err(SessionOver);
        }
        Ok(())
    }
}

/// JSON-RPC notification method name for an asynchronous venue message.
fn event_name(message: &FixMessage) -> &'static str {
    match message {
        FixMessage::ExecutionReport(_) => "execution_report",
        FixMessage::OrderCancelReject(_) => "order_cancel_reject",
        FixMessage::BusinessMessageReject(_) => "business_message_reject",
        FixMessage::SecurityDefinition(_) => "security_definition",
        FixMessage::MarketDataSnapshotFullRefresh(_) => "market_data_snapshot_full_refresh",
        FixMessage::MarketDataIncrementalRefresh(_) => "market_data_incremental_refresh",
        FixMessage::MarketDataRequestReject(_) => "market_data_request_reject",
        _ => "message",
    }
}

/// Notification params: the inner message body, not the enum wrapper.
fn message_params(message: &FixMessage) -> serde_json::Value {
    let result = match message {
        FixMessage::ExecutionReport(msg) => serde_json::to_value(msg),
        FixMessage::OrderCancelReject(msg) => serde_json::to_value(msg),
        FixMessage::BusinessMessageReject(msg) => serde_json::to_value(msg),
        FixMessage::SecurityDefinition(msg) => serde_json::to_value(msg),
        FixMessage::MarketDataSnapshotFullRefresh(msg) => serde_json::to_value(msg),
        FixMessage::MarketDataIncrementalRefresh(msg) => serde_json::to_value(msg),
        FixMessage::MarketDataRequestReject(msg) => serde_json::to_value(msg),
        other => serde_json::to_value(other),
    };
    result.unwrap_or(serde_json::Value::Null)
}
