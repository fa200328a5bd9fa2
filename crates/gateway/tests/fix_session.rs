// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end FIX scenarios over loopback TCP: client logon, symbol
//! filtering, sequence discipline, and a full order round-trip through a
//! mock venue.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fixgate::client;
use fixgate::codec::message::*;
use fixgate::codec::{self, decode, encode, next_frame, Envelope, FixMessage, Header};
use fixgate::config::Config;
use fixgate::controller::Controller;
use fixgate::server;
use fixgate::settings::{Connection, Settings};
use fixgate::shared::Shared;

const CONFIG: &str = r#"
symbols = ["^BTC-.*$"]

[users.alice]
component = "venue-1"
password = "s3cret"
strategy_id = 42
"#;

fn test_settings(logon_timeout_secs: u64) -> Settings {
    Settings {
        config_file: "gateway.toml".into(),
        host: "127.0.0.1".into(),
        fix_port: 0,
        json_port: 0,
        client_comp_id: "proxy".into(),
        fix_sender_comp_id: "proxy".into(),
        fix_target_comp_id: "venue".into(),
        fix_username: "gateway".into(),
        fix_password: String::new(),
        fix_ping_freq_secs: 30,
        logon_timeout_secs,
        fix_decode_buffer_size: 1_048_576,
        fix_encode_buffer_size: 65_536,
        hmac_sha256: false,
        connections: vec![],
    }
}

struct Harness {
    shared: Arc<Shared>,
    client_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Assemble the gateway on ephemeral ports, optionally with venue connections.
async fn start(settings: Settings, venues: &[(&str, SocketAddr)]) -> anyhow::Result<Harness> {
    let config = Config::parse_text(CONFIG)?;
    let settings = Arc::new(settings);
    let shared = Arc::new(Shared::new(settings.crypto_method(), &config)?);
    let shutdown = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let connections: Vec<Connection> = venues
        .iter()
        .map(|(component, addr)| Connection {
            component: (*component).to_owned(),
            address: addr.to_string(),
        })
        .collect();
    let server_manager =
        server::Manager::new(&settings, &shared, event_tx.clone(), &shutdown, &connections);
    let client_manager = client::Manager::new(
        Arc::clone(&settings),
        Arc::clone(&shared),
        event_tx.clone(),
        shutdown.clone(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let client_addr = listener.local_addr()?;
    client_manager.spawn_fix_listener(listener);

    let controller = Controller::new(
        Arc::clone(&shared),
        server_manager,
        client_manager,
        event_rx,
        shutdown.clone(),
    );
    tokio::spawn(controller.run());

    Ok(Harness { shared, client_addr, shutdown })
}

/// One side of a FIX conversation: framing, sequence numbers, comp ids.
struct Peer {
    stream: TcpStream,
    buf: BytesMut,
    sender: &'static str,
    target: &'static str,
    outbound_seq: u64,
}

impl Peer {
    fn new(stream: TcpStream, sender: &'static str, target: &'static str) -> Self {
        Self { stream, buf: BytesMut::with_capacity(8192), sender, target, outbound_seq: 0 }
    }

    async fn connect(addr: SocketAddr, sender: &'static str, target: &'static str) -> anyhow::Result<Self> {
        Ok(Self::new(TcpStream::connect(addr).await?, sender, target))
    }

    async fn send(&mut self, message: &FixMessage) -> anyhow::Result<()> {
        self.outbound_seq += 1;
        self.send_with_seq(message, self.outbound_seq).await
    }

    async fn send_with_seq(&mut self, message: &FixMessage, seq: u64) -> anyhow::Result<()> {
        let envelope = Envelope {
            sender_comp_id: self.sender,
            target_comp_id: self.target,
            msg_seq_num: seq,
            sending_time: chrono::Utc::now(),
        };
        let mut out = BytesMut::new();
        encode(message, &envelope, &mut out, 65_536)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    async fn recv(&mut self) -> anyhow::Result<(Header, FixMessage)> {
        let deadline = Duration::from_secs(5);
        loop {
            if let Some(len) = next_frame(&self.buf)? {
                let decoded = decode(&self.buf[..len])?;
                self.buf.advance(len);
                return Ok(decoded);
            }
            let read = tokio::time::timeout(deadline, self.stream.read_buf(&mut self.buf)).await??;
            if read == 0 {
                anyhow::bail!("peer closed");
            }
        }
    }

    /// Receive, skipping administrative heartbeat traffic.
    async fn recv_business(&mut self) -> anyhow::Result<(Header, FixMessage)> {
        loop {
            let (header, message) = self.recv().await?;
            match message {
                FixMessage::Heartbeat(_) | FixMessage::TestRequest(_) => continue,
                message => return Ok((header, message)),
            }
        }
    }

    async fn expect_closed(&mut self) -> anyhow::Result<()> {
        let deadline = Duration::from_secs(5);
        loop {
            let read = tokio::time::timeout(deadline, self.stream.read_buf(&mut self.buf)).await??;
            if read == 0 {
                return Ok(());
            }
        }
    }
}

fn logon(username: &str, password: &str) -> FixMessage {
    FixMessage::Logon(Logon {
        encrypt_method: 0,
        heart_bt_int: 30,
        reset_seq_num_flag: true,
        username: username.to_owned(),
        password: Some(password.to_owned()),
        raw_data: None,
    })
}

fn new_order(cl_ord_id: &str, symbol: &str) -> FixMessage {
    FixMessage::NewOrderSingle(NewOrderSingle {
        cl_ord_id: cl_ord_id.to_owned(),
        symbol: symbol.to_owned(),
        security_exchange: None,
        side: '1',
        ord_type: '2',
        price: Some("42000".into()),
        order_qty: Some("1".into()),
        time_in_force: None,
        parties: vec![],
    })
}

// ── logon handshake ───────────────────────────────────────────────────

#[tokio::test]
async fn logon_with_valid_credentials_succeeds() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&logon("alice", "s3cret")).await?;
    let (header, message) = peer.recv().await?;

    assert_eq!(header.sender_comp_id, "proxy");
    assert_eq!(header.target_comp_id, "cli-1");
    assert_eq!(header.msg_seq_num, 1);
    let FixMessage::Logon(response) = message else {
        anyhow::bail!("expected logon response, got {message:?}");
    };
    assert_eq!(response.heart_bt_int, 30);
    assert_eq!(harness.shared.session_find("alice"), Some(1));
    Ok(())
}

#[tokio::test]
async fn logon_with_bad_password_is_refused() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&logon("alice", "wrong")).await?;
    let (_, message) = peer.recv().await?;

    let FixMessage::Logout(logout) = message else {
        anyhow::bail!("expected logout, got {message:?}");
    };
    assert_eq!(logout.text.as_deref(), Some("INVALID_PASSWORD"));
    peer.expect_closed().await?;
    Ok(())
}

#[tokio::test]
async fn second_logon_for_bound_username_is_refused() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;

    let mut first = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;
    first.send(&logon("alice", "s3cret")).await?;
    let (_, message) = first.recv().await?;
    assert!(matches!(message, FixMessage::Logon(_)));

    let mut second = Peer::connect(harness.client_addr, "cli-2", "proxy").await?;
    second.send(&logon("alice", "s3cret")).await?;
    let (_, message) = second.recv().await?;
    let FixMessage::Logout(logout) = message else {
        anyhow::bail!("expected logout, got {message:?}");
    };
    assert_eq!(logout.text.as_deref(), Some("ALREADY_LOGGED_ON"));
    Ok(())
}

#[tokio::test]
async fn silent_client_is_reaped_after_logon_timeout() -> anyhow::Result<()> {
    let harness = start(test_settings(1), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;
    // Send nothing; the logon timeout converts the session to a zombie and
    // the sweep closes it.
    peer.expect_closed().await?;
    Ok(())
}

#[tokio::test]
async fn non_logon_first_message_is_rejected() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&new_order("x1", "BTC-USD")).await?;
    let (_, message) = peer.recv().await?;
    let FixMessage::Reject(reject) = message else {
        anyhow::bail!("expected session reject, got {message:?}");
    };
    assert_eq!(reject.session_reject_reason, Some(11));
    peer.expect_closed().await?;
    Ok(())
}

// ── request validation ────────────────────────────────────────────────

#[tokio::test]
async fn order_for_unlisted_symbol_is_rejected() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&logon("alice", "s3cret")).await?;
    let _ = peer.recv().await?;

    peer.send(&new_order("x1", "FAKE")).await?;
    let (_, message) = peer.recv_business().await?;
    let FixMessage::BusinessMessageReject(reject) = message else {
        anyhow::bail!("expected business reject, got {message:?}");
    };
    assert_eq!(reject.ref_msg_type, "D");
    assert_eq!(reject.business_reject_ref_id.as_deref(), Some("x1"));
    assert_eq!(reject.text.as_deref(), Some("UNKNOWN_SYMBOL"));
    Ok(())
}

#[tokio::test]
async fn order_while_venue_down_is_rejected_not_ready() -> anyhow::Result<()> {
    // venue-1 is configured but there is nothing listening.
    let unused = TcpListener::bind("127.0.0.1:0").await?;
    let venue_addr = unused.local_addr()?;
    drop(unused);

    let harness = start(test_settings(10), &[("venue-1", venue_addr)]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&logon("alice", "s3cret")).await?;
    let _ = peer.recv().await?;

    peer.send(&new_order("x1", "BTC-USD")).await?;
    let (_, message) = peer.recv_business().await?;
    let FixMessage::BusinessMessageReject(reject) = message else {
        anyhow::bail!("expected business reject, got {message:?}");
    };
    assert_eq!(reject.text.as_deref(), Some("NOT_READY"));
    Ok(())
}

// ── sequence discipline ───────────────────────────────────────────────

#[tokio::test]
async fn sequence_gap_forces_logout_and_reap() -> anyhow::Result<()> {
    let harness = start(test_settings(10), &[]).await?;
    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;

    peer.send(&logon("alice", "s3cret")).await?;
    let _ = peer.recv().await?;

    // Expected seq is 2; send 4.
    peer.send_with_seq(&new_order("x1", "BTC-USD"), 4).await?;
    let (_, message) = peer.recv_business().await?;
    let FixMessage::Logout(logout) = message else {
        anyhow::bail!("expected logout, got {message:?}");
    };
    assert_eq!(logout.text.as_deref(), Some("msg_seq_num mismatch"));
    peer.expect_closed().await?;

    // The binding is released by the next reaper sweep.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while harness.shared.session_find("alice").is_some() {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("binding never released");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // Alice can log on again.
    let mut again = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;
    again.send(&logon("alice", "s3cret")).await?;
    let (_, message) = again.recv().await?;
    assert!(matches!(message, FixMessage::Logon(_)));
    Ok(())
}

// ── full round-trip through a mock venue ──────────────────────────────

/// Minimal venue: answers logon and the security download, then reports one
/// execution for the first order it sees.
async fn run_mock_venue(listener: TcpListener) -> anyhow::Result<()> {
    let (stream, _) = listener.accept().await?;
    let mut peer = Peer::new(stream, "venue", "proxy");

    let (_, message) = peer.recv().await?;
    let FixMessage::Logon(_) = message else {
        anyhow::bail!("venue expected logon, got {message:?}");
    };
    peer.send(&FixMessage::Logon(Logon {
        encrypt_method: 0,
        heart_bt_int: 30,
        reset_seq_num_flag: true,
        username: "gateway".into(),
        password: None,
        raw_data: None,
    }))
    .await?;

    let (_, message) = peer.recv().await?;
    let FixMessage::SecurityListRequest(request) = message else {
        anyhow::bail!("venue expected security list request, got {message:?}");
    };
    peer.send(&FixMessage::SecurityList(SecurityList {
        security_req_id: request.security_req_id,
        security_response_id: "sr-1".into(),
        security_request_result: 0,
        last_fragment: true,
        securities: vec![
            SecurityListEntry { symbol: "BTC-USD".into(), security_exchange: "deribit".into() },
            SecurityListEntry { symbol: "DOGE-USD".into(), security_exchange: "deribit".into() },
        ],
    }))
    .await?;

    // Only BTC-USD passes the allow-list, so exactly one definition request.
    let (_, message) = peer.recv().await?;
    let FixMessage::SecurityDefinitionRequest(request) = message else {
        anyhow::bail!("venue expected security definition request, got {message:?}");
    };
    assert_eq!(request.symbol, "BTC-USD");
    peer.send(&FixMessage::SecurityDefinition(SecurityDefinition {
        security_response_id: "sd-1".into(),
        security_response_type: 4,
        symbol: "BTC-USD".into(),
        security_exchange: "deribit".into(),
    }))
    .await?;

    let (_, message) = peer.recv_business().await?;
    let FixMessage::NewOrderSingle(order) = message else {
        anyhow::bail!("venue expected order, got {message:?}");
    };
    // The gateway stamps the client identity into the party group.
    let roles: Vec<(u32, &str)> =
        order.parties.iter().map(|p| (p.party_role, p.party_id.as_str())).collect();
    assert!(roles.contains(&(codec::PARTY_ROLE_CLIENT_ID, "alice")));
    assert!(roles.contains(&(codec::PARTY_ROLE_ORDER_ORIGINATION_TRADER, "42")));

    peer.send(&FixMessage::ExecutionReport(ExecutionReport {
        order_id: "v-1".into(),
        cl_ord_id: Some(order.cl_ord_id),
        orig_cl_ord_id: None,
        exec_id: "e-1".into(),
        exec_type: '0',
        ord_status: '0',
        symbol: order.symbol,
        side: order.side,
        order_qty: order.order_qty,
        price: order.price,
        last_qty: None,
        last_px: None,
        leaves_qty: "1".into(),
        cum_qty: "0".into(),
        avg_px: None,
        text: None,
        parties: order.parties,
    }))
    .await?;

    // Keep the connection open until the harness shuts down.
    let _ = peer.recv().await;
    Ok(())
}

#[tokio::test]
async fn order_round_trips_through_the_venue() -> anyhow::Result<()> {
    let venue_listener = TcpListener::bind("127.0.0.1:0").await?;
    let venue_addr = venue_listener.local_addr()?;
    let venue = tokio::spawn(run_mock_venue(venue_listener));

    let harness = start(test_settings(10), &[("venue-1", venue_addr)]).await?;

    // Wait for the security download to finish.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !harness.shared.component_ready("venue-1") {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("venue never became ready");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(harness.shared.known_symbols(), vec!["BTC-USD".to_owned()]);

    let mut peer = Peer::connect(harness.client_addr, "cli-1", "proxy").await?;
    peer.send(&logon("alice", "s3cret")).await?;
    let (_, message) = peer.recv().await?;
    assert!(matches!(message, FixMessage::Logon(_)));

    peer.send(&new_order("x1", "BTC-USD")).await?;
    let (_, message) = peer.recv_business().await?;
    let FixMessage::ExecutionReport(report) = message else {
        anyhow::bail!("expected execution report, got {message:?}");
    };
    assert_eq!(report.cl_ord_id.as_deref(), Some("x1"));
    assert_eq!(report.ord_status, '0');

    drop(harness);
    venue.abort();
    Ok(())
}
