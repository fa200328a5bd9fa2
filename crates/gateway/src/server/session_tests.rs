// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::codec::message::*;
use crate::config::Config;
use crate::controller::ProxyEvent;
use crate::crypto::Method;

fn test_settings() -> Settings {
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
        logon_timeout_secs: 10,
        fix_decode_buffer_size: 1_048_576,
        fix_encode_buffer_size: 65_536,
        hmac_sha256: false,
        connections: vec!["venue-1=tcp://127.0.0.1:0".into()],
    }
}

struct Fixture {
    session: Session,
    event_rx: mpsc::UnboundedReceiver<ProxyEvent>,
    _command_tx: mpsc::UnboundedSender<Command>,
}

fn fixture() -> anyhow::Result<Fixture> {
    let config = Config::parse_text("symbols = [\"^BTC-.*$\"]")?;
    let shared = Arc::new(Shared::new(Method::Simple, &config)?);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let session = Session::new(
        "venue-1".into(),
        "127.0.0.1:0".into(),
        Arc::new(test_settings()),
        shared,
        event_tx,
        command_rx,
        CancellationToken::new(),
    );
    Ok(Fixture { session, event_rx, _command_tx: command_tx })
}

fn report(cl_ord_id: Option<&str>, parties: Vec<Party>) -> ExecutionReport {
    ExecutionReport {
        order_id: "o-1".into(),
        cl_ord_id: cl_ord_id.map(str::to_owned),
        orig_cl_ord_id: None,
        exec_id: "e-1".into(),
        exec_type: '0',
        ord_status: '0',
        symbol: "BTC-USD".into(),
        side: '1',
        order_qty: None,
        price: None,
        last_qty: None,
        last_px: None,
        leaves_qty: "1".into(),
        cum_qty: "0".into(),
        avg_px: None,
        text: None,
        parties,
    }
}

// ── response routing ──────────────────────────────────────────────────

#[tokio::test]
async fn execution_report_routes_by_party_echo() -> anyhow::Result<()> {
    let fixture = fixture()?;
    let parties =
        vec![Party { party_id: "alice".into(), party_id_source: 'D', party_role: 3 }];
    assert_eq!(fixture.session.execution_report_route(&report(None, parties)), "alice");
    Ok(())
}

#[tokio::test]
async fn execution_report_falls_back_to_order_route_map() -> anyhow::Result<()> {
    let mut fixture = fixture()?;
    fixture.session.order_routes.insert("x1".into(), "bob".into());
    assert_eq!(fixture.session.execution_report_route(&report(Some("x1"), vec![])), "bob");
    Ok(())
}

#[tokio::test]
async fn execution_report_without_route_uses_configured_user() -> anyhow::Result<()> {
    let fixture = fixture()?;
    assert_eq!(fixture.session.execution_report_route(&report(Some("zz"), vec![])), "gateway");
    Ok(())
}

#[tokio::test]
async fn market_data_without_subscription_is_dropped() -> anyhow::Result<()> {
    let mut fixture = fixture()?;
    assert_eq!(fixture.session.md_route(Some("md-9")), None);
    assert_eq!(fixture.session.md_route(None), None);

    fixture.session.md_routes.insert("md-1".into(), "alice".into());
    assert_eq!(fixture.session.md_route(Some("md-1")).as_deref(), Some("alice"));
    Ok(())
}

// ── not-ready rejection ───────────────────────────────────────────────

#[tokio::test]
async fn reject_not_ready_emits_business_reject_for_user() -> anyhow::Result<()> {
    let mut fixture = fixture()?;
    let order = FixMessage::NewOrderSingle(NewOrderSingle {
        cl_ord_id: "x1".into(),
        symbol: "BTC-USD".into(),
        security_exchange: None,
        side: '1',
        ord_type: '1',
        price: None,
        order_qty: Some("1".into()),
        time_in_force: None,
        parties: vec![],
    });
    fixture.session.reject_not_ready(Command::Forward {
        username: "alice".into(),
        message: order,
    });

    let event = fixture.event_rx.recv().await.ok_or_else(|| anyhow::anyhow!("no event"))?;
    let ProxyEvent::FromServer { component, username, message } = event else {
        anyhow::bail!("wrong event kind");
    };
    assert_eq!(component, "venue-1");
    assert_eq!(username.as_deref(), Some("alice"));
    let FixMessage::BusinessMessageReject(reject) = message else {
        anyhow::bail!("expected business reject");
    };
    assert_eq!(reject.ref_msg_type, "D");
    assert_eq!(reject.business_reject_ref_id.as_deref(), Some("x1"));
    assert_eq!(reject.text.as_deref(), Some("NOT_READY"));
    Ok(())
}
