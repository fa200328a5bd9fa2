// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::codec::message::{MarketDataRequest, NewOrderSingle};
use crate::config::Config;
use crate::crypto::Method;

fn order(parties: Vec<Party>) -> FixMessage {
    FixMessage::NewOrderSingle(NewOrderSingle {
        cl_ord_id: "x1".into(),
        symbol: "BTC-USD".into(),
        security_exchange: None,
        side: '1',
        ord_type: '2',
        price: Some("100".into()),
        order_qty: Some("1".into()),
        time_in_force: None,
        parties,
    })
}

// ── party stamping ────────────────────────────────────────────────────

#[test]
fn stamp_appends_username_and_strategy_parties() -> anyhow::Result<()> {
    let mut message = order(vec![]);
    assert!(stamp_party_ids(&mut message, "alice", 42));

    let FixMessage::NewOrderSingle(decoded) = message else {
        anyhow::bail!("wrong variant");
    };
    assert_eq!(
        decoded.parties,
        vec![
            Party { party_id: "alice".into(), party_id_source: 'D', party_role: 3 },
            Party { party_id: "42".into(), party_id_source: 'D', party_role: 13 },
        ]
    );
    Ok(())
}

#[test]
fn stamp_preserves_unrelated_parties() -> anyhow::Result<()> {
    let existing = Party { party_id: "desk-7".into(), party_id_source: 'D', party_role: 76 };
    let mut message = order(vec![existing.clone()]);
    assert!(stamp_party_ids(&mut message, "alice", 42));

    let FixMessage::NewOrderSingle(decoded) = message else {
        anyhow::bail!("wrong variant");
    };
    assert_eq!(decoded.parties.len(), 3);
    assert_eq!(decoded.parties[0], existing);
    Ok(())
}

#[test]
fn stamp_does_not_duplicate_matching_identity() -> anyhow::Result<()> {
    let mut message = order(vec![Party {
        party_id: "alice".into(),
        party_id_source: 'D',
        party_role: 3,
    }]);
    assert!(stamp_party_ids(&mut message, "alice", 42));

    let FixMessage::NewOrderSingle(decoded) = message else {
        anyhow::bail!("wrong variant");
    };
    let client_ids =
        decoded.parties.iter().filter(|party| party.party_role == 3).count();
    assert_eq!(client_ids, 1);
    Ok(())
}

#[test]
fn stamp_rejects_conflicting_identity() {
    let mut message = order(vec![Party {
        party_id: "mallory".into(),
        party_id_source: 'D',
        party_role: 3,
    }]);
    assert!(!stamp_party_ids(&mut message, "alice", 42));

    let mut message = order(vec![Party {
        party_id: "99".into(),
        party_id_source: 'D',
        party_role: 13,
    }]);
    assert!(!stamp_party_ids(&mut message, "alice", 42));
}

// ── symbol validation ─────────────────────────────────────────────────

fn test_shared() -> anyhow::Result<Shared> {
    let config = Config::parse_text("symbols = [\"^BTC-.*$\"]")?;
    Ok(Shared::new(Method::Simple, &config)?)
}

#[test]
fn order_symbol_must_match_allow_list() -> anyhow::Result<()> {
    let shared = test_shared()?;
    assert!(symbols_allowed(&shared, &order(vec![])));

    let mut bad = order(vec![]);
    if let FixMessage::NewOrderSingle(ref mut msg) = bad {
        msg.symbol = "FAKE".into();
    }
    assert!(!symbols_allowed(&shared, &bad));
    Ok(())
}

#[test]
fn market_data_request_checks_every_symbol() -> anyhow::Result<()> {
    let shared = test_shared()?;
    let request = |symbols: Vec<String>| {
        FixMessage::MarketDataRequest(MarketDataRequest {
            md_req_id: "md-1".into(),
            subscription_request_type: '1',
            market_depth: 0,
            md_entry_types: vec!['0'],
            symbols,
            parties: vec![],
        })
    };
    assert!(symbols_allowed(&shared, &request(vec!["BTC-USD".into()])));
    assert!(!symbols_allowed(&shared, &request(vec!["BTC-USD".into(), "FAKE".into()])));
    assert!(!symbols_allowed(&shared, &request(vec![])));
    Ok(())
}

// ── reject construction ───────────────────────────────────────────────

#[test]
fn business_reject_references_the_request() -> anyhow::Result<()> {
    let reject = business_reject(12, &order(vec![]), 2, "UNKNOWN_SYMBOL");
    let FixMessage::BusinessMessageReject(reject) = reject else {
        anyhow::bail!("wrong variant");
    };
    assert_eq!(reject.ref_seq_num, 12);
    assert_eq!(reject.ref_msg_type, "D");
    assert_eq!(reject.business_reject_ref_id.as_deref(), Some("x1"));
    assert_eq!(reject.business_reject_reason, 2);
    assert_eq!(reject.text.as_deref(), Some("UNKNOWN_SYMBOL"));
    Ok(())
}

// ── state predicates ──────────────────────────────────────────────────

#[test]
fn state_predicates() {
    assert!(State::Ready.ready());
    assert!(State::Ready.logged_on());
    assert!(State::WaitingCreateRoute.logged_on());
    assert!(!State::WaitingCreateRoute.ready());
    assert!(!State::WaitingLogon.logged_on());
    assert!(State::Zombie.zombie());
    assert!(!State::Zombie.logged_on());
}
