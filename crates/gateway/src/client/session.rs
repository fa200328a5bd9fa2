// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine and validation helpers shared by both client variants.

use crate::codec::{self, FixMessage, Party};
use crate::shared::Shared;

/// Client session lifecycle.
///
/// `WaitingCreateRoute` is entered after a successful logon whose upstream
/// component is not yet connected; the timer promotes it to `Ready` once the
/// component reports ready. `Zombie` sessions perform no I/O and exist only
/// to be reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    WaitingLogon,
    WaitingCreateRoute,
    Ready,
    WaitingRemoveRoute,
    Zombie,
}

impl State {
    pub fn ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn logged_on(&self) -> bool {
        matches!(self, Self::Ready | Self::WaitingCreateRoute)
    }

    pub fn zombie(&self) -> bool {
        matches!(self, Self::Zombie)
    }
}

/// Append the gateway's party identification to a business request.
///
/// Existing party blocks are preserved; one that claims a different identity
/// for the stamped roles is a conflict and the request must be rejected.
pub fn stamp_party_ids(message: &mut FixMessage, username: &str, strategy_id: u32) -> bool {
    let strategy = strategy_id.to_string();
    let Some(parties) = message.parties_mut() else {
        return true;
    };
    let mut have_client_id = false;
    let mut have_trader = false;
    for party in parties.iter() {
        match party.party_role {
            codec::PARTY_ROLE_CLIENT_ID => {
                if party.party_id != username {
                    return false;
                }
                have_client_id = true;
            }
            codec::PARTY_ROLE_ORDER_ORIGINATION_TRADER => {
                if party.party_id != strategy {
                    return false;
                }
                have_trader = true;
            }
            _ => {}
        }
    }
    if !have_client_id {
        parties.push(Party {
            party_id: username.to_owned(),
            party_id_source: codec::PARTY_ID_SOURCE_PROPRIETARY,
            party_role: codec::PARTY_ROLE_CLIENT_ID,
        });
    }
    if !have_trader {
        parties.push(Party {
            party_id: strategy,
            party_id_source: codec::PARTY_ID_SOURCE_PROPRIETARY,
            party_role: codec::PARTY_ROLE_ORDER_ORIGINATION_TRADER,
        });
    }
    true
}

/// Whether every symbol the request names passes the allow-list.
pub fn symbols_allowed(shared: &Shared, message: &FixMessage) -> bool {
    match message {
        FixMessage::MarketDataRequest(request) => {
            !request.symbols.is_empty()
                && request.symbols.iter().all(|symbol| shared.include(symbol))
        }
        other => match other.symbol() {
            Some(symbol) => shared.include(symbol),
            None => true,
        },
    }
}

/// Whether this message is a client business request the gateway forwards.
pub fn is_business_request(message: &FixMessage) -> bool {
    matches!(
        message,
        FixMessage::NewOrderSingle(_)
            | FixMessage::OrderCancelRequest(_)
            | FixMessage::OrderCancelReplaceRequest(_)
            | FixMessage::OrderStatusRequest(_)
            | FixMessage::OrderMassStatusRequest(_)
            | FixMessage::OrderMassCancelRequest(_)
            | FixMessage::MarketDataRequest(_)
    )
}

/// Build the BusinessMessageReject for a refused client request.
pub fn business_reject(
    ref_seq_num: u64,
    message: &FixMessage,
    reason: u32,
    text: &str,
) -> FixMessage {
    FixMessage::BusinessMessageReject(codec::BusinessMessageReject {
        ref_seq_num,
        ref_msg_type: message.msg_type().wire().to_owned(),
        business_reject_ref_id: message.request_ref_id().map(str::to_owned),
        business_reject_reason: reason,
        text: Some(text.to_owned()),
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
