// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIX message encoder.

use std::fmt;
use std::io::Write as _;

use bytes::BytesMut;
use chrono::{DateTime, Utc};

use super::message::*;
use super::tag;

/// Header fields stamped onto every outbound message.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    pub sender_comp_id: &'a str,
    pub target_comp_id: &'a str,
    pub msg_seq_num: u64,
    pub sending_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Appending the frame would exceed the session's encode buffer bound.
    BufferFull { needed: usize, limit: usize },
    /// The message type cannot be constructed by the gateway.
    Unsupported(MsgType),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferFull { needed, limit } => {
                write!(f, "encode buffer full ({needed} > {limit} bytes)")
            }
            Self::Unsupported(msg_type) => {
                write!(f, "cannot encode msg type {}", msg_type.wire())
            }
        }
    }
}

impl std::error::Error for EncodeError {}

const SOH: u8 = 0x01;
const BEGIN_STRING: &str = "FIX.4.4";

/// Tag=value field writer. Writes into a `Vec<u8>`, which cannot fail.
struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    fn new() -> Self {
        Self { buf: Vec::with_capacity(256) }
    }

    fn field(&mut self, tag: u32, value: impl fmt::Display) {
        let _ = write!(self.buf, "{tag}={value}");
        self.buf.push(SOH);
    }

    fn opt(&mut self, tag: u32, value: Option<impl fmt::Display>) {
        if let Some(value) = value {
            self.field(tag, value);
        }
    }

    fn flag(&mut self, tag: u32, value: bool) {
        self.field(tag, if value { 'Y' } else { 'N' });
    }

    fn parties(&mut self, parties: &[Party]) {
        if parties.is_empty() {
            return;
        }
        self.field(tag::NO_PARTY_IDS, parties.len());
        for party in parties {
            self.field(tag::PARTY_ID, &party.party_id);
            self.field(tag::PARTY_ID_SOURCE, party.party_id_source);
            self.field(tag::PARTY_ROLE, party.party_role);
        }
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().map(|b| u32::from(*b)).sum::<u32>() % 256
}

/// Encode `message` with the given header fields, appending the framed bytes
/// to `out`. Fails when the buffer would grow past `limit`.
pub fn encode(
    message: &FixMessage,
    envelope: &Envelope<'_>,
    out: &mut BytesMut,
    limit: usize,
) -> Result<(), EncodeError> {
    let mut body = FieldWriter::new();
    body.field(tag::MSG_TYPE, message.msg_type().wire());
    body.field(tag::SENDER_COMP_ID, envelope.sender_comp_id);
    body.field(tag::TARGET_COMP_ID, envelope.target_comp_id);
    body.field(tag::MSG_SEQ_NUM, envelope.msg_seq_num);
    body.field(tag::SENDING_TIME, envelope.sending_time.format("%Y%m%d-%H:%M:%S%.3f"));
    write_body(message, &mut body)?;

    let mut frame = Vec::with_capacity(body.buf.len() + 32);
    let _ = write!(frame, "8={BEGIN_STRING}");
    frame.push(SOH);
    let _ = write!(frame, "9={}", body.buf.len());
    frame.push(SOH);
    frame.extend_from_slice(&body.buf);
    let _ = write!(frame, "10={:03}", checksum(&frame));
    frame.push(SOH);

    let needed = out.len() + frame.len();
    if needed > limit {
        return Err(EncodeError::BufferFull { needed, limit });
    }
    out.extend_from_slice(&frame);
    Ok(())
}

fn write_body(message: &FixMessage, w: &mut FieldWriter) -> Result<(), EncodeError> {
    match message {
        FixMessage::Logon(msg) => {
            w.field(tag::ENCRYPT_METHOD, msg.encrypt_method);
            w.field(tag::HEART_BT_INT, msg.heart_bt_int);
            w.flag(tag::RESET_SEQ_NUM_FLAG, msg.reset_seq_num_flag);
            w.field(tag::USERNAME, &msg.username);
            w.opt(tag::PASSWORD, msg.password.as_ref());
            if let Some(ref raw_data) = msg.raw_data {
                w.field(tag::RAW_DATA_LENGTH, raw_data.len());
                w.field(tag::RAW_DATA, raw_data);
            }
        }
        FixMessage::Logout(msg) => {
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::Heartbeat(msg) => {
            w.opt(tag::TEST_REQ_ID, msg.test_req_id.as_ref());
        }
        FixMessage::TestRequest(msg) => {
            w.field(tag::TEST_REQ_ID, &msg.test_req_id);
        }
        FixMessage::ResendRequest(msg) => {
            w.field(tag::BEGIN_SEQ_NO, msg.begin_seq_no);
            w.field(tag::END_SEQ_NO, msg.end_seq_no);
        }
        FixMessage::Reject(msg) => {
            w.field(tag::REF_SEQ_NUM, msg.ref_seq_num);
            w.opt(tag::REF_MSG_TYPE, msg.ref_msg_type.as_ref());
            w.opt(tag::SESSION_REJECT_REASON, msg.session_reject_reason);
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::NewOrderSingle(msg) => {
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.parties(&msg.parties);
            w.field(tag::SYMBOL, &msg.symbol);
            w.opt(tag::SECURITY_EXCHANGE, msg.security_exchange.as_ref());
            w.field(tag::SIDE, msg.side);
            w.field(tag::ORD_TYPE, msg.ord_type);
            w.opt(tag::PRICE, msg.price.as_ref());
            w.opt(tag::ORDER_QTY, msg.order_qty.as_ref());
            w.opt(tag::TIME_IN_FORCE, msg.time_in_force);
        }
        FixMessage::OrderCancelRequest(msg) => {
            w.field(tag::ORIG_CL_ORD_ID, &msg.orig_cl_ord_id);
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.parties(&msg.parties);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SIDE, msg.side);
        }
        FixMessage::OrderCancelReplaceRequest(msg) => {
            w.field(tag::ORIG_CL_ORD_ID, &msg.orig_cl_ord_id);
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.parties(&msg.parties);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SIDE, msg.side);
            w.field(tag::ORD_TYPE, msg.ord_type);
            w.opt(tag::PRICE, msg.price.as_ref());
            w.opt(tag::ORDER_QTY, msg.order_qty.as_ref());
        }
        FixMessage::OrderStatusRequest(msg) => {
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.opt(tag::ORD_STATUS_REQ_ID, msg.ord_status_req_id.as_ref());
            w.parties(&msg.parties);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SIDE, msg.side);
        }
        FixMessage::OrderMassStatusRequest(msg) => {
            w.field(tag::MASS_STATUS_REQ_ID, &msg.mass_status_req_id);
            w.field(tag::MASS_STATUS_REQ_TYPE, msg.mass_status_req_type);
            w.parties(&msg.parties);
        }
        FixMessage::OrderMassCancelRequest(msg) => {
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.field(tag::MASS_CANCEL_REQUEST_TYPE, msg.mass_cancel_request_type);
            w.opt(tag::SYMBOL, msg.symbol.as_ref());
            w.parties(&msg.parties);
        }
        FixMessage::ExecutionReport(msg) => {
            w.field(tag::ORDER_ID, &msg.order_id);
            w.opt(tag::CL_ORD_ID, msg.cl_ord_id.as_ref());
            w.opt(tag::ORIG_CL_ORD_ID, msg.orig_cl_ord_id.as_ref());
            w.field(tag::EXEC_ID, &msg.exec_id);
            w.field(tag::EXEC_TYPE, msg.exec_type);
            w.field(tag::ORD_STATUS, msg.ord_status);
            w.parties(&msg.parties);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SIDE, msg.side);
            w.opt(tag::ORDER_QTY, msg.order_qty.as_ref());
            w.opt(tag::PRICE, msg.price.as_ref());
            w.opt(tag::LAST_QTY, msg.last_qty.as_ref());
            w.opt(tag::LAST_PX, msg.last_px.as_ref());
            w.field(tag::LEAVES_QTY, &msg.leaves_qty);
            w.field(tag::CUM_QTY, &msg.cum_qty);
            w.opt(tag::AVG_PX, msg.avg_px.as_ref());
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::OrderCancelReject(msg) => {
            w.field(tag::ORDER_ID, &msg.order_id);
            w.field(tag::CL_ORD_ID, &msg.cl_ord_id);
            w.field(tag::ORIG_CL_ORD_ID, &msg.orig_cl_ord_id);
            w.field(tag::ORD_STATUS, msg.ord_status);
            w.field(tag::CXL_REJ_RESPONSE_TO, msg.cxl_rej_response_to);
            w.opt(tag::CXL_REJ_REASON, msg.cxl_rej_reason);
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::BusinessMessageReject(msg) => {
            w.field(tag::REF_SEQ_NUM, msg.ref_seq_num);
            w.field(tag::REF_MSG_TYPE, &msg.ref_msg_type);
            w.opt(tag::BUSINESS_REJECT_REF_ID, msg.business_reject_ref_id.as_ref());
            w.field(tag::BUSINESS_REJECT_REASON, msg.business_reject_reason);
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::SecurityListRequest(msg) => {
            w.field(tag::SECURITY_REQ_ID, &msg.security_req_id);
            w.field(tag::SECURITY_LIST_REQUEST_TYPE, msg.security_list_request_type);
        }
        FixMessage::SecurityList(msg) => {
            w.field(tag::SECURITY_REQ_ID, &msg.security_req_id);
            w.field(tag::SECURITY_RESPONSE_ID, &msg.security_response_id);
            w.field(tag::SECURITY_REQUEST_RESULT, msg.security_request_result);
            w.flag(tag::LAST_FRAGMENT, msg.last_fragment);
            w.field(tag::NO_RELATED_SYM, msg.securities.len());
            for entry in &msg.securities {
                w.field(tag::SYMBOL, &entry.symbol);
                w.field(tag::SECURITY_EXCHANGE, &entry.security_exchange);
            }
        }
        FixMessage::SecurityDefinitionRequest(msg) => {
            w.field(tag::SECURITY_REQ_ID, &msg.security_req_id);
            w.field(tag::SECURITY_REQUEST_TYPE, msg.security_request_type);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SECURITY_EXCHANGE, &msg.security_exchange);
        }
        FixMessage::SecurityDefinition(msg) => {
            w.field(tag::SECURITY_RESPONSE_ID, &msg.security_response_id);
            w.field(tag::SECURITY_RESPONSE_TYPE, msg.security_response_type);
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::SECURITY_EXCHANGE, &msg.security_exchange);
        }
        FixMessage::MarketDataRequest(msg) => {
            w.field(tag::MD_REQ_ID, &msg.md_req_id);
            w.field(tag::SUBSCRIPTION_REQUEST_TYPE, msg.subscription_request_type);
            w.field(tag::MARKET_DEPTH, msg.market_depth);
            w.field(tag::NO_MD_ENTRY_TYPES, msg.md_entry_types.len());
            for entry_type in &msg.md_entry_types {
                w.field(tag::MD_ENTRY_TYPE, entry_type);
            }
            w.field(tag::NO_RELATED_SYM, msg.symbols.len());
            for symbol in &msg.symbols {
                w.field(tag::SYMBOL, symbol);
            }
            w.parties(&msg.parties);
        }
        FixMessage::MarketDataSnapshotFullRefresh(msg) => {
            w.opt(tag::MD_REQ_ID, msg.md_req_id.as_ref());
            w.field(tag::SYMBOL, &msg.symbol);
            w.field(tag::NO_MD_ENTRIES, msg.entries.len());
            for entry in &msg.entries {
                w.field(tag::MD_ENTRY_TYPE, entry.md_entry_type);
                w.opt(tag::MD_ENTRY_PX, entry.md_entry_px.as_ref());
                w.opt(tag::MD_ENTRY_SIZE, entry.md_entry_size.as_ref());
            }
        }
        FixMessage::MarketDataIncrementalRefresh(msg) => {
            w.opt(tag::MD_REQ_ID, msg.md_req_id.as_ref());
            w.field(tag::NO_MD_ENTRIES, msg.entries.len());
            for entry in &msg.entries {
                w.field(tag::MD_UPDATE_ACTION, entry.md_update_action);
                w.field(tag::MD_ENTRY_TYPE, entry.md_entry_type);
                w.opt(tag::SYMBOL, entry.symbol.as_ref());
                w.opt(tag::MD_ENTRY_PX, entry.md_entry_px.as_ref());
                w.opt(tag::MD_ENTRY_SIZE, entry.md_entry_size.as_ref());
            }
        }
        FixMessage::MarketDataRequestReject(msg) => {
            w.field(tag::MD_REQ_ID, &msg.md_req_id);
            w.opt(tag::MD_REQ_REJ_REASON, msg.md_req_rej_reason);
            w.opt(tag::TEXT, msg.text.as_ref());
        }
        FixMessage::Unsupported { msg_type } => return Err(EncodeError::Unsupported(*msg_type)),
    }
    Ok(())
}

#[cfg(test)]
#[path = "encode_tests.rs"]
mod tests;
