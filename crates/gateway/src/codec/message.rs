// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed FIX 4.4 messages.
//!
//! [`FixMessage`] is a sum type with one variant per supported message; all
//! routing is a single match on the variant. Price and quantity fields stay
//! as decimal strings — the gateway routes order flow, it does not interpret
//! it.

use serde::{Deserialize, Serialize};

/// FIX MsgType (tag 35).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    Heartbeat,
    TestRequest,
    ResendRequest,
    Reject,
    Logout,
    Logon,
    NewOrderSingle,
    OrderCancelRequest,
    OrderCancelReplaceRequest,
    OrderStatusRequest,
    OrderMassStatusRequest,
    OrderMassCancelRequest,
    ExecutionReport,
    OrderCancelReject,
    BusinessMessageReject,
    SecurityListRequest,
    SecurityList,
    SecurityDefinitionRequest,
    SecurityDefinition,
    MarketDataRequest,
    MarketDataSnapshotFullRefresh,
    MarketDataIncrementalRefresh,
    MarketDataRequestReject,
    RequestForPositions,
    TradeCaptureReport,
}

impl MsgType {
    pub fn wire(&self) -> &'static str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::Logout => "5",
            Self::Logon => "A",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderCancelReplaceRequest => "G",
            Self::OrderStatusRequest => "H",
            Self::OrderMassStatusRequest => "AF",
            Self::OrderMassCancelRequest => "q",
            Self::ExecutionReport => "8",
            Self::OrderCancelReject => "9",
            Self::BusinessMessageReject => "j",
            Self::SecurityListRequest => "x",
            Self::SecurityList => "y",
            Self::SecurityDefinitionRequest => "c",
            Self::SecurityDefinition => "d",
            Self::MarketDataRequest => "V",
            Self::MarketDataSnapshotFullRefresh => "W",
            Self::MarketDataIncrementalRefresh => "X",
            Self::MarketDataRequestReject => "Y",
            Self::RequestForPositions => "AN",
            Self::TradeCaptureReport => "AE",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Some(match value {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "5" => Self::Logout,
            "A" => Self::Logon,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "G" => Self::OrderCancelReplaceRequest,
            "H" => Self::OrderStatusRequest,
            "AF" => Self::OrderMassStatusRequest,
            "q" => Self::OrderMassCancelRequest,
            "8" => Self::ExecutionReport,
            "9" => Self::OrderCancelReject,
            "j" => Self::BusinessMessageReject,
            "x" => Self::SecurityListRequest,
            "y" => Self::SecurityList,
            "c" => Self::SecurityDefinitionRequest,
            "d" => Self::SecurityDefinition,
            "V" => Self::MarketDataRequest,
            "W" => Self::MarketDataSnapshotFullRefresh,
            "X" => Self::MarketDataIncrementalRefresh,
            "Y" => Self::MarketDataRequestReject,
            "AN" => Self::RequestForPositions,
            "AE" => Self::TradeCaptureReport,
            _ => return None,
        })
    }
}

/// Decoded standard header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MsgType,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    pub msg_seq_num: u64,
    pub sending_time: String,
}

/// Party identification, repeating group 453.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: String,
    pub party_id_source: char,
    pub party_role: u32,
}

// -- Administrative messages --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logon {
    pub encrypt_method: u32,
    pub heart_bt_int: u64,
    pub reset_seq_num_flag: bool,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_req_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRequest {
    pub test_req_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendRequest {
    pub begin_seq_no: u64,
    pub end_seq_no: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    pub ref_seq_num: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_msg_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_reject_reason: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// -- Order management ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderSingle {
    pub cl_ord_id: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_exchange: Option<String>,
    pub side: char,
    pub ord_type: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<char>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelRequest {
    pub orig_cl_ord_id: String,
    pub cl_ord_id: String,
    pub symbol: String,
    pub side: char,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelReplaceRequest {
    pub orig_cl_ord_id: String,
    pub cl_ord_id: String,
    pub symbol: String,
    pub side: char,
    pub ord_type: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusRequest {
    pub cl_ord_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ord_status_req_id: Option<String>,
    pub symbol: String,
    pub side: char,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMassStatusRequest {
    pub mass_status_req_id: String,
    pub mass_status_req_type: u32,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMassCancelRequest {
    pub cl_ord_id: String,
    pub mass_cancel_request_type: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cl_ord_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_cl_ord_id: Option<String>,
    pub exec_id: String,
    pub exec_type: char,
    pub ord_status: char,
    pub symbol: String,
    pub side: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_qty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_px: Option<String>,
    pub leaves_qty: String,
    pub cum_qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelReject {
    pub order_id: String,
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub ord_status: char,
    pub cxl_rej_response_to: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxl_rej_reason: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessMessageReject {
    pub ref_seq_num: u64,
    pub ref_msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_reject_ref_id: Option<String>,
    pub business_reject_reason: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// -- Security download --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityListRequest {
    pub security_req_id: String,
    /// 4 = all securities.
    pub security_list_request_type: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityListEntry {
    pub symbol: String,
    pub security_exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityList {
    pub security_req_id: String,
    pub security_response_id: String,
    /// 0 = valid request.
    pub security_request_result: u32,
    pub last_fragment: bool,
    pub securities: Vec<SecurityListEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDefinitionRequest {
    pub security_req_id: String,
    /// 3 = request list of securities.
    pub security_request_type: u32,
    pub symbol: String,
    pub security_exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDefinition {
    pub security_response_id: String,
    pub security_response_type: u32,
    pub symbol: String,
    pub security_exchange: String,
}

// -- Market data --------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataRequest {
    pub md_req_id: String,
    pub subscription_request_type: char,
    pub market_depth: u32,
    pub md_entry_types: Vec<char>,
    pub symbols: Vec<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdEntry {
    pub md_entry_type: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_entry_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_entry_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataSnapshotFullRefresh {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_req_id: Option<String>,
    pub symbol: String,
    pub entries: Vec<MdEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdIncEntry {
    pub md_update_action: char,
    pub md_entry_type: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_entry_px: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_entry_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataIncrementalRefresh {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_req_id: Option<String>,
    pub entries: Vec<MdIncEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataRequestReject {
    pub md_req_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_req_rej_reason: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// -- Sum type -----------------------------------------------------------------

/// One variant per supported FIX message.
///
/// `Unsupported` covers msg-types the gateway recognises on the wire but
/// never interprets (positions, trade capture); the client side answers them
/// with a BusinessMessageReject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixMessage {
    Logon(Logon),
    Logout(Logout),
    Heartbeat(Heartbeat),
    TestRequest(TestRequest),
    ResendRequest(ResendRequest),
    Reject(Reject),
    NewOrderSingle(NewOrderSingle),
    OrderCancelRequest(OrderCancelRequest),
    OrderCancelReplaceRequest(OrderCancelReplaceRequest),
    OrderStatusRequest(OrderStatusRequest),
    OrderMassStatusRequest(OrderMassStatusRequest),
    OrderMassCancelRequest(OrderMassCancelRequest),
    ExecutionReport(ExecutionReport),
    OrderCancelReject(OrderCancelReject),
    BusinessMessageReject(BusinessMessageReject),
    SecurityListRequest(SecurityListRequest),
    SecurityList(SecurityList),
    SecurityDefinitionRequest(SecurityDefinitionRequest),
    SecurityDefinition(SecurityDefinition),
    MarketDataRequest(MarketDataRequest),
    MarketDataSnapshotFullRefresh(MarketDataSnapshotFullRefresh),
    MarketDataIncrementalRefresh(MarketDataIncrementalRefresh),
    MarketDataRequestReject(MarketDataRequestReject),
    Unsupported { msg_type: MsgType },
}

impl FixMessage {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::Logon(_) => MsgType::Logon,
            Self::Logout(_) => MsgType::Logout,
            Self::Heartbeat(_) => MsgType::Heartbeat,
            Self::TestRequest(_) => MsgType::TestRequest,
            Self::ResendRequest(_) => MsgType::ResendRequest,
            Self::Reject(_) => MsgType::Reject,
            Self::NewOrderSingle(_) => MsgType::NewOrderSingle,
            Self::OrderCancelRequest(_) => MsgType::OrderCancelRequest,
            Self::OrderCancelReplaceRequest(_) => MsgType::OrderCancelReplaceRequest,
            Self::OrderStatusRequest(_) => MsgType::OrderStatusRequest,
            Self::OrderMassStatusRequest(_) => MsgType::OrderMassStatusRequest,
            Self::OrderMassCancelRequest(_) => MsgType::OrderMassCancelRequest,
            Self::ExecutionReport(_) => MsgType::ExecutionReport,
            Self::OrderCancelReject(_) => MsgType::OrderCancelReject,
            Self::BusinessMessageReject(_) => MsgType::BusinessMessageReject,
            Self::SecurityListRequest(_) => MsgType::SecurityListRequest,
            Self::SecurityList(_) => MsgType::SecurityList,
            Self::SecurityDefinitionRequest(_) => MsgType::SecurityDefinitionRequest,
            Self::SecurityDefinition(_) => MsgType::SecurityDefinition,
            Self::MarketDataRequest(_) => MsgType::MarketDataRequest,
            Self::MarketDataSnapshotFullRefresh(_) => MsgType::MarketDataSnapshotFullRefresh,
            Self::MarketDataIncrementalRefresh(_) => MsgType::MarketDataIncrementalRefresh,
            Self::MarketDataRequestReject(_) => MsgType::MarketDataRequestReject,
            Self::Unsupported { msg_type } => *msg_type,
        }
    }

    /// The symbol a business request refers to, when it carries one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::NewOrderSingle(msg) => Some(&msg.symbol),
            Self::OrderCancelRequest(msg) => Some(&msg.symbol),
            Self::OrderCancelReplaceRequest(msg) => Some(&msg.symbol),
            Self::OrderStatusRequest(msg) => Some(&msg.symbol),
            Self::OrderMassCancelRequest(msg) => msg.symbol.as_deref(),
            _ => None,
        }
    }

    /// Mutable access to the party repeating group for request stamping.
    pub fn parties_mut(&mut self) -> Option<&mut Vec<Party>> {
        match self {
            Self::NewOrderSingle(msg) => Some(&mut msg.parties),
            Self::OrderCancelRequest(msg) => Some(&mut msg.parties),
            Self::OrderCancelReplaceRequest(msg) => Some(&mut msg.parties),
            Self::OrderStatusRequest(msg) => Some(&mut msg.parties),
            Self::OrderMassStatusRequest(msg) => Some(&mut msg.parties),
            Self::OrderMassCancelRequest(msg) => Some(&mut msg.parties),
            Self::MarketDataRequest(msg) => Some(&mut msg.parties),
            _ => None,
        }
    }

    /// Client-assigned request id, used as BusinessRejectRefID.
    pub fn request_ref_id(&self) -> Option<&str> {
        match self {
            Self::NewOrderSingle(msg) => Some(&msg.cl_ord_id),
            Self::OrderCancelRequest(msg) => Some(&msg.cl_ord_id),
            Self::OrderCancelReplaceRequest(msg) => Some(&msg.cl_ord_id),
            Self::OrderStatusRequest(msg) => Some(&msg.cl_ord_id),
            Self::OrderMassStatusRequest(msg) => Some(&msg.mass_status_req_id),
            Self::OrderMassCancelRequest(msg) => Some(&msg.cl_ord_id),
            Self::MarketDataRequest(msg) => Some(&msg.md_req_id),
            _ => None,
        }
    }
}
