// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIX 4.4 tag=value wire codec.
//!
//! Framing: `8=FIX.4.4 | 9=BodyLength | ... | 10=checksum`, SOH (`0x01`)
//! delimited. [`decode`] is incremental — feed it a buffer, get back complete
//! messages and the number of bytes consumed.

pub mod decode;
pub mod encode;
pub mod message;

pub use decode::{decode, next_frame, DecodeError};
pub use encode::{encode, EncodeError, Envelope};
pub use message::*;

/// FIX field tags used by the gateway.
pub mod tag {
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const CHECK_SUM: u32 = 10;
    pub const CL_ORD_ID: u32 = 11;
    pub const CUM_QTY: u32 = 14;
    pub const EXEC_ID: u32 = 17;
    pub const LAST_PX: u32 = 31;
    pub const LAST_QTY: u32 = 32;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const MSG_TYPE: u32 = 35;
    pub const ORDER_ID: u32 = 37;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_STATUS: u32 = 39;
    pub const ORD_TYPE: u32 = 40;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const PRICE: u32 = 44;
    pub const REF_SEQ_NUM: u32 = 45;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const SENDING_TIME: u32 = 52;
    pub const SIDE: u32 = 54;
    pub const SYMBOL: u32 = 55;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const TEXT: u32 = 58;
    pub const TIME_IN_FORCE: u32 = 59;
    pub const RAW_DATA_LENGTH: u32 = 95;
    pub const RAW_DATA: u32 = 96;
    pub const ENCRYPT_METHOD: u32 = 98;
    pub const CXL_REJ_REASON: u32 = 102;
    pub const HEART_BT_INT: u32 = 108;
    pub const TEST_REQ_ID: u32 = 112;
    pub const BEGIN_SEQ_NO: u32 = 7;
    pub const END_SEQ_NO: u32 = 16;
    pub const AVG_PX: u32 = 6;
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    pub const NO_RELATED_SYM: u32 = 146;
    pub const EXEC_TYPE: u32 = 150;
    pub const LEAVES_QTY: u32 = 151;
    pub const SECURITY_EXCHANGE: u32 = 207;
    pub const MD_REQ_ID: u32 = 262;
    pub const SUBSCRIPTION_REQUEST_TYPE: u32 = 263;
    pub const MARKET_DEPTH: u32 = 264;
    pub const NO_MD_ENTRY_TYPES: u32 = 267;
    pub const NO_MD_ENTRIES: u32 = 268;
    pub const MD_ENTRY_TYPE: u32 = 269;
    pub const MD_ENTRY_PX: u32 = 270;
    pub const MD_ENTRY_SIZE: u32 = 271;
    pub const MD_UPDATE_ACTION: u32 = 279;
    pub const MD_REQ_REJ_REASON: u32 = 281;
    pub const SECURITY_REQ_ID: u32 = 320;
    pub const SECURITY_REQUEST_TYPE: u32 = 321;
    pub const SECURITY_RESPONSE_ID: u32 = 322;
    pub const SECURITY_RESPONSE_TYPE: u32 = 323;
    pub const SESSION_REJECT_REASON: u32 = 373;
    pub const REF_MSG_TYPE: u32 = 372;
    pub const BUSINESS_REJECT_REF_ID: u32 = 379;
    pub const BUSINESS_REJECT_REASON: u32 = 380;
    pub const CXL_REJ_RESPONSE_TO: u32 = 434;
    pub const NO_PARTY_IDS: u32 = 453;
    pub const PARTY_ID: u32 = 448;
    pub const PARTY_ID_SOURCE: u32 = 447;
    pub const PARTY_ROLE: u32 = 452;
    pub const MASS_CANCEL_REQUEST_TYPE: u32 = 530;
    pub const SECURITY_LIST_REQUEST_TYPE: u32 = 559;
    pub const SECURITY_REQUEST_RESULT: u32 = 560;
    pub const MASS_STATUS_REQ_ID: u32 = 584;
    pub const MASS_STATUS_REQ_TYPE: u32 = 585;
    pub const ORD_STATUS_REQ_ID: u32 = 790;
    pub const LAST_FRAGMENT: u32 = 893;
    pub const USERNAME: u32 = 553;
    pub const PASSWORD: u32 = 554;
}

/// PartyIDSource: proprietary / custom code.
pub const PARTY_ID_SOURCE_PROPRIETARY: char = 'D';
/// PartyRole: client id.
pub const PARTY_ROLE_CLIENT_ID: u32 = 3;
/// PartyRole: order origination trader.
pub const PARTY_ROLE_ORDER_ORIGINATION_TRADER: u32 = 13;

/// BusinessRejectReason values.
pub const BUSINESS_REJECT_REASON_OTHER: u32 = 0;
pub const BUSINESS_REJECT_REASON_UNKNOWN_SECURITY: u32 = 2;
pub const BUSINESS_REJECT_REASON_UNSUPPORTED_MSG_TYPE: u32 = 3;
pub const BUSINESS_REJECT_REASON_APPLICATION_NOT_AVAILABLE: u32 = 4;

/// SessionRejectReason values.
pub const SESSION_REJECT_REASON_REQUIRED_TAG_MISSING: u32 = 1;
pub const SESSION_REJECT_REASON_COMP_ID_PROBLEM: u32 = 9;
pub const SESSION_REJECT_REASON_INVALID_MSG_TYPE: u32 = 11;
