// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental FIX frame decoder.

use std::fmt;

use super::message::*;
use super::tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    BadFrame(&'static str),
    BadChecksum { expected: u32, actual: u32 },
    MissingTag(u32),
    BadValue(u32),
    UnknownMsgType(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadFrame(reason) => write!(f, "bad frame: {reason}"),
            Self::BadChecksum { expected, actual } => {
                write!(f, "bad checksum: expected {expected:03}, got {actual:03}")
            }
            Self::MissingTag(tag) => write!(f, "missing tag {tag}"),
            Self::BadValue(tag) => write!(f, "bad value for tag {tag}"),
            Self::UnknownMsgType(value) => write!(f, "unknown msg type {value:?}"),
        }
    }
}

impl std::error::Error for DecodeError {}

const SOH: u8 = 0x01;
const PREFIX: &[u8] = b"8=FIX.4.4\x01";
// "10=" + three digits + SOH
const TRAILER_LEN: usize = 7;

/// Scan for one complete frame at the start of `buf`.
///
/// Returns `Ok(Some(len))` when a full frame of `len` bytes is available,
/// `Ok(None)` when more bytes are needed, and an error when the buffer does
/// not start with a well-formed FIX frame.
pub fn next_frame(buf: &[u8]) -> Result<Option<usize>, DecodeError> {
    if buf.len() < PREFIX.len() {
        if buf != &PREFIX[..buf.len()] {
            return Err(DecodeError::BadFrame("begin string mismatch"));
        }
        return Ok(None);
    }
    if !buf.starts_with(PREFIX) {
        return Err(DecodeError::BadFrame("begin string mismatch"));
    }

    let rest = &buf[PREFIX.len()..];
    if rest.len() < 2 {
        return Ok(None);
    }
    if !rest.starts_with(b"9=") {
        return Err(DecodeError::BadFrame("body length missing"));
    }

    let mut body_len: usize = 0;
    let mut digits = 0usize;
    for &byte in &rest[2..] {
        match byte {
            b'0'..=b'9' => {
                digits += 1;
                if digits > 8 {
                    return Err(DecodeError::BadFrame("body length too long"));
                }
                body_len = body_len * 10 + usize::from(byte - b'0');
            }
            SOH => {
                if digits == 0 {
                    return Err(DecodeError::BadFrame("empty body length"));
                }
                let body_start = PREFIX.len() + 2 + digits + 1;
                let total = body_start + body_len + TRAILER_LEN;
                if buf.len() < total {
                    return Ok(None);
                }
                return Ok(Some(total));
            }
            _ => return Err(DecodeError::BadFrame("body length not numeric")),
        }
    }
    Ok(None)
}

/// Decode one complete frame (as returned by [`next_frame`]).
pub fn decode(frame: &[u8]) -> Result<(Header, FixMessage), DecodeError> {
    let text = std::str::from_utf8(frame).map_err(|_| DecodeError::BadFrame("not ascii"))?;
    if frame.len() < PREFIX.len() + TRAILER_LEN {
        return Err(DecodeError::BadFrame("truncated"));
    }

    let (payload, trailer) = frame.split_at(frame.len() - TRAILER_LEN);
    if !trailer.starts_with(b"10=") || trailer[6] != SOH {
        return Err(DecodeError::BadFrame("trailer missing"));
    }
    let expected = std::str::from_utf8(&trailer[3..6])
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or(DecodeError::BadFrame("checksum not numeric"))?;
    let actual = payload.iter().map(|b| u32::from(*b)).sum::<u32>() % 256;
    if expected != actual {
        return Err(DecodeError::BadChecksum { expected, actual });
    }

    let mut items = Vec::new();
    for field in text[..text.len() - TRAILER_LEN].split(char::from(SOH)) {
        if field.is_empty() {
            continue;
        }
        let (tag, value) = field.split_once('=').ok_or(DecodeError::BadFrame("field without ="))?;
        let tag: u32 = tag.parse().map_err(|_| DecodeError::BadFrame("tag not numeric"))?;
        items.push((tag, value));
    }
    let fields = Fields { items };

    let msg_type_raw = fields.req(tag::MSG_TYPE)?;
    let msg_type = MsgType::from_wire(msg_type_raw)
        .ok_or_else(|| DecodeError::UnknownMsgType(msg_type_raw.to_owned()))?;

    let header = Header {
        msg_type,
        sender_comp_id: fields.req(tag::SENDER_COMP_ID)?.to_owned(),
        target_comp_id: fields.req(tag::TARGET_COMP_ID)?.to_owned(),
        msg_seq_num: fields.req_u64(tag::MSG_SEQ_NUM)?,
        sending_time: fields.get(tag::SENDING_TIME).unwrap_or_default().to_owned(),
    };

    let message = decode_body(msg_type, &fields)?;
    Ok((header, message))
}

fn decode_body(msg_type: MsgType, fields: &Fields<'_>) -> Result<FixMessage, DecodeError> {
    let message = match msg_type {
        MsgType::Logon => FixMessage::Logon(Logon {
            encrypt_method: fields.get_u32(tag::ENCRYPT_METHOD)?.unwrap_or(0),
            heart_bt_int: fields.req_u64(tag::HEART_BT_INT)?,
            reset_seq_num_flag: fields.flag(tag::RESET_SEQ_NUM_FLAG, false),
            username: fields.get(tag::USERNAME).unwrap_or_default().to_owned(),
            password: fields.get_owned(tag::PASSWORD),
            raw_data: fields.get_owned(tag::RAW_DATA),
        }),
        MsgType::Logout => FixMessage::Logout(Logout { text: fields.get_owned(tag::TEXT) }),
        MsgType::Heartbeat => {
            FixMessage::Heartbeat(Heartbeat { test_req_id: fields.get_owned(tag::TEST_REQ_ID) })
        }
        MsgType::TestRequest => FixMessage::TestRequest(TestRequest {
            test_req_id: fields.req(tag::TEST_REQ_ID)?.to_owned(),
        }),
        MsgType::ResendRequest => FixMessage::ResendRequest(ResendRequest {
            begin_seq_no: fields.req_u64(tag::BEGIN_SEQ_NO)?,
            end_seq_no: fields.req_u64(tag::END_SEQ_NO)?,
        }),
        MsgType::Reject => FixMessage::Reject(Reject {
            ref_seq_num: fields.req_u64(tag::REF_SEQ_NUM)?,
            ref_msg_type: fields.get_owned(tag::REF_MSG_TYPE),
            session_reject_reason: fields.get_u32(tag::SESSION_REJECT_REASON)?,
            text: fields.get_owned(tag::TEXT),
        }),
        MsgType::NewOrderSingle => FixMessage::NewOrderSingle(NewOrderSingle {
            cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
            symbol: fields.req(tag::SYMBOL)?.to_owned(),
            security_exchange: fields.get_owned(tag::SECURITY_EXCHANGE),
            side: fields.req_char(tag::SIDE)?,
            ord_type: fields.req_char(tag::ORD_TYPE)?,
            price: fields.get_owned(tag::PRICE),
            order_qty: fields.get_owned(tag::ORDER_QTY),
            time_in_force: fields.get_char(tag::TIME_IN_FORCE)?,
            parties: fields.parties()?,
        }),
        MsgType::OrderCancelRequest => FixMessage::OrderCancelRequest(OrderCancelRequest {
            orig_cl_ord_id: fields.req(tag::ORIG_CL_ORD_ID)?.to_owned(),
            cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
            symbol: fields.req(tag::SYMBOL)?.to_owned(),
            side: fields.req_char(tag::SIDE)?,
            parties: fields.parties()?,
        }),
        MsgType::OrderCancelReplaceRequest => {
            FixMessage::OrderCancelReplaceRequest(OrderCancelReplaceRequest {
                orig_cl_ord_id: fields.req(tag::ORIG_CL_ORD_ID)?.to_owned(),
                cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
                symbol: fields.req(tag::SYMBOL)?.to_owned(),
                side: fields.req_char(tag::SIDE)?,
                ord_type: fields.req_char(tag::ORD_TYPE)?,
                price: fields.get_owned(tag::PRICE),
                order_qty: fields.get_owned(tag::ORDER_QTY),
                parties: fields.parties()?,
            })
        }
        MsgType::OrderStatusRequest => FixMessage::OrderStatusRequest(OrderStatusRequest {
            cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
            ord_status_req_id: fields.get_owned(tag::ORD_STATUS_REQ_ID),
            symbol: fields.req(tag::SYMBOL)?.to_owned(),
            side: fields.req_char(tag::SIDE)?,
            parties: fields.parties()?,
        }),
        MsgType::OrderMassStatusRequest => {
            FixMessage::OrderMassStatusRequest(OrderMassStatusRequest {
                mass_status_req_id: fields.req(tag::MASS_STATUS_REQ_ID)?.to_owned(),
                mass_status_req_type: fields.req_u32(tag::MASS_STATUS_REQ_TYPE)?,
                parties: fields.parties()?,
            })
        }
        MsgType::OrderMassCancelRequest => {
            FixMessage::OrderMassCancelRequest(OrderMassCancelRequest {
                cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
                mass_cancel_request_type: fields.req_char(tag::MASS_CANCEL_REQUEST_TYPE)?,
                symbol: fields.get_owned(tag::SYMBOL),
                parties: fields.parties()?,
            })
        }
        MsgType::ExecutionReport => FixMessage::ExecutionReport(ExecutionReport {
            order_id: fields.req(tag::ORDER_ID)?.to_owned(),
            cl_ord_id: fields.get_owned(tag::CL_ORD_ID),
            orig_cl_ord_id: fields.get_owned(tag::ORIG_CL_ORD_ID),
            exec_id: fields.req(tag::EXEC_ID)?.to_owned(),
            exec_type: fields.req_char(tag::EXEC_TYPE)?,
            ord_status: fields.req_char(tag::ORD_STATUS)?,
            symbol: fields.req(tag::SYMBOL)?.to_owned(),
            side: fields.req_char(tag::SIDE)?,
            order_qty: fields.get_owned(tag::ORDER_QTY),
            price: fields.get_owned(tag::PRICE),
            last_qty: fields.get_owned(tag::LAST_QTY),
            last_px: fields.get_owned(tag::LAST_PX),
            leaves_qty: fields.req(tag::LEAVES_QTY)?.to_owned(),
            cum_qty: fields.req(tag::CUM_QTY)?.to_owned(),
            avg_px: fields.get_owned(tag::AVG_PX),
            text: fields.get_owned(tag::TEXT),
            parties: fields.parties()?,
        }),
        MsgType::OrderCancelReject => FixMessage::OrderCancelReject(OrderCancelReject {
            order_id: fields.req(tag::ORDER_ID)?.to_owned(),
            cl_ord_id: fields.req(tag::CL_ORD_ID)?.to_owned(),
            orig_cl_ord_id: fields.req(tag::ORIG_CL_ORD_ID)?.to_owned(),
            ord_status: fields.req_char(tag::ORD_STATUS)?,
            cxl_rej_response_to: fields.req_char(tag::CXL_REJ_RESPONSE_TO)?,
            cxl_rej_reason: fields.get_u32(tag::CXL_REJ_REASON)?,
            text: fields.get_owned(tag::TEXT),
        }),
        MsgType::BusinessMessageReject => {
            FixMessage::BusinessMessageReject(BusinessMessageReject {
                ref_seq_num: fields.req_u64(tag::REF_SEQ_NUM)?,
                ref_msg_type: fields.req(tag::REF_MSG_TYPE)?.to_owned(),
                business_reject_ref_id: fields.get_owned(tag::BUSINESS_REJECT_REF_ID),
                business_reject_reason: fields.req_u32(tag::BUSINESS_REJECT_REASON)?,
                text: fields.get_owned(tag::TEXT),
            })
        }
        MsgType::SecurityListRequest => FixMessage::SecurityListRequest(SecurityListRequest {
            security_req_id: fields.req(tag::SECURITY_REQ_ID)?.to_owned(),
            security_list_request_type: fields.req_u32(tag::SECURITY_LIST_REQUEST_TYPE)?,
        }),
        MsgType::SecurityList => FixMessage::SecurityList(SecurityList {
            security_req_id: fields.req(tag::SECURITY_REQ_ID)?.to_owned(),
            security_response_id: fields.get(tag::SECURITY_RESPONSE_ID).unwrap_or_default().to_owned(),
            security_request_result: fields.get_u32(tag::SECURITY_REQUEST_RESULT)?.unwrap_or(0),
            last_fragment: fields.flag(tag::LAST_FRAGMENT, true),
            securities: fields.securities()?,
        }),
        MsgType::SecurityDefinitionRequest => {
            FixMessage::SecurityDefinitionRequest(SecurityDefinitionRequest {
                security_req_id: fields.req(tag::SECURITY_REQ_ID)?.to_owned(),
                security_request_type: fields.req_u32(tag::SECURITY_REQUEST_TYPE)?,
                symbol: fields.req(tag::SYMBOL)?.to_owned(),
                security_exchange: fields.get(tag::SECURITY_EXCHANGE).unwrap_or_default().to_owned(),
            })
        }
        MsgType::SecurityDefinition => FixMessage::SecurityDefinition(SecurityDefinition {
            security_response_id: fields.get(tag::SECURITY_RESPONSE_ID).unwrap_or_default().to_owned(),
            security_response_type: fields.get_u32(tag::SECURITY_RESPONSE_TYPE)?.unwrap_or(0),
            symbol: fields.req(tag::SYMBOL)?.to_owned(),
            security_exchange: fields.get(tag::SECURITY_EXCHANGE).unwrap_or_default().to_owned(),
        }),
        MsgType::MarketDataRequest => FixMessage::MarketDataRequest(MarketDataRequest {
            md_req_id: fields.req(tag::MD_REQ_ID)?.to_owned(),
            subscription_request_type: fields.req_char(tag::SUBSCRIPTION_REQUEST_TYPE)?,
            market_depth: fields.get_u32(tag::MARKET_DEPTH)?.unwrap_or(0),
            md_entry_types: fields.chars_after(tag::NO_MD_ENTRY_TYPES, tag::MD_ENTRY_TYPE)?,
            symbols: fields.values_after(tag::NO_RELATED_SYM, tag::SYMBOL)?,
            parties: fields.parties()?,
        }),
        MsgType::MarketDataSnapshotFullRefresh => {
            FixMessage::MarketDataSnapshotFullRefresh(MarketDataSnapshotFullRefresh {
                md_req_id: fields.get_owned(tag::MD_REQ_ID),
                symbol: fields.req(tag::SYMBOL)?.to_owned(),
                entries: fields.md_entries()?,
            })
        }
        MsgType::MarketDataIncrementalRefresh => {
            FixMessage::MarketDataIncrementalRefresh(MarketDataIncrementalRefresh {
                md_req_id: fields.get_owned(tag::MD_REQ_ID),
                entries: fields.md_inc_entries()?,
            })
        }
        MsgType::MarketDataRequestReject => {
            FixMessage::MarketDataRequestReject(MarketDataRequestReject {
                md_req_id: fields.req(tag::MD_REQ_ID)?.to_owned(),
                md_req_rej_reason: fields.get_char(tag::MD_REQ_REJ_REASON)?,
                text: fields.get_owned(tag::TEXT),
            })
        }
        MsgType::RequestForPositions | MsgType::TradeCaptureReport => {
            FixMessage::Unsupported { msg_type }
        }
    };
    Ok(message)
}

/// Decoded field list with positional group parsing.
struct Fields<'a> {
    items: Vec<(u32, &'a str)>,
}

impl<'a> Fields<'a> {
    fn get(&self, tag: u32) -> Option<&'a str> {
        self.items.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v)
    }

    fn get_owned(&self, tag: u32) -> Option<String> {
        self.get(tag).map(str::to_owned)
    }

    fn req(&self, tag: u32) -> Result<&'a str, DecodeError> {
        self.get(tag).ok_or(DecodeError::MissingTag(tag))
    }

    fn req_u64(&self, tag: u32) -> Result<u64, DecodeError> {
        self.req(tag)?.parse().map_err(|_| DecodeError::BadValue(tag))
    }

    fn req_u32(&self, tag: u32) -> Result<u32, DecodeError> {
        self.req(tag)?.parse().map_err(|_| DecodeError::BadValue(tag))
    }

    fn get_u32(&self, tag: u32) -> Result<Option<u32>, DecodeError> {
        match self.get(tag) {
            Some(value) => value.parse().map(Some).map_err(|_| DecodeError::BadValue(tag)),
            None => Ok(None),
        }
    }

    fn req_char(&self, tag: u32) -> Result<char, DecodeError> {
        let value = self.req(tag)?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DecodeError::BadValue(tag)),
        }
    }

    fn get_char(&self, tag: u32) -> Result<Option<char>, DecodeError> {
        match self.get(tag) {
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Some(c)),
                    _ => Err(DecodeError::BadValue(tag)),
                }
            }
            None => Ok(None),
        }
    }

    fn flag(&self, tag: u32, default: bool) -> bool {
        match self.get(tag) {
            Some(value) => value == "Y",
            None => default,
        }
    }

    fn position(&self, tag: u32) -> Option<usize> {
        self.items.iter().position(|(t, _)| *t == tag)
    }

    fn count_at(&self, pos: usize) -> Result<usize, DecodeError> {
        let (tag, value) = self.items[pos];
        value.parse().map_err(|_| DecodeError::BadValue(tag))
    }

    /// Collect `count` occurrences of `wanted` following the `count_tag` field.
    fn values_after(&self, count_tag: u32, wanted: u32) -> Result<Vec<String>, DecodeError> {
        let Some(pos) = self.position(count_tag) else {
            return Ok(Vec::new());
        };
        let count = self.count_at(pos)?;
        let mut values = Vec::with_capacity(count.min(self.items.len()));
        for (tag, value) in &self.items[pos + 1..] {
            if values.len() == count {
                break;
            }
            if *tag == wanted {
                values.push((*value).to_owned());
            }
        }
        if values.len() != count {
            return Err(DecodeError::BadValue(count_tag));
        }
        Ok(values)
    }

    fn chars_after(&self, count_tag: u32, wanted: u32) -> Result<Vec<char>, DecodeError> {
        self.values_after(count_tag, wanted)?
            .into_iter()
            .map(|value| {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(DecodeError::BadValue(wanted)),
                }
            })
            .collect()
    }

    /// Party repeating group (453): entries delimited by 448.
    fn parties(&self) -> Result<Vec<Party>, DecodeError> {
        let Some(pos) = self.position(tag::NO_PARTY_IDS) else {
            return Ok(Vec::new());
        };
        let count = self.count_at(pos)?;
        let mut parties: Vec<Party> = Vec::with_capacity(count.min(self.items.len()));
        for (tag_, value) in &self.items[pos + 1..] {
            match *tag_ {
                tag::PARTY_ID => {
                    if parties.len() == count {
                        break;
                    }
                    parties.push(Party {
                        party_id: (*value).to_owned(),
                        party_id_source: super::PARTY_ID_SOURCE_PROPRIETARY,
                        party_role: 0,
                    });
                }
                tag::PARTY_ID_SOURCE => {
                    let party =
                        parties.last_mut().ok_or(DecodeError::BadValue(tag::NO_PARTY_IDS))?;
                    let mut chars = value.chars();
                    party.party_id_source = match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => return Err(DecodeError::BadValue(tag::PARTY_ID_SOURCE)),
                    };
                }
                tag::PARTY_ROLE => {
                    let party =
                        parties.last_mut().ok_or(DecodeError::BadValue(tag::NO_PARTY_IDS))?;
                    party.party_role =
                        value.parse().map_err(|_| DecodeError::BadValue(tag::PARTY_ROLE))?;
                }
                _ => {
                    if parties.len() == count {
                        break;
                    }
                }
            }
        }
        if parties.len() != count {
            return Err(DecodeError::BadValue(tag::NO_PARTY_IDS));
        }
        Ok(parties)
    }

    /// Security list group (146): entries delimited by 55, with 207 attached.
    fn securities(&self) -> Result<Vec<SecurityListEntry>, DecodeError> {
        let Some(pos) = self.position(tag::NO_RELATED_SYM) else {
            return Ok(Vec::new());
        };
        let count = self.count_at(pos)?;
        let mut entries: Vec<SecurityListEntry> = Vec::with_capacity(count.min(self.items.len()));
        for (tag_, value) in &self.items[pos + 1..] {
            match *tag_ {
                tag::SYMBOL => {
                    if entries.len() == count {
                        break;
                    }
                    entries.push(SecurityListEntry {
                        symbol: (*value).to_owned(),
                        security_exchange: String::new(),
                    });
                }
                tag::SECURITY_EXCHANGE => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_RELATED_SYM))?;
                    entry.security_exchange = (*value).to_owned();
                }
                _ => {
                    if entries.len() == count {
                        break;
                    }
                }
            }
        }
        if entries.len() != count {
            return Err(DecodeError::BadValue(tag::NO_RELATED_SYM));
        }
        Ok(entries)
    }

    /// Market data entries (268), snapshot form: delimited by 269.
    fn md_entries(&self) -> Result<Vec<MdEntry>, DecodeError> {
        let Some(pos) = self.position(tag::NO_MD_ENTRIES) else {
            return Ok(Vec::new());
        };
        let count = self.count_at(pos)?;
        let mut entries: Vec<MdEntry> = Vec::with_capacity(count.min(self.items.len()));
        for (tag_, value) in &self.items[pos + 1..] {
            match *tag_ {
                tag::MD_ENTRY_TYPE => {
                    if entries.len() == count {
                        break;
                    }
                    let mut chars = value.chars();
                    let md_entry_type = match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => return Err(DecodeError::BadValue(tag::MD_ENTRY_TYPE)),
                    };
                    entries.push(MdEntry { md_entry_type, md_entry_px: None, md_entry_size: None });
                }
                tag::MD_ENTRY_PX => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.md_entry_px = Some((*value).to_owned());
                }
                tag::MD_ENTRY_SIZE => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.md_entry_size = Some((*value).to_owned());
                }
                _ => {
                    if entries.len() == count {
                        break;
                    }
                }
            }
        }
        if entries.len() != count {
            return Err(DecodeError::BadValue(tag::NO_MD_ENTRIES));
        }
        Ok(entries)
    }

    /// Market data entries (268), incremental form: delimited by 279.
    fn md_inc_entries(&self) -> Result<Vec<MdIncEntry>, DecodeError> {
        let Some(pos) = self.position(tag::NO_MD_ENTRIES) else {
            return Ok(Vec::new());
        };
        let count = self.count_at(pos)?;
        let mut entries: Vec<MdIncEntry> = Vec::with_capacity(count.min(self.items.len()));
        for (tag_, value) in &self.items[pos + 1..] {
            let single_char = |tag: u32, value: &str| -> Result<char, DecodeError> {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(DecodeError::BadValue(tag)),
                }
            };
            match *tag_ {
                tag::MD_UPDATE_ACTION => {
                    if entries.len() == count {
                        break;
                    }
                    entries.push(MdIncEntry {
                        md_update_action: single_char(tag::MD_UPDATE_ACTION, value)?,
                        md_entry_type: ' ',
                        symbol: None,
                        md_entry_px: None,
                        md_entry_size: None,
                    });
                }
                tag::MD_ENTRY_TYPE => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.md_entry_type = single_char(tag::MD_ENTRY_TYPE, value)?;
                }
                tag::SYMBOL => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.symbol = Some((*value).to_owned());
                }
                tag::MD_ENTRY_PX => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.md_entry_px = Some((*value).to_owned());
                }
                tag::MD_ENTRY_SIZE => {
                    let entry =
                        entries.last_mut().ok_or(DecodeError::BadValue(tag::NO_MD_ENTRIES))?;
                    entry.md_entry_size = Some((*value).to_owned());
                }
                _ => {
                    if entries.len() == count {
                        break;
                    }
                }
            }
        }
        if entries.len() != count {
            return Err(DecodeError::BadValue(tag::NO_MD_ENTRIES));
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
