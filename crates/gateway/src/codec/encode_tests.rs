// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bytes::BytesMut;
use chrono::DateTime;

use super::*;
use crate::codec::message::*;

fn fixed_time() -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    DateTime::from_timestamp(1_700_000_000, 123_000_000).ok_or_else(|| anyhow::anyhow!("bad ts"))
}

fn envelope(seq: u64) -> anyhow::Result<Envelope<'static>> {
    Ok(Envelope {
        sender_comp_id: "proxy",
        target_comp_id: "venue",
        msg_seq_num: seq,
        sending_time: fixed_time()?,
    })
}

fn encode_one(message: &FixMessage) -> anyhow::Result<Vec<u8>> {
    let mut out = BytesMut::new();
    encode(message, &envelope(1)?, &mut out, 65_536)?;
    Ok(out.to_vec())
}

// ── framing ───────────────────────────────────────────────────────────

#[test]
fn frame_has_begin_string_and_trailer() -> anyhow::Result<()> {
    let bytes = encode_one(&FixMessage::Heartbeat(Heartbeat::default()))?;
    assert!(bytes.starts_with(b"8=FIX.4.4\x019="));
    assert_eq!(bytes[bytes.len() - 1], 0x01);
    assert_eq!(&bytes[bytes.len() - 7..bytes.len() - 4], b"10=");
    Ok(())
}

#[test]
fn body_length_counts_bytes_between_length_and_checksum() -> anyhow::Result<()> {
    let bytes = encode_one(&FixMessage::TestRequest(TestRequest { test_req_id: "42".into() }))?;
    let text = std::str::from_utf8(&bytes)?;

    let after_len = text
        .splitn(3, '\x01')
        .nth(1)
        .and_then(|f| f.strip_prefix("9="))
        .ok_or_else(|| anyhow::anyhow!("no body length"))?;
    let body_len: usize = after_len.parse()?;

    let body_start = "8=FIX.4.4\x01".len() + 2 + after_len.len() + 1;
    let trailer_start = bytes.len() - 7;
    assert_eq!(body_len, trailer_start - body_start);
    Ok(())
}

#[test]
fn checksum_is_sum_of_preceding_bytes_mod_256() -> anyhow::Result<()> {
    let bytes = encode_one(&FixMessage::Logout(Logout { text: Some("bye".into()) }))?;
    let declared: u32 = std::str::from_utf8(&bytes[bytes.len() - 4..bytes.len() - 1])?.parse()?;
    let computed = bytes[..bytes.len() - 7].iter().map(|b| u32::from(*b)).sum::<u32>() % 256;
    assert_eq!(declared, computed);
    Ok(())
}

#[test]
fn header_fields_in_order() -> anyhow::Result<()> {
    let bytes = encode_one(&FixMessage::Heartbeat(Heartbeat::default()))?;
    let text = std::str::from_utf8(&bytes)?;
    let fields: Vec<&str> = text.split('\x01').collect();
    assert_eq!(fields[2], "35=0");
    assert_eq!(fields[3], "49=proxy");
    assert_eq!(fields[4], "56=venue");
    assert_eq!(fields[5], "34=1");
    assert!(fields[6].starts_with("52=20231114-"));
    Ok(())
}

// ── message bodies ────────────────────────────────────────────────────

#[test]
fn logon_carries_credentials_and_reset_flag() -> anyhow::Result<()> {
    let logon = FixMessage::Logon(Logon {
        encrypt_method: 0,
        heart_bt_int: 30,
        reset_seq_num_flag: true,
        username: "alice".into(),
        password: Some("s3cret".into()),
        raw_data: Some("1234567890".into()),
    });
    let text = String::from_utf8(encode_one(&logon)?)?;
    assert!(text.contains("\x0198=0\x01"));
    assert!(text.contains("\x01108=30\x01"));
    assert!(text.contains("\x01141=Y\x01"));
    assert!(text.contains("\x01553=alice\x01"));
    assert!(text.contains("\x01554=s3cret\x01"));
    assert!(text.contains("\x0195=10\x0196=1234567890\x01"));
    Ok(())
}

#[test]
fn new_order_single_writes_party_group() -> anyhow::Result<()> {
    let order = FixMessage::NewOrderSingle(NewOrderSingle {
        cl_ord_id: "x1".into(),
        symbol: "BTC-USD".into(),
        security_exchange: None,
        side: '1',
        ord_type: '2',
        price: Some("42000.5".into()),
        order_qty: Some("2".into()),
        time_in_force: None,
        parties: vec![
            Party { party_id: "alice".into(), party_id_source: 'D', party_role: 3 },
            Party { party_id: "42".into(), party_id_source: 'D', party_role: 13 },
        ],
    });
    let text = String::from_utf8(encode_one(&order)?)?;
    assert!(text.contains(
        "\x01453=2\x01448=alice\x01447=D\x01452=3\x01448=42\x01447=D\x01452=13\x01"
    ));
    assert!(text.contains("\x0155=BTC-USD\x01"));
    assert!(text.contains("\x0144=42000.5\x01"));
    Ok(())
}

#[test]
fn empty_party_group_is_omitted() -> anyhow::Result<()> {
    let order = FixMessage::OrderMassStatusRequest(OrderMassStatusRequest {
        mass_status_req_id: "m1".into(),
        mass_status_req_type: 7,
        parties: vec![],
    });
    let text = String::from_utf8(encode_one(&order)?)?;
    assert!(!text.contains("453="));
    Ok(())
}

// ── limits ────────────────────────────────────────────────────────────

#[test]
fn encode_fails_when_buffer_limit_exceeded() -> anyhow::Result<()> {
    let mut out = BytesMut::new();
    let msg = FixMessage::Logout(Logout { text: Some("x".repeat(256)) });
    let result = encode(&msg, &envelope(1)?, &mut out, 64);
    assert!(matches!(result, Err(EncodeError::BufferFull { .. })));
    // Nothing partial is written on failure.
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn unsupported_msg_type_does_not_encode() -> anyhow::Result<()> {
    let mut out = BytesMut::new();
    let msg = FixMessage::Unsupported { msg_type: MsgType::RequestForPositions };
    let result = encode(&msg, &envelope(1)?, &mut out, 65_536);
    assert!(matches!(result, Err(EncodeError::Unsupported(MsgType::RequestForPositions))));
    Ok(())
}
