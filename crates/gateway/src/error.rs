// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error catalog shared by the FIX and JSON-RPC client surfaces.
///
/// Business failures surface to the end user as a FIX `Logout`/
/// `BusinessMessageReject` text or a JSON-RPC error object carrying the
/// catalog string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    NotReady,
    NotLoggedOn,
    AlreadyLoggedOn,
    InvalidPassword,
    AlreadyExists,
    UnknownSymbol,
    UnsupportedMsgType,
}

impl Error {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReady => "NOT_READY",
            Self::NotLoggedOn => "NOT_LOGGED_ON",
            Self::AlreadyLoggedOn => "ALREADY_LOGGED_ON",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::UnknownSymbol => "UNKNOWN_SYMBOL",
            Self::UnsupportedMsgType => "UNSUPPORTED_MSG_TYPE",
        }
    }

    /// Stable JSON-RPC error code for this catalog entry.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            Self::NotReady => -32000,
            Self::NotLoggedOn => -32001,
            Self::AlreadyLoggedOn => -32002,
            Self::InvalidPassword => -32003,
            Self::AlreadyExists => -32004,
            Self::UnknownSymbol => -32005,
            Self::UnsupportedMsgType => -32006,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for Error {}
