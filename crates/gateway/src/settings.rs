// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Command-line configuration for the gateway.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "fixgate", about = "FIX 4.4 proxy gateway")]
pub struct Settings {
    /// Path to the TOML config file (symbols + users).
    #[arg(long, env = "FIXGATE_CONFIG_FILE")]
    pub config_file: std::path::PathBuf,

    /// Host to bind both downstream listeners on.
    #[arg(long, default_value = "127.0.0.1", env = "FIXGATE_HOST")]
    pub host: String,

    /// Downstream FIX/TCP listen port.
    #[arg(long, default_value_t = 9700, env = "FIXGATE_FIX_PORT")]
    pub fix_port: u16,

    /// Downstream HTTP/WebSocket listen port.
    #[arg(long, default_value_t = 9701, env = "FIXGATE_JSON_PORT")]
    pub json_port: u16,

    /// Comp id the gateway uses on client-facing FIX sessions.
    #[arg(long, default_value = "proxy", env = "FIXGATE_CLIENT_COMP_ID")]
    pub client_comp_id: String,

    /// SenderCompID for venue sessions.
    #[arg(long, env = "FIXGATE_FIX_SENDER_COMP_ID")]
    pub fix_sender_comp_id: String,

    /// TargetCompID for venue sessions.
    #[arg(long, env = "FIXGATE_FIX_TARGET_COMP_ID")]
    pub fix_target_comp_id: String,

    /// Username for venue logons.
    #[arg(long, env = "FIXGATE_FIX_USERNAME")]
    pub fix_username: String,

    /// Password for venue logons.
    #[arg(long, default_value = "", env = "FIXGATE_FIX_PASSWORD")]
    pub fix_password: String,

    /// Heartbeat interval in seconds, both sides.
    #[arg(long, default_value_t = 30, env = "FIXGATE_FIX_PING_FREQ_SECS")]
    pub fix_ping_freq_secs: u64,

    /// How long a client session may sit in WAITING_LOGON before it is reaped.
    #[arg(long, default_value_t = 10, env = "FIXGATE_LOGON_TIMEOUT_SECS")]
    pub logon_timeout_secs: u64,

    /// Per-session decode buffer bound in bytes.
    #[arg(long, default_value_t = 1_048_576, env = "FIXGATE_FIX_DECODE_BUFFER_SIZE")]
    pub fix_decode_buffer_size: usize,

    /// Per-session encode buffer bound in bytes.
    #[arg(long, default_value_t = 65_536, env = "FIXGATE_FIX_ENCODE_BUFFER_SIZE")]
    pub fix_encode_buffer_size: usize,

    /// Validate client passwords as base64(HMAC-SHA256(secret, raw_data)).
    #[arg(long, env = "FIXGATE_HMAC_SHA256")]
    pub hmac_sha256: bool,

    /// Upstream venue connections, `component=tcp://host:port`.
    #[arg(required = true)]
    pub connections: Vec<String>,
}

impl Settings {
    pub fn ping_freq(&self) -> Duration {
        Duration::from_secs(self.fix_ping_freq_secs)
    }

    pub fn logon_timeout(&self) -> Duration {
        Duration::from_secs(self.logon_timeout_secs)
    }

    pub fn crypto_method(&self) -> crate::crypto::Method {
        if self.hmac_sha256 {
            crate::crypto::Method::HmacSha256
        } else {
            crate::crypto::Method::Simple
        }
    }
}

/// A parsed `component=tcp://host:port` connection argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub component: String,
    pub address: String,
}

impl Connection {
    pub fn parse(arg: &str) -> anyhow::Result<Self> {
        let (component, uri) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("connection {arg:?}: expected component=tcp://host:port"))?;
        let address = uri
            .strip_prefix("tcp://")
            .ok_or_else(|| anyhow::anyhow!("connection {arg:?}: only tcp:// is supported"))?;
        if component.is_empty() || address.is_empty() {
            anyhow::bail!("connection {arg:?}: empty component or address");
        }
        Ok(Self { component: component.to_owned(), address: address.to_owned() })
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
