// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration: symbol allow-list patterns and the user table.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A downstream user record.
///
/// `component` names the upstream venue session handling this user's flow;
/// `password` is a plaintext secret or shared HMAC key depending on the
/// crypto mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub component: String,
    pub password: String,
    #[serde(default)]
    pub accounts: String,
    pub strategy_id: u32,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Regex patterns; a symbol is allowed when it matches any of them.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Users keyed by username.
    #[serde(default)]
    pub users: IndexMap<String, User>,
}

impl Config {
    pub fn parse_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse_text(&text)
    }

    pub fn parse_text(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        for (username, user) in &config.users {
            if username.is_empty() {
                anyhow::bail!("config: empty username");
            }
            if user.component.is_empty() {
                anyhow::bail!("config: user {username:?} has no component");
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
