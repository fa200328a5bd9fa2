// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared gateway state: symbol allow-list, credential store, username ↔
//! session bindings, deferred reap queue, id allocators.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;

use crate::config::{Config, User};
use crate::crypto::{Crypto, Method};
use crate::error::Error;

pub struct Shared {
    crypto: Crypto,
    /// Compiled allow-list patterns. Read-only after construction.
    symbols: Vec<Regex>,
    next_session_id: AtomicU64,
    next_request_id: AtomicU64,
    /// Cleared on shutdown; logons are refused once unset.
    accepting: AtomicBool,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    username_to_session: HashMap<String, u64>,
    session_to_username: HashMap<u64, String>,
    sessions_to_remove: HashSet<u64>,
    ready_components: HashSet<String>,
    /// Venue-confirmed symbols (union over server sessions), backs `GET /symbols`.
    known_symbols: BTreeSet<String>,
}

impl Shared {
    pub fn new(method: Method, config: &Config) -> anyhow::Result<Self> {
        let mut symbols = Vec::with_capacity(config.symbols.len());
        for pattern in &config.symbols {
            let regex = Regex::new(pattern)
                .map_err(|e| anyhow::anyhow!("symbol pattern {pattern:?}: {e}"))?;
            symbols.push(regex);
        }
        let users = config.users.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Ok(Self {
            crypto: Crypto::new(method),
            symbols,
            next_session_id: AtomicU64::new(0),
            next_request_id: AtomicU64::new(0),
            accepting: AtomicBool::new(true),
            inner: Mutex::new(Inner { users, ..Inner::default() }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `symbol` matches any allow-list pattern.
    pub fn include(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|pattern| pattern.is_match(symbol))
    }

    // -- users ---------------------------------------------------------------

    /// Register credentials. Idempotent on identical records; a conflicting
    /// re-registration fails.
    pub fn add_user(&self, username: &str, user: User) -> Result<(), Error> {
        let mut inner = self.lock();
        match inner.users.get(username) {
            Some(existing) if *existing == user => Ok(()),
            Some(_) => Err(Error::AlreadyExists),
            None => {
                inner.users.insert(username.to_owned(), user);
                Ok(())
            }
        }
    }

    /// Remove credentials and any live binding for `username`.
    pub fn remove_user(&self, username: &str) {
        let mut inner = self.lock();
        inner.users.remove(username);
        if let Some(session_id) = inner.username_to_session.remove(username) {
            inner.session_to_username.remove(&session_id);
        }
    }

    pub fn user(&self, username: &str) -> Option<User> {
        self.lock().users.get(username).cloned()
    }

    // -- session bindings ----------------------------------------------------

    /// Validate credentials and bind `username ↔ session_id`.
    ///
    /// Returns the user's strategy id on success.
    pub fn session_logon(
        &self,
        session_id: u64,
        username: &str,
        password: &str,
        raw_data: &str,
    ) -> Result<u32, Error> {
        if !self.accepting.load(Ordering::Relaxed) {
            return Err(Error::NotReady);
        }
        let mut inner = self.lock();
        let strategy_id = match inner.users.get(username) {
            Some(user) if self.crypto.validate(password, &user.password, raw_data) => {
                user.strategy_id
            }
            _ => return Err(Error::InvalidPassword),
        };
        if inner.username_to_session.contains_key(username) {
            return Err(Error::AlreadyLoggedOn);
        }
        inner.username_to_session.insert(username.to_owned(), session_id);
        inner.session_to_username.insert(session_id, username.to_owned());
        Ok(strategy_id)
    }

    /// Drop the binding for `session_id`.
    pub fn session_logout(&self, session_id: u64) -> Result<(), Error> {
        let mut inner = self.lock();
        let username = inner.session_to_username.remove(&session_id).ok_or(Error::NotLoggedOn)?;
        inner.username_to_session.remove(&username);
        Ok(())
    }

    /// Queue `session_id` for reaping. Safe to call from any dispatch path;
    /// the actual removal happens in [`Shared::session_cleanup`].
    pub fn session_remove(&self, session_id: u64) {
        self.lock().sessions_to_remove.insert(session_id);
    }

    /// Drain the reap queue, dropping any lingering binding and invoking
    /// `callback` for each reaped session id.
    pub fn session_cleanup(&self, mut callback: impl FnMut(u64)) {
        let drained: Vec<u64> = {
            let mut inner = self.lock();
            let drained: Vec<u64> = inner.sessions_to_remove.drain().collect();
            for session_id in &drained {
                if let Some(username) = inner.session_to_username.remove(session_id) {
                    inner.username_to_session.remove(&username);
                }
            }
            drained
        };
        for session_id in drained {
            callback(session_id);
        }
    }

    /// Session currently bound to `username`, if any.
    pub fn session_find(&self, username: &str) -> Option<u64> {
        self.lock().username_to_session.get(username).copied()
    }

    /// Username bound to `session_id`, if any.
    pub fn session_username(&self, session_id: u64) -> Option<String> {
        self.lock().session_to_username.get(&session_id).cloned()
    }

    // -- id allocation -------------------------------------------------------

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Monotonic numeric request id, unique for the process lifetime.
    pub fn create_request_id(&self) -> String {
        (self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    // -- component readiness -------------------------------------------------

    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::Relaxed);
    }

    pub fn set_component_ready(&self, component: &str, ready: bool) {
        let mut inner = self.lock();
        if ready {
            inner.ready_components.insert(component.to_owned());
        } else {
            inner.ready_components.remove(component);
        }
    }

    pub fn component_ready(&self, component: &str) -> bool {
        self.lock().ready_components.contains(component)
    }

    // -- venue-confirmed symbols ---------------------------------------------

    pub fn add_known_symbol(&self, symbol: &str) {
        self.lock().known_symbols.insert(symbol.to_owned());
    }

    /// Sorted snapshot of venue-confirmed symbols.
    pub fn known_symbols(&self) -> Vec<String> {
        self.lock().known_symbols.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
