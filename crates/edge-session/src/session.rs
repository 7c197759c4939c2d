//! Request-scoped session handle.

use std::sync::{Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{CookieSessionStorage, SessionError};

/// Prefix that marks a value as read-once.
const FLASH_PREFIX: &str = "__flash_";
const FLASH_SUFFIX: &str = "__";

fn flash_key(key: &str) -> String {
    format!("{}{}{}", FLASH_PREFIX, key, FLASH_SUFFIX)
}

#[derive(Debug, Default)]
struct SessionState {
    data: Map<String, Value>,
    pending: bool,
}

/// Session for the current request.
///
/// Shared by reference with the application; mutation goes through an
/// internal lock so handlers only need `&AppSession`.
#[derive(Debug)]
pub struct AppSession {
    state: Mutex<SessionState>,
    storage: CookieSessionStorage,
}

impl AppSession {
    pub(crate) fn from_parts(data: Map<String, Value>, storage: CookieSessionStorage) -> Self {
        Self {
            state: Mutex::new(SessionState {
                data,
                pending: false,
            }),
            storage,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the session was modified since it was opened or last committed.
    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    /// Get a value. Flash values are removed on read, which marks the
    /// session pending.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.state();
        if let Some(value) = state.data.remove(&flash_key(key)) {
            state.pending = true;
            return Some(value);
        }
        state.data.get(key).cloned()
    }

    /// Get a value and deserialize it.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        self.get(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(SessionError::from)
    }

    /// Check for a value or a flash value under `key`.
    pub fn has(&self, key: &str) -> bool {
        let state = self.state();
        state.data.contains_key(key) || state.data.contains_key(&flash_key(key))
    }

    /// Store a value.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.state();
        state.data.insert(key.to_string(), value);
        state.pending = true;
        Ok(())
    }

    /// Store a value that is removed the next time it is read.
    pub fn flash<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.state();
        state.data.insert(flash_key(key), value);
        state.pending = true;
        Ok(())
    }

    /// Remove a value.
    pub fn unset(&self, key: &str) {
        let mut state = self.state();
        state.data.remove(key);
        state.data.remove(&flash_key(key));
        state.pending = true;
    }

    /// Serialize the session into a `Set-Cookie` value and clear the
    /// pending flag.
    pub fn commit(&self) -> Result<String, SessionError> {
        let mut state = self.state();
        let cookie = self.storage.commit_session(&state.data)?;
        state.pending = false;
        Ok(cookie)
    }

    /// Clear all data and return a `Set-Cookie` value that expires the
    /// cookie.
    pub fn destroy(&self) -> String {
        let mut state = self.state();
        state.data.clear();
        state.pending = false;
        self.storage.destroy_session()
    }
}
