//! API key validation and persistence.
//!
//! The key is the only state that outlives a session. It lives in the OS
//! keyring by default and is never written to logs.

use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use thiserror::Error;
use tracing::{debug, warn};

pub const KEYRING_SERVICE: &str = "room-designer";
const KEYRING_USER: &str = "generation-api-key";
const API_KEY_PREFIX: &str = "AI";

/// A key that failed the superficial check done before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no API key configured")]
    Missing,
    #[error("API key should start with \"AI\"")]
    InvalidFormat,
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential storage failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Checks that a key is present and looks like a generation API key.
pub fn validate_api_key(key: Option<&str>) -> Result<&str, CredentialError> {
    let key = key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(CredentialError::Missing)?;
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(CredentialError::InvalidFormat);
    }
    Ok(key)
}

/// Durable storage for the API key.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, CredentialStoreError>;
    fn save(&self, key: &str) -> Result<(), CredentialStoreError>;
    fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// Stores the key in the platform credential manager.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialStoreError> {
        Ok(Entry::new(&self.service, KEYRING_USER)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialStoreError> {
        match self.entry()?.get_password() {
            Ok(key) => {
                debug!(service = %self.service, "loaded stored API key");
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.entry()?.set_password(key)?;
        debug!(service = %self.service, "stored API key");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, "cleared stored API key");
                Ok(())
            }
            Err(err) => {
                warn!(service = %self.service, "failed to clear stored API key: {err}");
                Err(err.into())
            }
        }
    }
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    key: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: Mutex::new(key),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialStoreError> {
        Ok(self
            .key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, key: &str) -> Result<(), CredentialStoreError> {
        *self.key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.key.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CredentialError, CredentialStore, MemoryCredentialStore, validate_api_key,
    };

    #[test]
    fn accepts_trimmed_keys_with_expected_prefix() {
        assert_eq!(validate_api_key(Some("  AIzaSyExample  ")), Ok("AIzaSyExample"));
    }

    #[test]
    fn rejects_missing_and_malformed_keys() {
        assert_eq!(validate_api_key(None), Err(CredentialError::Missing));
        assert_eq!(validate_api_key(Some("   ")), Err(CredentialError::Missing));
        assert_eq!(
            validate_api_key(Some("sk-not-a-gemini-key")),
            Err(CredentialError::InvalidFormat)
        );
    }

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemoryCredentialStore::default();
        assert_eq!(store.load().expect("load should succeed"), None);

        store.save("AIzaSyExample").expect("save should succeed");
        assert_eq!(
            store.load().expect("load should succeed").as_deref(),
            Some("AIzaSyExample")
        );

        store.clear().expect("clear should succeed");
        assert_eq!(store.load().expect("load should succeed"), None);
    }
}
