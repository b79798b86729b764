use std::sync::Mutex;

use crate::error::AuthError;

const SERVICE: &str = "meditrack";
const TOKEN_KEY: &str = "api_token";

/// Client-side storage for the API token issued at sign-in.
pub trait TokenStore: Send + Sync {
    fn get_token(&self) -> Result<Option<String>, AuthError>;
    fn save_token(&self, token: &str) -> Result<(), AuthError>;
    fn remove_token(&self) -> Result<(), AuthError>;
}

/// Token store backed by the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
    key: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE.to_string(),
            key: TOKEN_KEY.to_string(),
        }
    }

    /// Separate keyring slot, e.g. for the dev environment.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: TOKEN_KEY.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, AuthError> {
        Ok(keyring::Entry::new(&self.service, &self.key)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get_token(&self) -> Result<Option<String>, AuthError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                tracing::error!(service = %self.service, error = %e, "failed to read API token from keyring");
                Err(e.into())
            }
        }
    }

    fn save_token(&self, token: &str) -> Result<(), AuthError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn remove_token(&self) -> Result<(), AuthError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
    fail: bool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            fail: false,
        }
    }

    /// A store whose every read fails.
    pub fn failing() -> Self {
        Self {
            token: Mutex::new(None),
            fail: true,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Result<Option<String>, AuthError> {
        if self.fail {
            return Err(AuthError::Keyring("token store unavailable".into()));
        }
        let guard = self
            .token
            .lock()
            .map_err(|_| AuthError::Keyring("token store poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_token(&self, token: &str) -> Result<(), AuthError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| AuthError::Keyring("token store poisoned".into()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn remove_token(&self) -> Result<(), AuthError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| AuthError::Keyring("token store poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get_token().unwrap(), None);
        store.save_token("abc").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("abc"));
        store.remove_token().unwrap();
        assert_eq!(store.get_token().unwrap(), None);
    }

    #[test]
    fn failing_store_errors_on_read() {
        assert!(matches!(
            MemoryTokenStore::failing().get_token(),
            Err(AuthError::Keyring(_))
        ));
    }
}
