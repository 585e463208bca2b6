//! Access token persistence in the OS keychain, keyed per profile.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;
use lily_core::util::normalize_text_option;
use lily_core::AuthTokens;

use crate::error::CliError;

pub const ACCESS_TOKEN_ENV: &str = "LILY_ACCESS_TOKEN";

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "lily-cli";

#[derive(Clone)]
struct TokenStore {
    username: String,
}

impl TokenStore {
    fn new(profile_name: &str) -> Self {
        Self {
            username: format!("auth_tokens:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry, CliError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(not(test))]
    fn load(&self) -> Result<Option<AuthTokens>, CliError> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load(&self) -> Result<Option<AuthTokens>, CliError> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(CliError::from)
    }

    #[cfg(not(test))]
    fn save(&self, tokens: &AuthTokens) -> Result<(), CliError> {
        let raw = serde_json::to_string(tokens)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| CliError::Auth(error.to_string()))
    }

    #[cfg(test)]
    fn save(&self, tokens: &AuthTokens) -> Result<(), CliError> {
        let raw = serde_json::to_string(tokens)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear(&self) -> Result<(), CliError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CliError::Auth(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear(&self) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Auth(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

pub fn load_stored_tokens(profile_name: &str) -> Result<Option<AuthTokens>, CliError> {
    TokenStore::new(profile_name).load()
}

pub fn store_tokens(profile_name: &str, tokens: &AuthTokens) -> Result<(), CliError> {
    TokenStore::new(profile_name).save(tokens)
}

pub fn clear_stored_tokens(profile_name: &str) -> Result<(), CliError> {
    TokenStore::new(profile_name).clear()
}

/// `LILY_ACCESS_TOKEN` when set, otherwise the profile's stored tokens
pub fn resolve_tokens(profile_name: &str) -> Result<Option<AuthTokens>, CliError> {
    if let Some(token) = normalize_text_option(std::env::var(ACCESS_TOKEN_ENV).ok()) {
        return AuthTokens::from_access_token(token)
            .map(Some)
            .map_err(CliError::from);
    }
    load_stored_tokens(profile_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_roundtrip_per_profile() {
        let tokens = AuthTokens::from_access_token("secret").unwrap();
        store_tokens("auth-test-a", &tokens).unwrap();

        assert_eq!(load_stored_tokens("auth-test-a").unwrap(), Some(tokens));
        assert_eq!(load_stored_tokens("auth-test-b").unwrap(), None);

        clear_stored_tokens("auth-test-a").unwrap();
        assert_eq!(load_stored_tokens("auth-test-a").unwrap(), None);
    }

    #[test]
    fn clearing_missing_tokens_is_ok() {
        assert!(clear_stored_tokens("auth-test-never-stored").is_ok());
    }
}
