//! In-memory token store.
//!
//! Stands in for the device key-value store. Suitable for tests and for
//! platforms without a keychain binding.

use crate::error::{BookingError, Result};
use crate::providers::TokenStore;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
    guest_email: Option<String>,
    user_id: Option<String>,
}

/// In-memory credential store.
///
/// Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    credentials: Arc<Mutex<Credentials>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Credentials>> {
        self.credentials
            .lock()
            .map_err(|_| BookingError::Storage("credential store lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.lock()?.access_token.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.lock()?.refresh_token.clone())
    }

    async fn guest_email(&self) -> Result<Option<String>> {
        Ok(self.lock()?.guest_email.clone())
    }

    async fn user_id(&self) -> Result<Option<String>> {
        Ok(self.lock()?.user_id.clone())
    }

    async fn store_login(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
    ) -> Result<()> {
        let mut credentials = self.lock()?;
        credentials.access_token = Some(access_token.to_string());
        credentials.refresh_token = Some(refresh_token.to_string());
        credentials.user_id = Some(user_id.to_string());
        Ok(())
    }

    async fn store_access_token(&self, access_token: &str) -> Result<()> {
        self.lock()?.access_token = Some(access_token.to_string());
        Ok(())
    }

    async fn store_guest_email(&self, email: &str) -> Result<()> {
        self.lock()?.guest_email = Some(email.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        // Single lock acquisition keeps the wipe atomic.
        let mut credentials = self.lock()?;
        *credentials = Credentials::default();
        Ok(())
    }
}
