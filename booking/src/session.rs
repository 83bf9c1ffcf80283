//! Session management.
//!
//! [`SessionManager`] owns the credential store and the auth endpoints. It
//! derives the current [`Identity`], exchanges login tokens, and performs
//! single-flight token refresh: concurrent refresh requests coalesce into
//! one network call whose outcome every caller observes.

use crate::error::{BookingError, Result};
use crate::providers::{AuthApi, TokenStore};
use crate::state::{Identity, UserProfile};
use crate::utils::is_valid_email;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug)]
struct RefreshGate {
    last_outcome: Result<()>,
}

/// Manages identity and token lifecycle against the credential store.
///
/// Cheap to clone; clones share the refresh gate, so single-flight holds
/// across all of them.
#[derive(Debug)]
pub struct SessionManager<T, A> {
    store: T,
    api: A,
    gate: Arc<Mutex<RefreshGate>>,
    // Read lock-free on entry so callers arriving mid-refresh still
    // observe the pre-refresh generation and coalesce.
    generation: Arc<AtomicU64>,
}

impl<T: Clone, A: Clone> Clone for SessionManager<T, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            api: self.api.clone(),
            gate: Arc::clone(&self.gate),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T: TokenStore, A: AuthApi> SessionManager<T, A> {
    /// Create a session manager over the given store and auth endpoints.
    pub fn new(store: T, api: A) -> Self {
        Self {
            store,
            api,
            gate: Arc::new(Mutex::new(RefreshGate {
                last_outcome: Ok(()),
            })),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Derive the current identity from persisted credentials.
    ///
    /// Tokens win over a guest email when both are present.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store fails.
    pub async fn current_identity(&self) -> Result<Identity> {
        if self.store.refresh_token().await?.is_some() {
            if let Some(user_id) = self.store.user_id().await? {
                return Ok(Identity::Authenticated { user_id });
            }
        }
        if let Some(email) = self.store.guest_email().await? {
            return Ok(Identity::Guest { email });
        }
        Ok(Identity::Anonymous)
    }

    /// Validate and persist a guest email.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidEmail`] if the email is malformed, or
    /// a storage error if persisting fails.
    pub async fn set_guest_email(&self, email: &str) -> Result<()> {
        if !is_valid_email(email) {
            return Err(BookingError::InvalidEmail {
                email: email.to_string(),
            });
        }
        self.store.store_guest_email(email).await
    }

    /// Exchange a Google id token for service tokens and persist them.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or persisting fails.
    pub async fn login_with_google(&self, id_token: &str) -> Result<UserProfile> {
        let reply = self.api.login(id_token).await?;
        self.store
            .store_login(&reply.access_token, &reply.refresh_token, &reply.user.user_id)
            .await?;
        info!(user_id = %reply.user.user_id, "login succeeded");
        Ok(reply.user)
    }

    /// Wipe all persisted credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store fails.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        info!("session cleared");
        Ok(())
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store fails.
    pub async fn stored_access_token(&self) -> Result<Option<String>> {
        self.store.access_token().await
    }

    /// Rotate the access token, coalescing concurrent requests.
    ///
    /// A caller that arrives while a refresh is in flight waits for it and
    /// observes its outcome instead of issuing a second network call. A
    /// caller that arrives after a refresh fully settled starts a new one.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NoRefreshToken`] if no refresh token is stored
    /// - [`BookingError::RefreshFailed`] on any other failure (rejected
    ///   token, unreachable service, malformed response); all credentials
    ///   are cleared first, so the session ends Anonymous
    pub async fn refresh_access_token(&self) -> Result<()> {
        let entry_generation = self.generation.load(Ordering::Acquire);
        let mut gate = self.gate.lock().await;
        if self.generation.load(Ordering::Acquire) != entry_generation {
            // Someone refreshed while we waited; share their outcome.
            return gate.last_outcome.clone();
        }

        let outcome = self.perform_refresh().await;
        gate.last_outcome = outcome.clone();
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn perform_refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.store.refresh_token().await? else {
            return Err(BookingError::NoRefreshToken);
        };

        match self.api.refresh(&refresh_token).await {
            Ok(reply) => {
                self.store.store_access_token(&reply.access_token).await?;
                info!("access token rotated");
                Ok(())
            },
            Err(error) => {
                // Refresh failure is terminal for the session. A stale
                // refresh token must not be retried after the server has
                // rotated it, so wipe and let the caller re-prompt login.
                warn!(%error, "token refresh failed, clearing session");
                if let Err(clear_error) = self.store.clear().await {
                    warn!(%clear_error, "failed to clear credentials");
                }
                Err(BookingError::RefreshFailed)
            },
        }
    }
}
