use shared_types::Credentials;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::{ApiError, ApiResponse, AuthApi};
use crate::config::SessionSettings;
use crate::forms::{validate_credentials, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Checking,
    Authenticated,
    Unauthenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Checking => "checking",
            SessionState::Authenticated => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("{0}")]
    Rejected(#[from] ApiError),
    /// Credentials were accepted but the session check kept failing
    #[error("Authentication verification failed: {0}")]
    Unverified(ApiError),
}

/// Decides whether the user sees the dashboard or the sign-in form
pub struct SessionGate {
    api: Arc<dyn AuthApi>,
    verify_retry_delay: Duration,
    state: Mutex<SessionState>,
}

impl SessionGate {
    pub fn new(api: Arc<dyn AuthApi>, settings: &SessionSettings) -> Self {
        Self {
            api,
            verify_retry_delay: settings.verify_retry_delay(),
            state: Mutex::new(SessionState::Checking),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: SessionState) {
        *self.lock() = state;
    }

    pub fn state(&self) -> SessionState {
        *self.lock()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Startup check; never leaves the gate in `Checking`
    pub async fn check(&self) -> SessionState {
        let state = match self.api.current_user().await {
            Ok(_) => SessionState::Authenticated,
            Err(e) => {
                tracing::info!("Not authenticated: {}", e);
                SessionState::Unauthenticated
            }
        };
        self.set(state);
        state
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, AuthError> {
        validate_credentials(credentials)?;
        let data = self.api.login(credentials).await?;
        self.verify(data).await
    }

    /// Creates the account, then signs in with the same credentials
    pub async fn register(&self, credentials: &Credentials) -> Result<ApiResponse, AuthError> {
        validate_credentials(credentials)?;
        self.api.register(credentials).await?;
        tracing::info!("Registered {}", credentials.email);
        let data = self.api.login(credentials).await?;
        self.verify(data).await
    }

    /// The cookie may not be visible to the very first check, so a failed
    /// check is retried once after the configured delay.
    async fn verify(&self, data: ApiResponse) -> Result<ApiResponse, AuthError> {
        tracing::debug!("Authentication accepted: {:?}", data);

        if let Err(e) = self.api.current_user().await {
            tracing::warn!(
                "Authentication verification failed, retrying in {:?}: {}",
                self.verify_retry_delay,
                e
            );
            tokio::time::sleep(self.verify_retry_delay).await;

            if let Err(e) = self.api.current_user().await {
                tracing::error!("Auth verification retry failed: {}", e);
                return Err(AuthError::Unverified(e));
            }
        }

        self.set(SessionState::Authenticated);
        tracing::info!("Session established");
        Ok(data)
    }

    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::error!("Logout failed: {}", e);
        }
        self.set(SessionState::Unauthenticated);
    }
}
