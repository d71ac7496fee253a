//! Session state manager.
//!
//! A [`SessionManager`] is constructed explicitly and handed to whoever needs it.
//! It owns the in-memory [`Session`] and mirrors the token and user into a
//! [`SessionStore`] so a later process can pick the session back up. Consumers
//! either poll the accessors or [`subscribe`](SessionManager::subscribe) to
//! state changes.

pub mod guard;
mod store;

pub use store::{FileStore, MemoryStore, SessionStore, TOKEN_KEY, USER_KEY};

use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::{AuthApi, ClientError};
use crate::models::{
    normalize_token, ForgotPasswordForm, LoginForm, LoginRequest, RegistrationForm,
    ResetPasswordForm, User,
};
use crate::roles::{self, FALLBACK_ROLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Checking,
    Authenticated,
    NotAuthenticated,
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStatus::Checking => write!(f, "checking"),
            AuthStatus::Authenticated => write!(f, "authenticated"),
            AuthStatus::NotAuthenticated => write!(f, "not-authenticated"),
        }
    }
}

/// Authentication status plus identity. A user is present iff the status is
/// [`AuthStatus::Authenticated`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    status: AuthStatus,
    user: Option<User>,
}

impl Session {
    pub fn checking() -> Self {
        Self {
            status: AuthStatus::Checking,
            user: None,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            user: Some(user),
        }
    }

    pub fn not_authenticated() -> Self {
        Self {
            status: AuthStatus::NotAuthenticated,
            user: None,
        }
    }

    pub fn status(&self) -> AuthStatus {
        self.status
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<Session>,
    /// Held across login, token validation and refresh so only one of them
    /// mutates the session at a time.
    auth_flight: Mutex<()>,
}

impl SessionManager {
    /// Create a manager in the `Checking` state without contacting the backend
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(Session::checking());
        Self {
            api,
            store,
            state,
            auth_flight: Mutex::new(()),
        }
    }

    /// Create a manager and immediately validate any stored token
    pub async fn start(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        let manager = Self::new(api, store);
        if let Err(e) = manager.check_auth_status().await {
            debug!(error = %e, "No session restored");
        }
        manager
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// The in-memory user, or while a check is still pending, the stored one
    pub fn current_user_or_stored(&self) -> Option<User> {
        let session = self.state.borrow().clone();
        match (session.status, session.user) {
            (_, Some(user)) => Some(user),
            (AuthStatus::Checking, None) => self.stored_user(),
            _ => None,
        }
    }

    /// Bare token from the store, if any
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).and_then(|t| normalize_token(&t))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        form.validate()?;

        let _flight = self.auth_flight.lock().await;
        let request = LoginRequest {
            username: form.username.trim().to_string(),
            password: form.password,
        };

        let (user, token) = match self.api.login(&request).await.and_then(|r| r.into_login()) {
            Ok(parts) => parts,
            Err(e) => {
                warn!(username = %request.username, error = %e, "Login failed");
                return Err(e);
            }
        };

        self.commit(user.clone(), &token);
        info!(username = %user.username, roles = user.roles.len(), "Logged in");
        Ok(user)
    }

    /// Validate the stored token against the backend.
    ///
    /// Without a stored token this logs out and fails without any request.
    pub async fn check_auth_status(&self) -> Result<User, ClientError> {
        let _flight = self.auth_flight.lock().await;

        let Some(token) = self.token() else {
            debug!("No stored token");
            self.clear_session();
            return Err(ClientError::NotAuthenticated);
        };

        match self
            .api
            .check_token(&token)
            .await
            .and_then(|r| r.into_validated(&token))
        {
            Ok((user, token)) => {
                self.commit(user.clone(), &token);
                debug!(username = %user.username, "Stored token is valid");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Stored token rejected");
                self.drop_token();
                Err(e)
            }
        }
    }

    /// Forget the session. Safe to call any number of times.
    ///
    /// Waits for an in-flight login, check or refresh, then clears.
    pub async fn logout(&self) {
        let _flight = self.auth_flight.lock().await;
        self.clear_session();
    }

    fn clear_session(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to clear stored session");
            }
        }
        let previous = self.state.send_replace(Session::not_authenticated());
        if previous.is_authenticated() {
            info!("Logged out");
        }
    }

    /// Exchange the stored token for a fresh one
    pub async fn refresh_token(&self) -> Result<String, ClientError> {
        let _flight = self.auth_flight.lock().await;
        let Some(token) = self.token() else {
            self.clear_session();
            return Err(ClientError::NotAuthenticated);
        };

        let refreshed = self.api.refresh_token(&token).await.and_then(|raw| {
            normalize_token(&raw).ok_or_else(|| ClientError::Decode("token vacío".to_string()))
        });

        match refreshed {
            Ok(refreshed) => {
                self.store.set(TOKEN_KEY, &refreshed)?;
                debug!("Token refreshed");
                Ok(refreshed)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh rejected");
                self.drop_token();
                Err(e)
            }
        }
    }

    /// Create an account. The current session is left untouched.
    pub async fn register(&self, form: RegistrationForm) -> Result<User, ClientError> {
        let registration = form.into_registration()?;
        let user = self.api.register(&registration).await?;
        info!(username = %user.username, "Registered user");
        Ok(user)
    }

    pub async fn send_reset_password_email(&self, identifier: &str) -> Result<(), ClientError> {
        let form = ForgotPasswordForm {
            identifier: identifier.to_string(),
        };
        form.validate()?;
        self.api.forgot_password(form.identifier.trim()).await?;
        info!(identifier = %form.identifier.trim(), "Password reset email requested");
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ClientError> {
        let form = ResetPasswordForm {
            token: token.to_string(),
            password: password.to_string(),
        };
        form.validate()?;
        self.api
            .reset_password(form.token.trim(), &form.password)
            .await?;
        info!("Password reset");
        Ok(())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.has_any_role(&[role])
    }

    /// True iff the current user holds at least one of `roles`
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        self.current_user_or_stored()
            .map(|user| roles::user_has_any(&user, roles))
            .unwrap_or(false)
    }

    /// Roles offered by the backend, or the fixed set when it cannot list them
    pub async fn available_roles(&self) -> Vec<String> {
        match self.api.roles().await {
            Ok(roles) if !roles.is_empty() => roles,
            Ok(_) => {
                warn!("Backend returned no roles, using defaults");
                fallback_roles()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load roles, using defaults");
                fallback_roles()
            }
        }
    }

    fn commit(&self, user: User, token: &str) {
        if let Err(e) = self.store.set(TOKEN_KEY, token) {
            warn!(error = %e, "Failed to persist token");
        }
        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.store.set(USER_KEY, &json) {
                    warn!(error = %e, "Failed to persist user");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize user"),
        }
        self.state.send_replace(Session::authenticated(user));
    }

    /// Forget the token after the backend refused it
    fn drop_token(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove stored token");
        }
        self.state.send_replace(Session::not_authenticated());
    }

    fn stored_user(&self) -> Option<User> {
        let json = self.store.get(USER_KEY)?;
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable stored user");
                None
            }
        }
    }
}

fn fallback_roles() -> Vec<String> {
    FALLBACK_ROLES.iter().map(|r| r.to_string()).collect()
}
