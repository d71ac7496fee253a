//! Backend API access.
//!
//! [`AuthApi`] is the seam between the session manager and the network: the
//! manager only ever talks to the backend through it, so tests can swap in a fake.

mod client;
pub mod error;
pub mod validation;

pub use client::ApiClient;
pub use error::{ClientError, ErrorCode, ValidationErrorBuilder, ValidationErrors};

use async_trait::async_trait;

use crate::models::{AuthResponse, LoginRequest, Registration, User};

/// Authentication endpoints used by the session manager
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError>;

    /// `GET /auth/check-token` with the bare `token` as bearer credential
    async fn check_token(&self, token: &str) -> Result<AuthResponse, ClientError>;

    /// `POST /auth/refresh`, returning the new token as sent by the backend
    async fn refresh_token(&self, token: &str) -> Result<String, ClientError>;

    /// `POST /forgot-password`
    async fn forgot_password(&self, username: &str) -> Result<(), ClientError>;

    /// `POST /reset-password`
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), ClientError>;

    /// `POST /api/usuarios/create`
    async fn register(&self, registration: &Registration) -> Result<User, ClientError>;

    /// `GET /api/roles`, as raw role identifiers
    async fn roles(&self) -> Result<Vec<String>, ClientError>;
}
