//! reqwest-based client for the administration backend.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{AuthApi, ClientError};
use crate::config::ApiConfig;
use crate::models::{
    normalize_token, AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest,
    RefreshResponse, Registration, ResetPasswordRequest, User, WireRole,
};

const LOGIN_FAILED: &str = "Error de autenticación";
const REGISTER_FAILED: &str = "Error de registro";
const FORGOT_FAILED: &str = "Error enviando email de recuperación";
const RESET_FAILED: &str = "Error al restablecer contraseña";
const TOKEN_INVALID: &str = "Token inválido";
const ROLES_FAILED: &str = "No se pudieron obtener los roles";

/// HTTP client bound to one backend, optionally carrying a bearer token
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder =
            Client::builder().user_agent(concat!("mercadmin/", env!("CARGO_PKG_VERSION")));
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder.build().map_err(|e| {
            ClientError::Transport(format!("no se pudo crear el cliente HTTP: {}", e))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        })
    }

    /// Attach a bearer token to every request on secured endpoints
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.and_then(|t| normalize_token(&t));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.delete(self.url(path)))
    }

    /// Unauthenticated request, for the public auth endpoints
    fn public_post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Send a request; non-success statuses become a [`ClientError`] whose message
    /// comes from the body when the backend provides one, else `fallback`.
    pub(crate) async fn execute(
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "Backend returned an error");
        Err(ClientError::from_response(status, &body, fallback))
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn auth_response(response: Response) -> Result<AuthResponse, ClientError> {
        let authorization = response
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = Self::decode(response).await?;
        Ok(AuthResponse {
            body,
            authorization,
        })
    }
}

/// Rejections on the login endpoint mean bad credentials
fn as_authentication_failure(err: ClientError) -> ClientError {
    match err {
        ClientError::Unauthorized(message) | ClientError::Forbidden(message) => {
            ClientError::Authentication(message)
        }
        other => other,
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let response = Self::execute(
            self.public_post("/api/auth/login").json(request),
            LOGIN_FAILED,
        )
        .await
        .map_err(as_authentication_failure)?;
        Self::auth_response(response).await
    }

    async fn check_token(&self, token: &str) -> Result<AuthResponse, ClientError> {
        let request = self
            .client
            .get(self.url("/auth/check-token"))
            .bearer_auth(token);
        let response = Self::execute(request, TOKEN_INVALID).await?;
        Self::auth_response(response).await
    }

    async fn refresh_token(&self, token: &str) -> Result<String, ClientError> {
        let request = self
            .client
            .post(self.url("/auth/refresh"))
            .bearer_auth(token)
            .json(&RefreshRequest {
                token: token.to_string(),
            });
        let response = Self::execute(request, TOKEN_INVALID).await?;
        let refreshed: RefreshResponse = Self::decode(response).await?;
        Ok(refreshed.token)
    }

    async fn forgot_password(&self, username: &str) -> Result<(), ClientError> {
        let body = ForgotPasswordRequest {
            username: username.to_string(),
        };
        Self::execute(self.public_post("/forgot-password").json(&body), FORGOT_FAILED).await?;
        Ok(())
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<(), ClientError> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        };
        Self::execute(self.public_post("/reset-password").json(&body), RESET_FAILED).await?;
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<User, ClientError> {
        let response = Self::execute(
            self.public_post("/api/usuarios/create").json(registration),
            REGISTER_FAILED,
        )
        .await?;
        Self::decode(response).await
    }

    async fn roles(&self) -> Result<Vec<String>, ClientError> {
        let response = Self::execute(self.get("/api/roles"), ROLES_FAILED).await?;
        let roles: Vec<WireRole> = Self::decode(response).await?;
        Ok(roles.iter().map(|role| role.name().to_string()).collect())
    }
}
