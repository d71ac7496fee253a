//! Client error taxonomy.
//!
//! Every failure that leaves the library is a [`ClientError`] whose `Display` is a
//! plain message fit to show an operator. [`ErrorCode`] gives the machine-readable
//! category.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Transport,
    AuthenticationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    ServerError,
    DecodeError,
    StorageError,
    NotAuthenticated,
}

impl ErrorCode {
    /// Category for a non-success HTTP status
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
            StatusCode::FORBIDDEN => ErrorCode::Forbidden,
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ErrorCode::ValidationError
            }
            _ => ErrorCode::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Transport => "transport",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::ServerError => "server_error",
            ErrorCode::DecodeError => "decode_error",
            ErrorCode::StorageError => "storage_error",
            ErrorCode::NotAuthenticated => "not_authenticated",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// A single failure on one field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.into()]);
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Messages for one field
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .fields
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{}: {}", field, m)))
            .collect();
        if messages.is_empty() {
            f.write_str("Formulario inválido")
        } else {
            f.write_str(&messages.join("; "))
        }
    }
}

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: ValidationErrors,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .fields
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record the error of a validator, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Return Ok(()) if no errors were collected
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Errors surfaced by the client library
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No se pudo conectar con el servidor: {0}")]
    Transport(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Respuesta inesperada del servidor: {0}")]
    Decode(String),

    #[error("Error de almacenamiento local: {0}")]
    Storage(String),

    #[error("No hay una sesión activa")]
    NotAuthenticated,
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Transport(_) => ErrorCode::Transport,
            ClientError::Authentication(_) => ErrorCode::AuthenticationFailed,
            ClientError::Unauthorized(_) => ErrorCode::Unauthorized,
            ClientError::Forbidden(_) => ErrorCode::Forbidden,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::Validation(_) => ErrorCode::ValidationError,
            ClientError::Server { .. } => ErrorCode::ServerError,
            ClientError::Decode(_) => ErrorCode::DecodeError,
            ClientError::Storage(_) => ErrorCode::StorageError,
            ClientError::NotAuthenticated => ErrorCode::NotAuthenticated,
        }
    }

    /// Build an error from a non-success response.
    ///
    /// The body message wins over `fallback`; a `validationErrors` map becomes a
    /// [`ClientError::Validation`].
    pub fn from_response(status: StatusCode, body: &str, fallback: &str) -> Self {
        let parsed = ErrorBody::parse(body);

        if let Some(errors) = parsed.validation_errors() {
            return ClientError::Validation(errors);
        }

        let message = parsed.message().unwrap_or_else(|| fallback.to_string());
        match ErrorCode::from_status(status) {
            ErrorCode::Unauthorized => ClientError::Unauthorized(message),
            ErrorCode::Forbidden => ClientError::Forbidden(message),
            ErrorCode::NotFound => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Error body shapes produced by the backend
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "validationErrors")]
    validation_errors: Option<BTreeMap<String, serde_json::Value>>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn message(&self) -> Option<String> {
        [&self.message, &self.error]
            .into_iter()
            .flatten()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }

    fn validation_errors(&self) -> Option<ValidationErrors> {
        let map = self.validation_errors.as_ref()?;
        let mut builder = ValidationErrorBuilder::new();
        for (field, value) in map {
            match value {
                serde_json::Value::String(msg) => builder.add(field.as_str(), msg.as_str()),
                serde_json::Value::Array(items) => {
                    for item in items {
                        builder.add(field.as_str(), value_text(item));
                    }
                    &mut builder
                }
                other => builder.add(field.as_str(), value_text(other)),
            };
        }
        builder.finish().err()
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
