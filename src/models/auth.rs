//! Authentication request and response models.

use serde::{Deserialize, Serialize};

use super::user::User;
use super::RoleName;
use crate::api::ClientError;

/// Strip an optional `Bearer ` prefix and surrounding whitespace.
///
/// Returns `None` for an empty credential, including a bare `Bearer` scheme.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim_start();
    let bare = trimmed.strip_prefix("Bearer ").unwrap_or(trimmed).trim();
    if bare.is_empty() || bare == "Bearer" {
        None
    } else {
        Some(bare.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// Role reference used in outgoing payloads: `{"name": "ROLE_ADMIN"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRef {
    pub name: RoleName,
}

/// Registration payload for `/api/usuarios/create`
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub roles: Vec<RoleRef>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    pub admin: bool,
}

/// A user record that may carry its own token
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of a login or check-token response.
///
/// The backend wraps the user as `{"usuario": {...}, "token": "..."}`; older
/// deployments answer with the flat record or an array of records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuthBody {
    Envelope {
        usuario: UserRecord,
        #[serde(default)]
        token: Option<String>,
    },
    Many(Vec<UserRecord>),
    One(UserRecord),
}

impl AuthBody {
    /// Split into the first user record (if any) and the body-level token.
    fn into_parts(self) -> (Option<UserRecord>, Option<String>) {
        match self {
            AuthBody::Envelope { usuario, token } => (Some(usuario), token),
            AuthBody::Many(records) => (records.into_iter().next(), None),
            AuthBody::One(record) => (Some(record), None),
        }
    }
}

/// Decoded authentication response: body plus the `Authorization` response header.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub body: AuthBody,
    pub authorization: Option<String>,
}

impl AuthResponse {
    /// Resolve a login response into the user and bare token.
    ///
    /// Token precedence: body token, then the record's token, then the header.
    pub fn into_login(self) -> Result<(User, String), ClientError> {
        let (record, body_token) = self.body.into_parts();
        let record = record
            .ok_or_else(|| ClientError::Decode("la respuesta no contiene usuario".to_string()))?;

        let token = [body_token, record.token, self.authorization]
            .into_iter()
            .flatten()
            .find_map(|t| normalize_token(&t))
            .ok_or_else(|| {
                ClientError::Authentication("El servidor no devolvió un token".to_string())
            })?;

        Ok((record.user, token))
    }

    /// Resolve a check-token response into the user and the token to keep.
    ///
    /// Token precedence: refreshed header, then the record's token, then `sent`.
    pub fn into_validated(self, sent: &str) -> Result<(User, String), ClientError> {
        let (record, body_token) = self.body.into_parts();
        let record = record
            .ok_or_else(|| ClientError::Decode("la respuesta no contiene usuario".to_string()))?;

        let token = [
            self.authorization,
            record.token,
            body_token,
            Some(sent.to_string()),
        ]
        .into_iter()
        .flatten()
        .find_map(|t| normalize_token(&t))
        .ok_or(ClientError::NotAuthenticated)?;

        Ok((record.user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value, authorization: Option<&str>) -> AuthResponse {
        AuthResponse {
            body: serde_json::from_value(body).unwrap(),
            authorization: authorization.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("Bearer abc123").as_deref(), Some("abc123"));
        assert_eq!(normalize_token("abc123").as_deref(), Some("abc123"));
        assert_eq!(normalize_token("  Bearer  abc123 ").as_deref(), Some("abc123"));
        assert_eq!(normalize_token("Bearer "), None);
        assert_eq!(normalize_token("  Bearer   "), None);
        assert_eq!(normalize_token("Bearer"), None);
        assert_eq!(normalize_token(""), None);
        assert_eq!(normalize_token("   "), None);
    }

    #[test]
    fn test_empty_bearer_header_is_not_a_token() {
        let res = response(json!({"username": "admin"}), Some("Bearer "));
        assert!(matches!(
            res.into_login(),
            Err(ClientError::Authentication(_))
        ));

        let res = response(json!({"username": "admin"}), Some("Bearer "));
        let (_, token) = res.into_validated("sent").unwrap();
        assert_eq!(token, "sent");
    }

    #[test]
    fn test_login_record_with_null_fields() {
        let res = response(
            json!({
                "usuario": {
                    "id": 3,
                    "name": null,
                    "lastname": null,
                    "email": null,
                    "username": "clerk",
                    "roles": null,
                    "active": null
                },
                "token": "abc"
            }),
            None,
        );

        let (user, token) = res.into_login().unwrap();
        assert_eq!(token, "abc");
        assert_eq!(user.username, "clerk");
        assert!(user.email.is_empty());
        assert!(user.roles.is_empty());
        assert!(user.active);
    }

    #[test]
    fn test_flat_login_response() {
        let res = response(
            json!({
                "token": "Bearer abc123",
                "id": "5",
                "name": "Ana",
                "lastname": "Ruiz",
                "email": "ana@example.com",
                "username": "aruiz",
                "active": true,
                "roles": ["ROLE_ADMIN", "ROLE_USER"],
                "admin": true,
                "message": "ok"
            }),
            None,
        );

        let (user, token) = res.into_login().unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(user.id, Some(5));
        assert_eq!(user.username, "aruiz");
        assert!(user.is_admin());
        assert!(user.has_role(RoleName::User));
    }

    #[test]
    fn test_envelope_login_response() {
        let res = response(
            json!({
                "usuario": {
                    "id": 1,
                    "name": "Admin",
                    "lastname": "Root",
                    "email": "admin@example.com",
                    "username": "admin",
                    "active": true,
                    "roles": [{"id": 1, "name": "ROLE_ADMIN", "activo": true}],
                    "token": "inner"
                },
                "token": "outer"
            }),
            Some("Bearer header"),
        );

        let (user, token) = res.into_login().unwrap();
        assert_eq!(token, "outer");
        assert_eq!(user.username, "admin");
        assert!(user.is_admin());
    }

    #[test]
    fn test_login_token_from_header_only() {
        let res = response(json!({"username": "admin"}), Some("Bearer from-header"));
        let (_, token) = res.into_login().unwrap();
        assert_eq!(token, "from-header");
    }

    #[test]
    fn test_login_without_token_fails() {
        let res = response(json!({"username": "admin", "token": ""}), None);
        assert!(matches!(
            res.into_login(),
            Err(ClientError::Authentication(_))
        ));
    }

    #[test]
    fn test_check_token_array_prefers_header() {
        let res = response(
            json!([{"username": "admin", "token": "record"}, {"username": "other"}]),
            Some("Bearer refreshed"),
        );
        let (user, token) = res.into_validated("sent").unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(token, "refreshed");
    }

    #[test]
    fn test_check_token_falls_back_to_sent() {
        let res = response(json!({"username": "admin"}), None);
        let (_, token) = res.into_validated("Bearer sent").unwrap();
        assert_eq!(token, "sent");
    }

    #[test]
    fn test_check_token_empty_array_fails() {
        let res = response(json!([]), None);
        assert!(matches!(
            res.into_validated("sent"),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_registration_payload_shape() {
        let registration = Registration {
            name: "Ana".to_string(),
            lastname: "Ruiz".to_string(),
            email: "ana@example.com".to_string(),
            username: "aruiz".to_string(),
            password: "Secreto123".to_string(),
            roles: vec![RoleRef {
                name: RoleName::Admin,
            }],
            is_active: true,
            admin: false,
        };

        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["roles"], json!([{"name": "ROLE_ADMIN"}]));
        assert_eq!(value["isActive"], json!(true));
        assert_eq!(value["admin"], json!(false));
    }
}
