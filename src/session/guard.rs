//! Route guards: gate an action on the session status and the user's roles.

use tracing::debug;

use super::SessionManager;
use crate::api::ClientError;
use crate::models::{RoleName, User};

/// Continue only with an authenticated user
pub fn require_authenticated(session: &SessionManager) -> Result<User, ClientError> {
    session.current_user().ok_or_else(|| {
        debug!(status = %session.status(), "Guard rejected: not authenticated");
        ClientError::Unauthorized("Inicia sesión para continuar".to_string())
    })
}

/// Continue only when nobody is logged in (login, registration, password reset)
pub fn require_not_authenticated(session: &SessionManager) -> Result<(), ClientError> {
    if session.is_authenticated() {
        return Err(ClientError::Forbidden(
            "Ya existe una sesión activa".to_string(),
        ));
    }
    Ok(())
}

/// Continue only with an authenticated user holding one of `roles`
pub fn require_any_role(
    session: &SessionManager,
    roles: &[RoleName],
) -> Result<User, ClientError> {
    let user = require_authenticated(session)?;
    if !user.has_any_role(roles) {
        debug!(username = %user.username, "Guard rejected: missing role");
        return Err(ClientError::Forbidden(
            "No tienes permisos para esta acción".to_string(),
        ));
    }
    Ok(user)
}
