//! Role resolver: display labels and role lookups.
//!
//! Callers may hand us any string the backend produced. Unrecognized codes never
//! fail; the caller picks the fallback that suits its screen.

use std::borrow::Cow;

use crate::models::{RoleName, User};

/// Label used when a role code is unknown and the raw code should not be shown
pub const GENERIC_LABEL: &str = "Usuario";

/// Roles offered when the backend cannot list them
pub const FALLBACK_ROLES: [&str; 4] = ["USER", "ADMIN", "SUPERVISOR", "EMPLEADO"];

/// Label for a role code such as `ROLE_ADMIN` or `ADMIN`
pub fn role_label(code: &str) -> Option<&'static str> {
    code.parse::<RoleName>().ok().map(|role| role.label())
}

/// Label, or the generic "Usuario" for unknown or missing codes (navigation bar style)
pub fn label_or_generic(code: Option<&str>) -> &'static str {
    code.and_then(role_label).unwrap_or(GENERIC_LABEL)
}

/// Label, or the raw code itself for unknown codes (listing style)
pub fn label_or_raw(code: &str) -> Cow<'_, str> {
    match role_label(code) {
        Some(label) => Cow::Borrowed(label),
        None => Cow::Borrowed(code),
    }
}

/// Labels of every role a user holds, in the order received
pub fn user_labels(user: &User) -> Vec<&'static str> {
    user.roles.iter().map(|role| role.name.label()).collect()
}

/// Labels for a list of role codes, keeping unknown codes as-is
pub fn labels_for<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    codes
        .iter()
        .map(|code| label_or_raw(code.as_ref()).into_owned())
        .collect()
}

/// Known roles among requested names; unknown names are dropped
pub fn resolve_requested<S: AsRef<str>>(requested: &[S]) -> Vec<RoleName> {
    requested
        .iter()
        .filter_map(|name| name.as_ref().parse::<RoleName>().ok())
        .collect()
}

/// True iff `user` holds at least one of the requested roles
pub fn user_has_any<S: AsRef<str>>(user: &User, requested: &[S]) -> bool {
    user.has_any_role(&resolve_requested(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user_with(roles: &[RoleName]) -> User {
        User {
            id: Some(1),
            name: "Ana".to_string(),
            lastname: "Ruiz".to_string(),
            username: "aruiz".to_string(),
            email: String::new(),
            password: String::new(),
            roles: roles.iter().copied().map(Role::new).collect(),
            active: true,
        }
    }

    #[test]
    fn test_role_label() {
        assert_eq!(role_label("ROLE_ADMIN"), Some("Administrador"));
        assert_eq!(role_label("ROLE_USER"), Some("Usuario"));
        assert_eq!(role_label("ROLE_SUPERVISOR"), Some("Supervisor"));
        assert_eq!(role_label("ROLE_EMPLEADO"), Some("Empleado"));
        assert_eq!(role_label("EMPLEADO"), Some("Empleado"));
        assert_eq!(role_label("ROLE_ROOT"), None);
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(label_or_generic(Some("ROLE_ROOT")), "Usuario");
        assert_eq!(label_or_generic(None), "Usuario");
        assert_eq!(label_or_generic(Some("ROLE_ADMIN")), "Administrador");
        assert_eq!(label_or_raw("ROLE_ROOT"), "ROLE_ROOT");
        assert_eq!(label_or_raw("ROLE_SUPERVISOR"), "Supervisor");
    }

    #[test]
    fn test_labels_for_codes() {
        assert_eq!(
            labels_for(&["ROLE_ADMIN", "ROLE_USER"]),
            vec!["Administrador".to_string(), "Usuario".to_string()]
        );
        assert_eq!(labels_for(&["X"]), vec!["X".to_string()]);
        assert!(labels_for::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_user_labels() {
        let user = user_with(&[RoleName::Admin, RoleName::User]);
        assert_eq!(user_labels(&user), vec!["Administrador", "Usuario"]);
    }

    #[test]
    fn test_user_has_any() {
        let user = user_with(&[RoleName::Supervisor]);
        assert!(user_has_any(&user, &["ROLE_SUPERVISOR"]));
        assert!(user_has_any(&user, &["ADMIN", "supervisor"]));
        assert!(!user_has_any(&user, &["ROLE_ADMIN"]));
        assert!(!user_has_any(&user, &["ROLE_UNKNOWN"]));
        assert!(!user_has_any::<&str>(&user, &[]));

        let nobody = user_with(&[]);
        for role in RoleName::ALL {
            assert!(!user_has_any(&nobody, &[role.code()]));
        }
    }
}
