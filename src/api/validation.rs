//! Client-side input validation.
//!
//! Forms are checked before anything is sent to the backend. Each validator
//! returns `Err(message)` with an operator-facing message; collect them with
//! [`ValidationErrorBuilder`](super::error::ValidationErrorBuilder).

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::RoleName;

pub const USERNAME_MIN: usize = 4;
pub const USERNAME_MAX: usize = 12;
pub const EMAIL_MAX: usize = 100;
pub const STRONG_PASSWORD_MIN: usize = 8;
/// Minimum accepted by the backend for admin-created accounts
pub const PASSWORD_MIN: usize = 6;

lazy_static! {
    /// Same shape accepted by common browser form validators (TLD optional)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Non-blank value
pub fn validate_required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Campo obligatorio".to_string());
    }
    Ok(())
}

/// Non-blank value of at most `max` characters
pub fn validate_text(value: &str, max: usize) -> Result<(), String> {
    validate_required(value)?;
    if value.chars().count() > max {
        return Err(format!("Máximo {} caracteres", max));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    validate_text(email, EMAIL_MAX)?;
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err("Email inválido".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    validate_required(username)?;
    let len = username.chars().count();
    if len < USERNAME_MIN || len > USERNAME_MAX {
        return Err(format!(
            "El usuario debe tener entre {} y {} caracteres",
            USERNAME_MIN, USERNAME_MAX
        ));
    }
    Ok(())
}

/// Self-registration password: length plus at least one uppercase letter and one digit
pub fn validate_strong_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Campo obligatorio".to_string());
    }
    if password.chars().count() < STRONG_PASSWORD_MIN {
        return Err(format!(
            "La contraseña debe tener al menos {} caracteres",
            STRONG_PASSWORD_MIN
        ));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_upper || !has_digit {
        return Err("La contraseña debe incluir una mayúscula y un número".to_string());
    }
    Ok(())
}

/// Password set by an administrator when creating an account
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Campo obligatorio".to_string());
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(format!(
            "La contraseña debe tener al menos {} caracteres",
            PASSWORD_MIN
        ));
    }
    Ok(())
}

/// At least one role, all of them known
pub fn validate_roles(roles: &[String]) -> Result<Vec<RoleName>, String> {
    if roles.is_empty() {
        return Err("Selecciona al menos un rol".to_string());
    }
    let mut parsed: Vec<RoleName> = Vec::with_capacity(roles.len());
    for role in roles {
        let name = role.parse::<RoleName>()?;
        if !parsed.contains(&name) {
            parsed.push(name);
        }
    }
    Ok(parsed)
}
