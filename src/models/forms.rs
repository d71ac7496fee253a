//! Input forms and their client-side rules.
//!
//! A form is validated as a whole so every offending field is reported at once,
//! then converted into the payload the backend expects.

use crate::api::validation::{
    validate_email, validate_password, validate_required, validate_roles,
    validate_strong_password, validate_text, validate_username,
};
use crate::api::{ValidationErrorBuilder, ValidationErrors};

use super::auth::{Registration, RoleRef};
use super::user::UserPayload;

const REGISTRATION_NAME_MAX: usize = 50;
const ADMIN_NAME_MAX: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        errors.check("username", validate_required(&self.username));
        if self.password.is_empty() {
            errors.add("password", "Campo obligatorio");
        }
        errors.finish()
    }
}

/// Self-service registration
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub admin: bool,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            lastname: String::new(),
            email: String::new(),
            username: String::new(),
            password: String::new(),
            roles: Vec::new(),
            is_active: true,
            admin: false,
        }
    }
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.build_registration().map(|_| ())
    }

    /// Validate and build the registration payload
    pub fn into_registration(self) -> Result<Registration, ValidationErrors> {
        self.build_registration()
    }

    fn build_registration(&self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_text(&self.name, REGISTRATION_NAME_MAX));
        errors.check("lastname", validate_text(&self.lastname, REGISTRATION_NAME_MAX));
        errors.check("email", validate_email(&self.email));
        errors.check("username", validate_username(&self.username));
        errors.check("password", validate_strong_password(&self.password));

        let roles = match validate_roles(&self.roles) {
            Ok(roles) => roles,
            Err(message) => {
                errors.add("roles", message);
                Vec::new()
            }
        };
        errors.finish()?;

        Ok(Registration {
            name: self.name.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            roles: roles.into_iter().map(|name| RoleRef { name }).collect(),
            is_active: self.is_active,
            admin: self.admin,
        })
    }
}

/// Administrator create/edit form. `id` set means edit mode.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub id: Option<i64>,
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<String>,
    pub active: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            lastname: String::new(),
            username: String::new(),
            email: String::new(),
            password: String::new(),
            roles: Vec::new(),
            active: true,
        }
    }
}

impl UserForm {
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_payload().map(|_| ())
    }

    /// Validate and build the request body. In edit mode the password is never sent.
    pub fn into_payload(self) -> Result<UserPayload, ValidationErrors> {
        self.to_payload()
    }

    fn to_payload(&self) -> Result<UserPayload, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_text(&self.name, ADMIN_NAME_MAX));
        errors.check("lastname", validate_text(&self.lastname, ADMIN_NAME_MAX));
        errors.check("username", validate_username(&self.username));
        errors.check("email", validate_email(&self.email));
        if !self.is_edit() {
            errors.check("password", validate_password(&self.password));
        }

        let roles = match validate_roles(&self.roles) {
            Ok(roles) => roles,
            Err(message) => {
                errors.add("roles", message);
                Vec::new()
            }
        };
        errors.finish()?;

        Ok(UserPayload {
            id: self.id,
            name: self.name.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: if self.is_edit() {
                String::new()
            } else {
                self.password.clone()
            },
            roles: roles.into_iter().map(|name| RoleRef { name }).collect(),
            active: self.active,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub identifier: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        errors.check("username", validate_required(&self.identifier));
        errors.finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        errors.check("token", validate_required(&self.token));
        if self.password.is_empty() {
            errors.add("password", "Campo obligatorio");
        }
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleName;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            name: "Ana".to_string(),
            lastname: "Ruiz".to_string(),
            email: "ana@example.com".to_string(),
            username: "aruiz".to_string(),
            password: "Secreto123".to_string(),
            roles: vec!["ROLE_ADMIN".to_string(), "USER".to_string()],
            ..Default::default()
        }
    }

    fn user_form() -> UserForm {
        UserForm {
            name: "Luis".to_string(),
            lastname: "Gómez".to_string(),
            username: "lgomez".to_string(),
            email: "luis@example.com".to_string(),
            password: "abcdef".to_string(),
            roles: vec!["ROLE_SUPERVISOR".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_login_form() {
        let form = LoginForm {
            username: " ".to_string(),
            password: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().len(), 2);

        let form = LoginForm {
            username: "admin".to_string(),
            password: "x".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_registration_payload() {
        let payload = registration().into_registration().unwrap();
        assert_eq!(
            payload.roles,
            vec![
                RoleRef {
                    name: RoleName::Admin
                },
                RoleRef {
                    name: RoleName::User
                }
            ]
        );
        assert!(payload.is_active);
        assert!(!payload.admin);
    }

    #[test]
    fn test_registration_reports_every_field() {
        let form = RegistrationForm {
            name: "a".repeat(51),
            email: "bad".to_string(),
            username: "abc".to_string(),
            password: "weak".to_string(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        for field in ["name", "lastname", "email", "username", "password", "roles"] {
            assert!(!errors.field(field).is_empty(), "missing error for {}", field);
        }
    }

    #[test]
    fn test_user_form_create_requires_password() {
        let mut form = user_form();
        form.password.clear();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().len(), 1);
        assert!(!errors.field("password").is_empty());
    }

    #[test]
    fn test_user_form_edit_blanks_password() {
        let mut form = user_form();
        form.id = Some(9);
        form.password = "ignored".to_string();
        let payload = form.into_payload().unwrap();
        assert_eq!(payload.id, Some(9));
        assert_eq!(payload.password, "");

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["roles"], serde_json::json!([{"name": "ROLE_SUPERVISOR"}]));
    }

    #[test]
    fn test_user_form_admin_name_limit() {
        let mut form = user_form();
        form.name = "a".repeat(100);
        assert!(form.validate().is_ok());
        form.name = "a".repeat(101);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_reset_and_forgot_forms() {
        assert!(ForgotPasswordForm::default().validate().is_err());
        assert!(ForgotPasswordForm {
            identifier: "admin".to_string()
        }
        .validate()
        .is_ok());

        let errors = ResetPasswordForm::default().validate().unwrap_err();
        assert!(!errors.field("token").is_empty());
        assert!(!errors.field("password").is_empty());
    }
}
