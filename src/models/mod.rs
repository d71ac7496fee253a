//! Domain and wire models shared by the session manager, the user service and the CLI.

mod auth;
mod forms;
mod page;
mod user;

pub use auth::{
    normalize_token, AuthBody, AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest,
    RefreshResponse, Registration, ResetPasswordRequest, RoleRef, UserRecord,
};
pub use forms::{ForgotPasswordForm, LoginForm, RegistrationForm, ResetPasswordForm, UserForm};
pub use page::Page;
pub use user::{Role, RoleName, User, UserPayload, WireRole};
