pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod roles;
pub mod session;
pub mod users;

pub use api::{ApiClient, AuthApi, ClientError};
pub use session::{AuthStatus, Session, SessionManager};
pub use users::UserService;
