//! CLI module for the mercadmin command-line interface.
//!
//! Provides subcommands for the administration backend:
//! - `login` / `logout` / `status` / `refresh` - Session management
//! - `register`, `forgot-password`, `reset-password` - Account flows
//! - `roles` - Available roles
//! - `users list|show|create|update|delete` - User administration
//! - `config check` - Validate configuration file

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::{Page, RegistrationForm, RoleName, User, UserForm};
use crate::roles;
use crate::session::guard::{require_any_role, require_authenticated, require_not_authenticated};
use crate::session::{FileStore, SessionManager, SessionStore, TOKEN_KEY};
use crate::users::UserService;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "mercadmin")]
#[command(author, version, about = "Administration client for the e-commerce backend", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mercadmin.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL (overrides api.base_url)
    #[arg(long, env = "MERCADMIN_API_URL")]
    pub api_url: Option<String>,

    /// Session file (overrides storage.session_file)
    #[arg(long, env = "MERCADMIN_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(short, long)]
        username: String,
        /// Password (can also be set via MERCADMIN_PASSWORD env var)
        #[arg(short, long, env = "MERCADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Validate the stored session and show the current user
    Status,

    /// Exchange the stored token for a fresh one
    Refresh,

    /// Create a new account
    Register(RegisterArgs),

    /// Request a password recovery email
    ForgotPassword {
        /// Username or email
        identifier: String,
    },

    /// Set a new password using a recovery token
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "MERCADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List the roles that can be assigned
    Roles,

    /// User administration commands
    #[command(subcommand)]
    Users(UsersCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub lastname: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: String,
    #[arg(long, env = "MERCADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Role to grant, e.g. ROLE_ADMIN or USER (repeatable)
    #[arg(long = "role", required = true)]
    pub roles: Vec<String>,
    /// Create the account disabled
    #[arg(long)]
    pub inactive: bool,
    #[arg(long)]
    pub admin: bool,
}

/// Users subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List users, one page at a time
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Fetch every user at once
        #[arg(long, conflicts_with = "page")]
        all: bool,
    },
    /// Show details for a user
    Show { id: i64 },
    /// Create a user
    Create(CreateUserArgs),
    /// Update a user; omitted fields keep their current value
    Update(UpdateUserArgs),
    /// Delete a user
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub lastname: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "MERCADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long = "role", required = true)]
    pub roles: Vec<String>,
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Args, Debug)]
pub struct UpdateUserArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Replaces every current role (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,
    #[arg(long)]
    pub inactive: bool,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Configuration with command-line overrides applied
pub fn effective_config(cli: &Cli, mut config: Config) -> Config {
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(path) = &cli.session_file {
        config.storage.session_file = path.clone();
    }
    config
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: Config) -> Result<()> {
    let config = effective_config(cli, config);
    match &cli.command {
        Commands::Login { username, password } => {
            cmd_login(&config, username, password.as_deref()).await
        }
        Commands::Logout => cmd_logout(&config).await,
        Commands::Status => cmd_status(&config).await,
        Commands::Refresh => cmd_refresh(&config).await,
        Commands::Register(args) => cmd_register(&config, args).await,
        Commands::ForgotPassword { identifier } => cmd_forgot_password(&config, identifier).await,
        Commands::ResetPassword { token, password } => {
            cmd_reset_password(&config, token, password).await
        }
        Commands::Roles => cmd_roles(&config).await,
        Commands::Users(UsersCommands::List { page, all }) => {
            cmd_users_list(&config, *page, *all).await
        }
        Commands::Users(UsersCommands::Show { id }) => cmd_users_show(&config, *id).await,
        Commands::Users(UsersCommands::Create(args)) => cmd_users_create(&config, args).await,
        Commands::Users(UsersCommands::Update(args)) => cmd_users_update(&config, args).await,
        Commands::Users(UsersCommands::Delete { id }) => cmd_users_delete(&config, *id).await,
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
    }
}

/// Session handle plus an API client carrying the stored token
struct CliContext {
    client: ApiClient,
    session: SessionManager,
}

impl CliContext {
    /// Open the session file. With `restore`, the stored token is validated first.
    async fn open(config: &Config, restore: bool) -> Result<Self> {
        let store = FileStore::open(&config.storage.session_file).with_context(|| {
            format!(
                "Failed to open session file {}",
                config.storage.session_file.display()
            )
        })?;
        let token = store.get(TOKEN_KEY);
        let store: Arc<dyn SessionStore> = Arc::new(store);

        let client = ApiClient::new(&config.api)?.with_token(token);
        let api = Arc::new(client.clone());
        let session = if restore {
            SessionManager::start(api, store).await
        } else {
            SessionManager::new(api, store)
        };

        Ok(Self { client, session })
    }

    /// User service authorized with the current session token
    fn users(&self) -> UserService {
        UserService::new(self.client.clone().with_token(self.session.token()))
    }
}

async fn cmd_login(config: &Config, username: &str, password: Option<&str>) -> Result<()> {
    let Some(password) = password else {
        bail!("Password required. Use --password or set MERCADMIN_PASSWORD environment variable.");
    };

    let ctx = CliContext::open(config, true).await?;
    require_not_authenticated(&ctx.session)?;

    let user = ctx.session.login(username, password).await?;
    println!("[OK] Sesión iniciada como {}", display_name(&user));
    println!("     Rol: {}", primary_role_label(&user));
    Ok(())
}

async fn cmd_logout(config: &Config) -> Result<()> {
    let store = FileStore::open(&config.storage.session_file)?;
    let token = store.get(TOKEN_KEY);
    let session = SessionManager::new(
        Arc::new(ApiClient::new(&config.api)?.with_token(token)),
        Arc::new(store),
    );
    session.logout().await;
    println!("[OK] Sesión cerrada");
    Ok(())
}

async fn cmd_status(config: &Config) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;

    println!();
    println!("Servidor: {}", ctx.client.base_url());
    println!("Estado:   {}", ctx.session.status());
    match ctx.session.current_user() {
        Some(user) => {
            print_user(&user);
            println!();
            println!("Secciones:");
            for (section, allowed) in sections(&user) {
                let icon = if allowed { "[OK]" } else { "[--]" };
                println!("  {} {}", icon, section);
            }
        }
        None => println!("No hay una sesión activa. Usa 'mercadmin login' para iniciar sesión."),
    }
    println!();
    Ok(())
}

async fn cmd_refresh(config: &Config) -> Result<()> {
    let ctx = CliContext::open(config, false).await?;
    ctx.session.refresh_token().await?;
    println!("[OK] Token renovado");
    Ok(())
}

async fn cmd_register(config: &Config, args: &RegisterArgs) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_not_authenticated(&ctx.session)?;

    let form = RegistrationForm {
        name: args.name.clone(),
        lastname: args.lastname.clone(),
        email: args.email.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
        roles: args.roles.clone(),
        is_active: !args.inactive,
        admin: args.admin,
    };
    let user = ctx.session.register(form).await?;

    println!("[OK] Usuario registrado: {}", user.username);
    println!("     Roles: {}", roles::user_labels(&user).join(", "));
    Ok(())
}

async fn cmd_forgot_password(config: &Config, identifier: &str) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_not_authenticated(&ctx.session)?;

    ctx.session.send_reset_password_email(identifier).await?;
    println!("[OK] Se envió un enlace de recuperación al email registrado");
    Ok(())
}

async fn cmd_reset_password(config: &Config, token: &str, password: &str) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_not_authenticated(&ctx.session)?;

    ctx.session.reset_password(token, password).await?;
    println!("[OK] Contraseña restablecida. Ya puedes iniciar sesión.");
    Ok(())
}

async fn cmd_roles(config: &Config) -> Result<()> {
    let ctx = CliContext::open(config, false).await?;
    let available = ctx.session.available_roles().await;

    println!();
    println!("{:<20}  {:<20}", "CODE", "LABEL");
    println!("{}", "-".repeat(42));
    for (code, label) in available.iter().zip(roles::labels_for(&available)) {
        println!("{:<20}  {:<20}", code, label);
    }
    println!();
    Ok(())
}

async fn cmd_users_list(config: &Config, page: u32, all: bool) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_authenticated(&ctx.session)?;
    let users = ctx.users();

    if all {
        let list = users.list().await?;
        print_users(&list);
        return Ok(());
    }

    let page = users.page(page.saturating_sub(1)).await?;
    print_users(&page.content);
    if page.total_pages > 0 {
        println!("{}", render_tabs(&page));
        println!();
    }
    Ok(())
}

async fn cmd_users_show(config: &Config, id: i64) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_authenticated(&ctx.session)?;

    let user = ctx.users().get(id).await?;
    println!();
    println!("=== Usuario: {} ===", user.username);
    println!();
    print_user(&user);
    println!();
    Ok(())
}

async fn cmd_users_create(config: &Config, args: &CreateUserArgs) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_any_role(&ctx.session, &[RoleName::Admin])?;

    let form = UserForm {
        id: None,
        name: args.name.clone(),
        lastname: args.lastname.clone(),
        username: args.username.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
        roles: args.roles.clone(),
        active: !args.inactive,
    };
    let user = ctx.users().create(form).await?;
    println!("[OK] Usuario creado: {} (ID {})", user.username, format_id(user.id));
    Ok(())
}

async fn cmd_users_update(config: &Config, args: &UpdateUserArgs) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    require_any_role(&ctx.session, &[RoleName::Admin])?;
    let users = ctx.users();

    let current = users.get(args.id).await?;
    let form = update_form(&current, args);
    let user = users.update(form).await?;
    println!("[OK] Usuario actualizado: {}", user.username);
    Ok(())
}

async fn cmd_users_delete(config: &Config, id: i64) -> Result<()> {
    let ctx = CliContext::open(config, true).await?;
    let admin = require_any_role(&ctx.session, &[RoleName::Admin])?;
    if admin.id == Some(id) {
        bail!("No puedes eliminar tu propio usuario");
    }

    if ctx.users().delete(id).await? {
        println!("[OK] Usuario {} eliminado", id);
    }
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used.");
        return Ok(());
    }

    let config = effective_config(cli, Config::load(config_path)?);
    config.validate()?;

    println!("[OK] Configuration file is valid!");
    println!();
    println!("API:");
    println!("  Base URL:     {}", config.api.base_url);
    match config.api.request_timeout_secs {
        0 => println!("  Timeout:      none"),
        secs => println!("  Timeout:      {}s", secs),
    }
    println!();
    println!("Storage:");
    println!("  Session file: {}", config.storage.session_file.display());
    println!();
    println!("Logging:");
    println!("  Level:        {}", config.logging.level);
    println!();
    Ok(())
}

/// Edit form for `current` with the given overrides applied
fn update_form(current: &User, args: &UpdateUserArgs) -> UserForm {
    let roles = if args.roles.is_empty() {
        current.roles.iter().map(|r| r.name.code().to_string()).collect()
    } else {
        args.roles.clone()
    };
    let active = if args.active {
        true
    } else if args.inactive {
        false
    } else {
        current.active
    };

    UserForm {
        id: Some(args.id),
        name: args.name.clone().unwrap_or_else(|| current.name.clone()),
        lastname: args
            .lastname
            .clone()
            .unwrap_or_else(|| current.lastname.clone()),
        username: args
            .username
            .clone()
            .unwrap_or_else(|| current.username.clone()),
        email: args.email.clone().unwrap_or_else(|| current.email.clone()),
        password: String::new(),
        roles,
        active,
    }
}

fn print_user(user: &User) {
    println!("ID:       {}", format_id(user.id));
    println!("Usuario:  {}", user.username);
    println!("Nombre:   {}", display_name(user));
    println!("Email:    {}", if user.email.is_empty() { "-" } else { &user.email });
    println!("Roles:    {}", format_roles(user));
    println!("Activo:   {}", if user.active { "Sí" } else { "No" });
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No se encontraron usuarios.");
        return;
    }

    println!();
    println!(
        "{:<6}  {:<12}  {:<24}  {:<28}  {:<28}  {:<6}",
        "ID", "USUARIO", "NOMBRE", "EMAIL", "ROLES", "ACTIVO"
    );
    println!("{}", "-".repeat(114));
    for user in users {
        println!(
            "{:<6}  {:<12}  {:<24}  {:<28}  {:<28}  {:<6}",
            format_id(user.id),
            truncate(&user.username, 12),
            truncate(&user.full_name(), 24),
            truncate(&user.email, 28),
            truncate(&format_roles(user), 28),
            if user.active { "Sí" } else { "No" }
        );
    }
    println!();
}

/// Pagination tabs, 1-based, current page bracketed
fn render_tabs<T>(page: &Page<T>) -> String {
    let current = page.number.min(page.total_pages.saturating_sub(1));
    let tabs: Vec<String> = page
        .window()
        .into_iter()
        .map(|p| {
            if p == current {
                format!("[{}]", p + 1)
            } else {
                (p + 1).to_string()
            }
        })
        .collect();

    let prev = if page.is_first() { " " } else { "<" };
    let next = if page.is_last() { " " } else { ">" };
    format!(
        "{} {} {}   Página {} de {}",
        prev,
        tabs.join(" "),
        next,
        current + 1,
        page.total_pages
    )
}

/// Navigation sections and whether `user` may open them
fn sections(user: &User) -> [(&'static str, bool); 3] {
    [
        ("Gestión de usuarios", user.is_admin()),
        ("Supervisión", user.is_admin() || user.is_supervisor()),
        ("Operación", user.is_admin() || user.is_supervisor() || user.is_empleado()),
    ]
}

fn display_name(user: &User) -> String {
    let full = user.full_name();
    if full.is_empty() {
        user.username.clone()
    } else {
        full
    }
}

/// Navigation-style label: first role, or the generic one
fn primary_role_label(user: &User) -> &'static str {
    roles::label_or_generic(user.roles.first().map(|r| r.name.code()))
}

fn format_roles(user: &User) -> String {
    let labels = roles::user_labels(user);
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    }
}

fn format_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to max characters with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
