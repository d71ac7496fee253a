//! User and role models.
//!
//! Roles reach us in two shapes: the login endpoint of older backends sends bare
//! codes (`["ROLE_ADMIN"]`), the current one sends objects
//! (`[{"id": 1, "name": "ROLE_ADMIN", "activo": true}]`). Both are decoded by
//! [`WireRole`] and nowhere else.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The fixed set of roles known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleName {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_SUPERVISOR")]
    Supervisor,
    #[serde(rename = "ROLE_EMPLEADO")]
    Empleado,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::Admin,
        RoleName::User,
        RoleName::Supervisor,
        RoleName::Empleado,
    ];

    /// Wire code, e.g. `ROLE_ADMIN`
    pub fn code(&self) -> &'static str {
        match self {
            RoleName::Admin => "ROLE_ADMIN",
            RoleName::User => "ROLE_USER",
            RoleName::Supervisor => "ROLE_SUPERVISOR",
            RoleName::Empleado => "ROLE_EMPLEADO",
        }
    }

    /// Display label shown to operators
    pub fn label(&self) -> &'static str {
        match self {
            RoleName::Admin => "Administrador",
            RoleName::User => "Usuario",
            RoleName::Supervisor => "Supervisor",
            RoleName::Empleado => "Empleado",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for RoleName {
    type Err = String;

    /// Accepts `ROLE_ADMIN` as well as `ADMIN`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let short = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match short {
            "ADMIN" => Ok(RoleName::Admin),
            "USER" => Ok(RoleName::User),
            "SUPERVISOR" => Ok(RoleName::Supervisor),
            "EMPLEADO" => Ok(RoleName::Empleado),
            _ => Err(format!("Rol desconocido: {}", s)),
        }
    }
}

/// A role granted to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: RoleName,
    pub active: bool,
}

impl Role {
    pub fn new(name: RoleName) -> Self {
        Self {
            id: None,
            name,
            active: true,
        }
    }
}

/// A role as it appears on the wire: either a bare code or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireRole {
    Code(String),
    Object {
        #[serde(default, deserialize_with = "deserialize_id")]
        id: Option<i64>,
        name: String,
        #[serde(default, alias = "activo")]
        active: Option<bool>,
    },
}

impl WireRole {
    /// Raw role identifier regardless of shape
    pub fn name(&self) -> &str {
        match self {
            WireRole::Code(code) => code,
            WireRole::Object { name, .. } => name,
        }
    }

    /// Resolve into a known role. Unknown codes yield `None`.
    pub fn into_role(self) -> Option<Role> {
        let (id, name, active) = match self {
            WireRole::Code(code) => (None, code, None),
            WireRole::Object { id, name, active } => (id, name, active),
        };

        match name.parse::<RoleName>() {
            Ok(role_name) => Some(Role {
                id,
                name: role_name,
                active: active.unwrap_or(true),
            }),
            Err(_) => {
                warn!(role = %name, "Ignoring unrecognized role");
                None
            }
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireRole::deserialize(deserializer)?;
        let name = wire.name().to_string();
        wire.into_role()
            .ok_or_else(|| serde::de::Error::custom(format!("unknown role: {}", name)))
    }
}

/// An administration user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub lastname: String,
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub email: String,
    /// Always empty; never read from or written to the wire.
    #[serde(skip)]
    pub password: String,
    #[serde(default, deserialize_with = "deserialize_roles")]
    pub roles: Vec<Role>,
    #[serde(default = "default_active", deserialize_with = "deserialize_active")]
    pub active: bool,
}

impl User {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.iter().any(|r| r.name == role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(RoleName::Admin)
    }

    pub fn is_supervisor(&self) -> bool {
        self.has_role(RoleName::Supervisor)
    }

    pub fn is_empleado(&self) -> bool {
        self.has_role(RoleName::Empleado)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.lastname).trim().to_string()
    }
}

/// Body sent to the admin create/update endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<super::RoleRef>,
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_active<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Roles list: `null` is empty, unknown codes are dropped, duplicates collapse.
fn deserialize_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
    let wire: Option<Vec<WireRole>> = Option::deserialize(deserializer)?;
    let mut roles: Vec<Role> = Vec::new();
    for role in wire.unwrap_or_default().into_iter().filter_map(WireRole::into_role) {
        if !roles.iter().any(|r| r.name == role.name) {
            roles.push(role);
        }
    }
    Ok(roles)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

/// Ids arrive as numbers from the backend and as strings from some DTOs.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Number(n)) => Ok(Some(n)),
        Some(IdRepr::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(IdRepr::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", s))),
    }
}
