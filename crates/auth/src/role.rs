use serde::{Deserialize, Serialize};

/// Access tier of a user.
///
/// The wire encoding is numeric (`0` = user, `1` = admin) to stay compatible
/// with existing token payloads; inside the codebase the role is always this
/// enum, never a raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::User),
            1 => Ok(Role::Admin),
            other => Err(format!("unknown role value {other}")),
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        match role {
            Role::User => 0,
            Role::Admin => 1,
        }
    }
}
