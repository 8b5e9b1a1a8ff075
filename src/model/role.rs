use strum_macros::{Display, EnumString};

/// Supervisory roles. Owners see every branch, admins only the one they belong to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Owner = 1,
    Admin = 2,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Owner),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}
