use core::str::FromStr;

use serde::{Deserialize, Serialize};

use brigade_core::DomainError;

/// Back-office role.
///
/// A closed enumeration: authorization decisions match on these variants and
/// nothing else, so a typo'd role string cannot silently grant or deny access.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Branch staff: drafts and submits orders.
    Staff,
    /// Branch manager: signs off on pending orders.
    Manager,
    /// Purchasing office: commits approved orders to suppliers.
    Purchasing,
    /// Receiving clerk: records deliveries and closes orders out.
    Receiving,
    /// Administrator: every capability.
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Staff,
        Role::Manager,
        Role::Purchasing,
        Role::Receiving,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Purchasing => "purchasing",
            Role::Receiving => "receiving",
            Role::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "purchasing" => Ok(Role::Purchasing),
            "receiving" => Ok(Role::Receiving),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::invalid_id(format!("unknown role: {other}"))),
        }
    }
}
