use serde::{Deserialize, Serialize};

use brigade_core::UserId;

use crate::roles::Role;

/// An authenticated actor: identity plus the roles granted in the active branch.
///
/// Commands that are role-gated carry the acting `Actor` so the decision is
/// auditable in the event stream, not just at the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
