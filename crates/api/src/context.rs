use brigade_auth::{Actor, Role};
use brigade_core::{BranchId, UserId};

/// Branch context for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BranchContext {
    branch_id: BranchId,
}

impl BranchContext {
    pub fn new(branch_id: BranchId) -> Self {
        Self { branch_id }
    }

    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The acting identity as the domain layer sees it.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.roles.clone())
    }
}
