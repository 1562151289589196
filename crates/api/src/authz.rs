//! API-side authorization guard for commands.
//!
//! This enforces the capability table at the request boundary (before
//! dispatch); role-gated transitions are checked again inside the aggregate,
//! so a bug here cannot widen what the domain allows.

use brigade_auth::{Capability, authorize};
use brigade_core::DomainResult;

use crate::context::PrincipalContext;

/// Check that the request's principal holds a capability.
///
/// This is intended to be called **before** dispatching a command.
pub fn authorize_request(principal: &PrincipalContext, capability: Capability) -> DomainResult<()> {
    authorize(principal.roles(), capability)
}
