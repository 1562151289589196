//! `brigade-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Roles and
//! capabilities are closed enumerations; the grant table is a pure function.

pub mod capability;
pub mod claims;
pub mod principal;
pub mod roles;

pub use capability::{Capability, authorize, grants};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use principal::Actor;
pub use roles::Role;
