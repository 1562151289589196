//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// This is a closed taxonomy: every failure the order workflow can produce is
/// one of these. Infrastructure concerns (storage, transport) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The requested status change is not an edge of the lifecycle graph.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The actor's roles do not grant the attempted operation.
    #[error("unauthorized")]
    Unauthorized,

    /// The order changed underneath the caller (compare-and-swap failed).
    #[error("stale state: {0}")]
    StaleState(String),

    /// Reconciliation was attempted on an order with no line items.
    #[error("order has no line items")]
    EmptyOrder,

    /// Lookup by identifier found nothing.
    #[error("not found")]
    NotFound,

    /// Input failed a deterministic validation check.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn stale(msg: impl Into<String>) -> Self {
        Self::StaleState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
