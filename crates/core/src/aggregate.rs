//! Aggregate root traits for the event-sourced domain modules.

use crate::error::{DomainError, DomainResult};

/// Minimal interface every aggregate root exposes.
///
/// Deliberately thin: the domain crates own how state evolves; this trait
/// only pins down identity and versioning so the infrastructure can store
/// and reload them uniformly.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Version of the aggregate's state; grows by one per applied event, so
    /// it doubles as the stream revision.
    fn version(&self) -> u64;
}

/// Compare-and-swap expectation for an aggregate stream.
///
/// A writer states the version it observed before deciding; the store refuses
/// the append when the stream has moved on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (idempotent commands, migrations).
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::stale(format!(
                "compare-and-swap failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Pure decide/evolve split for an event-sourced aggregate.
///
/// `handle` decides which events a command produces without touching state;
/// `apply` evolves state from one event. Neither may perform IO, and both
/// must be deterministic — the dispatcher replays `apply` over the stored
/// stream to rebuild state before every decision.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event, advancing `version()` by
    /// one.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events to emit for a command against the current state.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
