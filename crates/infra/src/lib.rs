//! `brigade-infra` — infrastructure for the back office.
//!
//! Composition of the domain crates with storage and distribution mechanics:
//! the append-only event store, the command dispatch pipeline, and the
//! branch-scoped read models (orders, approval queues, stock on hand).

pub mod command_dispatcher;
pub mod event_store;
pub mod projections;
pub mod read_model;

#[cfg(test)]
mod integration_tests;

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use read_model::{BranchStore, InMemoryBranchStore};
