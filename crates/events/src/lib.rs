//! `brigade-events` — event abstractions shared across domain modules.
//!
//! Domain crates describe *what happened* as typed events; this crate provides
//! the trait they implement plus the envelope/bus plumbing used to move those
//! events between the store and its consumers.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
