//! Event publishing/subscription abstraction.
//!
//! The bus moves events that are already persisted: the command path appends
//! to the store first and publishes second, so a failed publication can be
//! retried without losing a fact. Delivery is at-least-once; everything that
//! consumes a subscription (projections, handlers) must therefore tolerate
//! replays. Ordering guarantees, if any, come from the implementation.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// One consumer's view of the bus.
///
/// Every subscription receives its own copy of each published message
/// (broadcast semantics). The expected consumption shape is a single thread
/// looping on `recv`/`recv_timeout`, checking for shutdown when a timeout
/// fires.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered, without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = M> + '_ {
        self.receiver.try_iter()
    }
}

/// Domain-agnostic event bus (pub/sub).
///
/// Implementations must be shareable across threads. `publish` may fail (a
/// full or poisoned transport); because events are persisted before they are
/// published, the caller can always retry.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
