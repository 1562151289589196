//! Disposable branch-scoped read models, rebuilt from the event stream.

pub mod approval_queue;
pub mod orders;
pub mod stock;

pub use approval_queue::{ApprovalCounts, ApprovalQueueService};
pub use orders::{OrderFilter, OrderReadModel, OrdersProjection, Pagination};
pub use stock::{StockOnHandProjection, StockReadModel};
