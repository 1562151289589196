//! Receiving reconciler: decide completion status from received quantities.

use brigade_core::{DomainError, DomainResult};

use crate::order::OrderItem;

/// Outcome of comparing received against ordered quantities.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Every line is fully covered.
    Received,
    /// Every line has seen a delivery but at least one is short.
    Incomplete,
    /// At least one line is still pending its first delivery.
    Unchanged,
}

/// Reconcile an order's line items.
///
/// An order with zero line items cannot be reconciled; that case is rejected
/// with `EmptyOrder` rather than silently marked received.
pub fn reconcile(items: &[OrderItem]) -> DomainResult<Reconciliation> {
    if items.is_empty() {
        return Err(DomainError::EmptyOrder);
    }

    if items.iter().all(|i| i.received >= i.ordered) {
        return Ok(Reconciliation::Received);
    }

    // A line that has never seen a delivery keeps the order open.
    if items.iter().all(|i| i.received > 0) {
        return Ok(Reconciliation::Incomplete);
    }

    Ok(Reconciliation::Unchanged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_core::ProductId;

    fn item(line_no: u32, ordered: i64, received: i64) -> OrderItem {
        OrderItem {
            line_no,
            product_id: ProductId::new(),
            ordered,
            received,
        }
    }

    #[test]
    fn fully_covered_order_is_received() {
        assert_eq!(reconcile(&[item(1, 5, 5)]), Ok(Reconciliation::Received));
        assert_eq!(
            reconcile(&[item(1, 5, 5), item(2, 3, 3)]),
            Ok(Reconciliation::Received)
        );
    }

    #[test]
    fn short_delivery_with_all_lines_started_is_incomplete() {
        assert_eq!(reconcile(&[item(1, 5, 2)]), Ok(Reconciliation::Incomplete));
        assert_eq!(
            reconcile(&[item(1, 5, 5), item(2, 4, 1)]),
            Ok(Reconciliation::Incomplete)
        );
    }

    #[test]
    fn untouched_line_leaves_status_unchanged() {
        assert_eq!(
            reconcile(&[item(1, 5, 5), item(2, 4, 0)]),
            Ok(Reconciliation::Unchanged)
        );
        assert_eq!(reconcile(&[item(1, 5, 0)]), Ok(Reconciliation::Unchanged));
    }

    #[test]
    fn empty_order_is_rejected() {
        assert_eq!(reconcile(&[]), Err(DomainError::EmptyOrder));
    }
}
