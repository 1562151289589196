use serde::{Deserialize, Serialize};

/// Classification of a purchase order, driving which approval queue it enters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Regular,
    Additional,
    Emergency,
}

impl OrderKind {
    pub const ALL: [OrderKind; 3] = [OrderKind::Regular, OrderKind::Additional, OrderKind::Emergency];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Regular => "regular",
            OrderKind::Additional => "additional",
            OrderKind::Emergency => "emergency",
        }
    }
}

impl core::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Draft,
    PendingManagerApproval,
    Approved,
    Committed,
    PartiallyReceived,
    Received,
    Incomplete,
    Rejected,
}

impl OrderState {
    pub const ALL: [OrderState; 8] = [
        OrderState::Draft,
        OrderState::PendingManagerApproval,
        OrderState::Approved,
        OrderState::Committed,
        OrderState::PartiallyReceived,
        OrderState::Received,
        OrderState::Incomplete,
        OrderState::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::PendingManagerApproval => "pending_manager_approval",
            OrderState::Approved => "approved",
            OrderState::Committed => "committed",
            OrderState::PartiallyReceived => "partially_received",
            OrderState::Received => "received",
            OrderState::Incomplete => "incomplete",
            OrderState::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for OrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval-side status, tracked alongside the lifecycle state.
///
/// Both fields move together: a single applied transition updates the pair
/// atomically.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::NotSubmitted => "not_submitted",
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
