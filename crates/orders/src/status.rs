//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// The supported workflow is:
/// ```text
/// Pending ──► Confirmed ──► Cancelled
///    │                          ▲
///    └──────────────────────────┘
/// ```
/// `Shipped` and `Delivered` are reachable only through the administrative
/// status override, which does not consult the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Set at creation, before stock reduction has been attempted.
    #[default]
    Pending,

    /// Set by the orchestrator after the stock-reduction attempts.
    Confirmed,

    /// Fulfilment handed to the carrier. Admin-set only.
    Shipped,

    /// Received by the customer. Admin-set only.
    Delivered,

    /// Terminal state reached through the guarded cancel (or the override).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the guarded cancel transition is allowed from this
    /// status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns the status name as used on the wire and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from its wire name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "CONFIRMED" => Some(OrderStatus::Confirmed),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
