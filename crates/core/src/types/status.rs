//! Order status and its transition rules.
//!
//! ```text
//! Pending ──▶ Processing ──▶ Shipped ──▶ Delivered
//!    │             │            │
//!    └─────────────┴────────────┴──────▶ Cancelled
//! ```
//!
//! `Delivered` and `Cancelled` are terminal. The backend is the authority on
//! which transitions it accepts; [`OrderStatus::classify`] only tells a
//! front-end whether a change is routine so it can ask for confirmation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status name is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct StatusParseError(pub String);

/// Order fulfilment status.
///
/// Serialized with the backend's capitalised names (`"Pending"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// How a status change relates to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// New status equals the current one.
    Unchanged,
    /// Moves forward along Pending → Processing → Shipped → Delivered.
    Advance,
    /// Moves backward along the fulfilment chain.
    Revert,
    /// Cancels a non-terminal order.
    Cancel,
    /// Changes an order that already reached a terminal status.
    FromTerminal,
}

impl Transition {
    /// Whether the change can be applied without an explicit override.
    #[must_use]
    pub const fn is_routine(self) -> bool {
        !matches!(self, Self::FromTerminal)
    }
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Backend name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// No further transition is expected once a terminal status is reached.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position along the fulfilment chain; `None` for `Cancelled`.
    const fn stage(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Classify a change from `self` to `next`.
    #[must_use]
    pub fn classify(self, next: Self) -> Transition {
        if self == next {
            return Transition::Unchanged;
        }
        if self.is_terminal() {
            return Transition::FromTerminal;
        }
        match (self.stage(), next.stage()) {
            (Some(from), Some(to)) if to > from => Transition::Advance,
            (Some(_), Some(_)) => Transition::Revert,
            _ => Transition::Cancel,
        }
    }

    /// The next status along the fulfilment chain, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    /// Case-insensitive, so `shipped` on the command line works.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_classify_forward_chain() {
        assert_eq!(
            OrderStatus::Pending.classify(OrderStatus::Processing),
            Transition::Advance
        );
        assert_eq!(
            OrderStatus::Shipped.classify(OrderStatus::Delivered),
            Transition::Advance
        );
        assert_eq!(
            OrderStatus::Pending.classify(OrderStatus::Delivered),
            Transition::Advance
        );
    }

    #[test]
    fn test_classify_revert_and_cancel() {
        assert_eq!(
            OrderStatus::Shipped.classify(OrderStatus::Pending),
            Transition::Revert
        );
        for from in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert_eq!(from.classify(OrderStatus::Cancelled), Transition::Cancel);
        }
    }

    #[test]
    fn test_any_change_from_terminal_is_not_routine() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for to in OrderStatus::ALL {
                let transition = from.classify(to);
                if from == to {
                    assert_eq!(transition, Transition::Unchanged);
                    assert!(transition.is_routine());
                } else {
                    assert_eq!(transition, Transition::FromTerminal);
                    assert!(!transition.is_routine());
                }
            }
        }
    }

    #[test]
    fn test_next() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Processing));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("Pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_backend_names() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"Processing\"");
        let status: OrderStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }
}
