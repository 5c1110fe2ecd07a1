//! Session identity and roles.

use serde::{Deserialize, Serialize};

/// The role an account holds in the shop.
///
/// The backend reports roles as an `is_staff` boolean. That flag is converted
/// once, by [`Role::from_staff_flag`], and never compared directly elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shops and reviews their own orders.
    Customer,
    /// Manages products, categories and order statuses.
    Staff,
}

impl Role {
    /// Convert the backend's `is_staff` flag.
    #[must_use]
    pub const fn from_staff_flag(is_staff: bool) -> Self {
        if is_staff { Self::Staff } else { Self::Customer }
    }

    /// The backend's `is_staff` flag for this role.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Staff)
    }

    /// Path a session of this role lands on by default.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Staff => "/admin",
            Self::Customer => "/customer/products",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

/// The authenticated identity of the current client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Username as stored by the backend.
    pub username: String,
    /// Role granted by the backend at login.
    pub role: Role,
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Whether the session belongs to a staff member.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}
