use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub role: String,
    pub username: Option<String>,
    pub full_name: String,
    pub avatar_url: String,
    pub website: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Integer minor units.
    pub price: i64,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a product at order time. Later product edits or deletions
/// never change it.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct LoginRecord {
    pub id: Uuid,
    pub username: String,
    pub login_success: bool,
    pub login_time: DateTime<Utc>,
}

/// Order lifecycle. Stored as TEXT; parsed at the boundary so transition
/// checks work on the enum, not on raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// pending → paid|cancelled, paid → shipped|cancelled,
    /// shipped → completed|cancelled; completed and cancelled are terminal.
    pub fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Paid, Cancelled)
                | (Shipped, Completed)
                | (Shipped, Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn parses_all_five_statuses() {
        for s in ["pending", "paid", "shipped", "completed", "cancelled"] {
            let status = OrderStatus::parse(s).expect("known status");
            assert_eq!(status.as_str(), s);
        }
        assert!(OrderStatus::parse("refunded").is_none());
        assert!(OrderStatus::parse("PENDING").is_none());
    }

    #[test]
    fn allows_forward_and_cancel_transitions() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Paid.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Completed));
        assert!(Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn rejects_backward_and_terminal_transitions() {
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Completed));
        for from in [Completed, Cancelled] {
            for to in [Pending, Paid, Shipped, Completed, Cancelled] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for s in [Pending, Paid, Shipped] {
            assert!(!s.can_transition_to(s));
        }
    }
}
