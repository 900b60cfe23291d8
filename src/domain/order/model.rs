//! Order domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Food preparation status. Advances monotonically:
/// pending → cooking → ready → picked_up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodStatus {
    Pending,
    Cooking,
    Ready,
    PickedUp,
}

impl FoodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cooking => "cooking",
            Self::Ready => "ready",
            Self::PickedUp => "picked_up",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "cooking" => Some(Self::Cooking),
            "ready" => Some(Self::Ready),
            "picked_up" => Some(Self::PickedUp),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Cooking => 1,
            Self::Ready => 2,
            Self::PickedUp => 3,
        }
    }

    /// Whether moving to `next` respects the monotonic lifecycle.
    /// Re-setting the current status is allowed (idempotent retries).
    pub fn can_advance_to(&self, next: FoodStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for FoodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Food order placed together with a charger reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    /// Recomputed on lateness reports.
    pub customer_eta: DateTime<Utc>,
    pub food_status: FoodStatus,
}

/// Fields for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub total_price: f64,
    pub customer_eta: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advances_monotonically() {
        assert!(FoodStatus::Pending.can_advance_to(FoodStatus::Cooking));
        assert!(FoodStatus::Cooking.can_advance_to(FoodStatus::Ready));
        assert!(FoodStatus::Ready.can_advance_to(FoodStatus::PickedUp));
        assert!(FoodStatus::Pending.can_advance_to(FoodStatus::PickedUp));
    }

    #[test]
    fn status_never_regresses() {
        assert!(!FoodStatus::Cooking.can_advance_to(FoodStatus::Pending));
        assert!(!FoodStatus::PickedUp.can_advance_to(FoodStatus::Ready));
    }

    #[test]
    fn resetting_current_status_is_allowed() {
        assert!(FoodStatus::Cooking.can_advance_to(FoodStatus::Cooking));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            FoodStatus::Pending,
            FoodStatus::Cooking,
            FoodStatus::Ready,
            FoodStatus::PickedUp,
        ] {
            assert_eq!(FoodStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(FoodStatus::from_str("burnt"), None);
    }
}
