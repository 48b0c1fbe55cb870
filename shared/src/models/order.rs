//! Order Model
//!
//! Pickup, delivery and reservation-linked (party) orders share one table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::reservation::PaymentStatus;

/// Order kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderType {
    #[default]
    Pickup,
    Delivery,
    /// Party order attached to a reservation
    Reservation,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
            Self::Reservation => "reservation",
        }
    }

    /// Minutes until a standalone order is expected to be ready
    pub fn estimated_minutes(&self) -> i64 {
        match self {
            Self::Pickup => 25,
            Self::Delivery => 40,
            Self::Reservation => 0,
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "pick up" | "pick-up" | "takeout" | "take out" => Ok(Self::Pickup),
            "delivery" | "deliver" => Ok(Self::Delivery),
            "reservation" => Ok(Self::Reservation),
            other => Err(format!("Invalid order type: {other}")),
        }
    }
}

/// Kitchen lifecycle
///
/// ```text
/// pending → preparing → ready → completed
///    └──────────┴──→ cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Completed)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Shown on the kitchen board
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Preparing | Self::Ready)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "preparing" | "in progress" | "cooking" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" | "complete" | "done" | "picked up" | "delivered" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("Invalid status: {other}")),
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub reservation_id: Option<i64>,
    /// Party member name, or the customer for standalone orders
    pub person_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub target_date: Option<String>,
    pub target_time: Option<String>,
    pub special_instructions: Option<String>,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub payment_amount: Option<f64>,
    pub payment_date: Option<i64>,
    pub confirmation_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.is_paid()
    }
}

/// Line item. `price_at_time` is the menu price when the line was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i32,
    pub price_at_time: f64,
    pub notes: Option<String>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Item reference in a create payload: by menu id or by (fuzzy) name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Create pickup/delivery order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    #[serde(default)]
    pub order_type: OrderType,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub target_date: Option<String>,
    pub target_time: Option<String>,
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

/// Response for a newly created standalone order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    #[serde(flatten)]
    pub detail: OrderDetail,
    /// Minutes until ready (25 pickup, 40 delivery)
    pub estimated_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// List filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub date: Option<String>,
    pub phone: Option<String>,
}

/// Kitchen board query: one service window on one date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KitchenQuery {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Active orders grouped by kitchen column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KitchenBoard {
    pub date: String,
    pub pending: Vec<OrderDetail>,
    pub preparing: Vec<OrderDetail>,
    pub ready: Vec<OrderDetail>,
}
