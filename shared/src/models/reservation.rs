//! Reservation Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::order::{OrderDetail, OrderItemInput};

/// Reservation lifecycle
///
/// `Confirmed → Cancelled`, and cancelled is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ReservationStatus {
    #[default]
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        matches!((self, next), (Self::Confirmed, Self::Cancelled))
    }

    /// Edits, new party orders and payments are only accepted while confirmed
    pub fn accepts_changes(self) -> bool {
        self == Self::Confirmed
    }
}

/// Payment state shared by reservations and orders
///
/// `Unpaid → Paid`, one-way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!((self, next), (Self::Unpaid, Self::Paid))
    }

    pub fn is_paid(self) -> bool {
        self == Self::Paid
    }
}

/// Reservation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    /// Customer-facing 6-digit number
    pub reservation_number: String,
    pub name: String,
    /// E.164
    pub phone_number: String,
    pub party_size: i32,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM (24h)
    pub time: String,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub special_requests: Option<String>,
    /// Free-form context (weather notes, source channel, ...)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub meta_data: Value,
    pub payment_intent_id: Option<String>,
    pub payment_amount: Option<f64>,
    /// Unix millis
    pub payment_date: Option<i64>,
    pub confirmation_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reservation {
    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.is_paid()
    }
}

/// Reservation with party orders and the bill recomputed from item rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub party_orders: Vec<OrderDetail>,
    /// Σ price_at_time × quantity over every party order item
    pub bill_total: f64,
}

/// One party member's pre-order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyOrderInput {
    pub person_name: String,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

/// Create reservation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub name: String,
    pub phone_number: String,
    pub party_size: i32,
    pub date: String,
    pub time: String,
    pub special_requests: Option<String>,
    pub meta_data: Option<Value>,
    #[serde(default)]
    pub party_orders: Vec<PartyOrderInput>,
}

/// Update reservation payload
///
/// `party_orders`, when present, replaces every existing party order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub party_size: Option<i32>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub special_requests: Option<String>,
    pub meta_data: Option<Value>,
    pub party_orders: Option<Vec<PartyOrderInput>>,
}

impl ReservationUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.party_size.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.special_requests.is_none()
            && self.meta_data.is_none()
            && self.party_orders.is_none()
    }
}

/// List / search query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationQuery {
    /// Matches name, phone number or reservation number
    pub search: Option<String>,
    pub date: Option<String>,
    pub status: Option<ReservationStatus>,
}

/// Calendar feed entry (2 hour slot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    /// ISO local datetime `YYYY-MM-DDTHH:MM:00`
    pub start: String,
    pub end: String,
    #[serde(rename = "extendedProps")]
    pub extended_props: CalendarEventProps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventProps {
    pub reservation_number: String,
    pub party_size: i32,
    pub phone_number: String,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub special_requests: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_status_is_one_way() {
        use ReservationStatus::*;
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Confirmed));
        assert!(Confirmed.accepts_changes());
        assert!(!Cancelled.accepts_changes());
    }

    #[test]
    fn test_payment_status_is_one_way() {
        use PaymentStatus::*;
        assert!(Unpaid.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Unpaid));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        let p: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(p, PaymentStatus::Paid);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ReservationUpdate::default().is_empty());
        let update = ReservationUpdate {
            party_size: Some(4),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_create_defaults_party_orders() {
        let json = r#"{"name":"Ann","phone_number":"+15551234567","party_size":2,
            "date":"2030-01-01","time":"19:00"}"#;
        let create: ReservationCreate = serde_json::from_str(json).unwrap();
        assert!(create.party_orders.is_empty());
        assert!(create.meta_data.is_none());
    }
}
