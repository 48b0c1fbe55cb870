//! Payment payloads
//!
//! Intent creation, web confirmations and the voice pay-verb callback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::reservation::PaymentStatus;

/// What is being paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "id")]
pub enum PaymentTarget {
    Reservation(i64),
    Order(i64),
}

/// POST /api/payments/intent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub reservation_id: Option<i64>,
    pub order_id: Option<i64>,
    /// Dollars; defaults to the current bill
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount: f64,
    pub amount_cents: i64,
    pub currency: String,
}

/// Browser-side confirmation of a reservation payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationPaymentConfirm {
    pub reservation_id: i64,
    pub payment_intent_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
    /// Receipt destination when different from the reservation phone
    pub sms_number: Option<String>,
}

/// Browser-side confirmation of an order payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaymentConfirm {
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub payment_amount: Option<f64>,
    pub sms_number: Option<String>,
}

/// Result of marking a record paid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub target: PaymentTarget,
    /// Reservation or order number
    pub number: String,
    pub confirmation_number: String,
    pub amount: f64,
    pub payment_intent_id: String,
    pub sms_sent: bool,
    /// Present when the receipt SMS could not be delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_warning: Option<String>,
}

/// Polling view of a record's payment fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub payment_status: PaymentStatus,
    pub payment_amount: Option<f64>,
    pub payment_date: Option<i64>,
    pub confirmation_number: Option<String>,
    pub bill_total: f64,
}

/// Gateway webhook event (subset of the Stripe event envelope)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEventData {
    pub object: GatewayIntentObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntentObject {
    pub id: String,
    /// Cents
    pub amount: Option<i64>,
    #[serde(default)]
    pub metadata: Value,
    pub last_payment_error: Option<Value>,
}

/// Voice pay-verb callback envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(default)]
    pub payment: PaymentCallbackBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCallbackBody {
    pub status: Option<String>,
    /// The agent platform sends amounts as strings or numbers
    pub amount: Option<Value>,
    pub description: Option<String>,
    pub payment_processor_id: Option<String>,
    pub transaction_id: Option<String>,
    /// Either an object or a list of `{name, value}` pairs
    #[serde(default)]
    pub parameters: Value,
    pub error: Option<Value>,
}

/// Active voice card-collection session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionInfo {
    pub call_id: String,
    pub target: PaymentTarget,
    pub number: String,
    pub step: String,
    pub started_at: i64,
    pub updated_at: i64,
}
