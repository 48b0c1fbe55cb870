//! 支付对账
//!
//! Every confirmation source (gateway webhook, browser confirmation, voice
//! pay-verb callback) ends in [`PaymentService::mark_paid`]. The row update
//! is guarded on `payment_status = 'unpaid'`, so a repeated confirmation
//! cannot bill twice. The receipt SMS is best effort.
//!
//! Gateway webhooks are only applied after their signature checks out, and
//! are matched to a record by the intent id we stored when creating it.

use std::sync::{Arc, LazyLock};

use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::{
    GatewayEvent, Order, OrderPaymentConfirm, OrderType, PaymentCallback, PaymentIntentRequest,
    PaymentIntentResponse, PaymentReceipt, PaymentStatus, PaymentStatusView, PaymentTarget,
    Reservation, ReservationPaymentConfirm,
};
use shared::util::{confirmation_number, now_millis};
use sqlx::SqlitePool;

use crate::db::repository::{order, reservation};
use crate::services::money::{from_cents, sum_lines, to_cents, validate_payment_amount};
use crate::services::order_service::db_err;
use crate::services::payment_gateway::{IntentRequest, PaymentGateway};
use crate::services::payment_sessions::PaymentSessions;
use crate::services::receipts::{self, PaidRecord};
use crate::services::sms::SmsSender;
use crate::services::webhook_signature::verify_webhook_signature;
use crate::utils::phone::{mask_phone, normalize_phone};
use crate::utils::{AppError, AppResult};

static RESERVATION_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Reservation #(\d+)").expect("reservation reference pattern"));
static ORDER_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Order #(\d+)").expect("order reference pattern"));

/// What a target still owes
#[derive(Debug, Clone, Serialize)]
pub struct AmountDue {
    pub target: PaymentTarget,
    pub number: String,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub amount: f64,
}

/// Pay-verb callback result, spoken back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    #[serde(flatten)]
    pub receipt: PaymentReceipt,
    pub voice_response: String,
}

/// A record loaded for payment
enum Payable {
    Reservation(Reservation),
    Order(Order),
}

#[derive(Clone)]
pub struct PaymentService {
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
    sms: Arc<dyn SmsSender>,
    sessions: Arc<PaymentSessions>,
    restaurant_name: String,
    timezone: Tz,
    currency: String,
    webhook_secret: Option<String>,
}

impl PaymentService {
    pub fn new(
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        sms: Arc<dyn SmsSender>,
        sessions: Arc<PaymentSessions>,
        restaurant_name: impl Into<String>,
        timezone: Tz,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            gateway,
            sms,
            sessions,
            restaurant_name: restaurant_name.into(),
            timezone,
            currency: currency.into(),
            webhook_secret: None,
        }
    }

    /// Endpoint secret for gateway webhooks; without one every webhook is refused
    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn publishable_key(&self) -> Option<String> {
        self.gateway.publishable_key()
    }

    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }

    pub fn sessions(&self) -> &PaymentSessions {
        &self.sessions
    }

    /// Amount still owed; rejects cancelled and already-paid targets
    pub async fn amount_due(&self, target: PaymentTarget) -> AppResult<AmountDue> {
        let payable = self.load(target).await?;
        ensure_payable(&payable)?;
        match payable {
            Payable::Reservation(r) => {
                let amount = self.reservation_bill(r.id).await?;
                Ok(AmountDue {
                    target,
                    number: r.reservation_number,
                    customer_name: Some(r.name),
                    phone_number: Some(r.phone_number),
                    amount,
                })
            }
            Payable::Order(o) => Ok(AmountDue {
                target,
                number: o.order_number,
                customer_name: o.person_name,
                phone_number: o.customer_phone,
                amount: o.total_amount,
            }),
        }
    }

    /// Payment fields for browser polling
    pub async fn status_view(&self, target: PaymentTarget) -> AppResult<PaymentStatusView> {
        match self.load(target).await? {
            Payable::Reservation(r) => Ok(PaymentStatusView {
                payment_status: r.payment_status,
                payment_amount: r.payment_amount,
                payment_date: r.payment_date,
                confirmation_number: r.confirmation_number,
                bill_total: self.reservation_bill(r.id).await?,
            }),
            Payable::Order(o) => Ok(PaymentStatusView {
                payment_status: o.payment_status,
                payment_amount: o.payment_amount,
                payment_date: o.payment_date,
                confirmation_number: o.confirmation_number,
                bill_total: o.total_amount,
            }),
        }
    }

    /// Create a gateway intent and remember its id on the record
    pub async fn create_intent(&self, req: PaymentIntentRequest) -> AppResult<PaymentIntentResponse> {
        let target = match (req.reservation_id, req.order_id) {
            (Some(id), None) => PaymentTarget::Reservation(id),
            (None, Some(id)) => PaymentTarget::Order(id),
            (Some(_), Some(_)) => {
                return Err(AppError::with_message(
                    ErrorCode::PaymentTargetMissing,
                    "Provide either reservation_id or order_id, not both",
                ));
            }
            (None, None) => return Err(AppError::new(ErrorCode::PaymentTargetMissing)),
        };

        let due = self.amount_due(target).await?;
        let amount = req.amount.unwrap_or(due.amount);
        validate_payment_amount(amount)?;
        let currency = req
            .currency
            .unwrap_or_else(|| self.currency.clone())
            .to_lowercase();

        let (kind, id, label) = match target {
            PaymentTarget::Reservation(id) => ("reservation", id, "Reservation"),
            PaymentTarget::Order(id) => ("order", id, "Order"),
        };
        let request = IntentRequest {
            amount_cents: to_cents(amount),
            currency: currency.clone(),
            description: format!("{} {label} #{}", self.restaurant_name, due.number),
            metadata: vec![
                ("type".into(), kind.into()),
                (format!("{kind}_id"), id.to_string()),
                (format!("{kind}_number"), due.number.clone()),
            ],
        };
        let intent = self.gateway.create_intent(&request).await?;

        let now = now_millis();
        match target {
            PaymentTarget::Reservation(id) => {
                reservation::set_payment_intent(&self.pool, id, &intent.id, now).await?
            }
            PaymentTarget::Order(id) => {
                order::set_payment_intent(&self.pool, id, &intent.id, now).await?
            }
        }

        tracing::info!(
            target: "payment",
            payment_intent_id = %intent.id,
            number = %due.number,
            amount,
            gateway = self.gateway.name(),
            "Payment intent created"
        );
        Ok(PaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount,
            amount_cents: request.amount_cents,
            currency,
        })
    }

    /// The only way a record becomes paid
    ///
    /// `sms_to` overrides the record's phone for the receipt.
    pub async fn mark_paid(
        &self,
        target: PaymentTarget,
        payment_intent_id: &str,
        amount: f64,
        sms_to: Option<&str>,
    ) -> AppResult<PaymentReceipt> {
        let payable = self.load(target).await?;
        ensure_payable(&payable)?;
        validate_payment_amount(amount)?;

        let confirmation = confirmation_number();
        let now = now_millis();
        let updated = match &payable {
            Payable::Reservation(r) => {
                // 预订与其点单同一事务内标记
                let mut tx = self.pool.begin().await.map_err(db_err)?;
                let ok = reservation::mark_paid(
                    &mut tx,
                    r.id,
                    payment_intent_id,
                    amount,
                    &confirmation,
                    now,
                )
                .await?;
                if ok {
                    order::mark_party_orders_paid(&mut tx, r.id, now).await?;
                    tx.commit().await.map_err(db_err)?;
                }
                ok
            }
            Payable::Order(o) => {
                order::mark_paid(&self.pool, o.id, payment_intent_id, amount, &confirmation, now)
                    .await?
            }
        };
        if !updated {
            // 并发回调抢先一步
            let current = self.load(target).await?;
            ensure_payable(&current)?;
            return Err(AppError::conflict("Payment state changed concurrently"));
        }

        let paid = PaidRecord {
            confirmation_number: &confirmation,
            amount,
            payment_date: now,
            payment_intent_id,
        };
        let (number, record_phone, body) = match &payable {
            Payable::Reservation(r) => (
                r.reservation_number.clone(),
                Some(r.phone_number.clone()),
                receipts::reservation_payment(&self.restaurant_name, r, &paid, self.timezone),
            ),
            Payable::Order(o) => (
                o.order_number.clone(),
                o.customer_phone.clone(),
                receipts::order_payment(&self.restaurant_name, o, &paid, self.timezone),
            ),
        };

        tracing::info!(
            target: "payment",
            number = %number,
            confirmation_number = %confirmation,
            payment_intent_id,
            amount,
            "Marked paid"
        );

        let to = normalize_phone(sms_to, record_phone.as_deref());
        let (sms_sent, sms_warning) = match to {
            Some(to) => match self.sms.send(&to, &body).await {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::warn!(
                        target: "payment",
                        number = %number,
                        to = %mask_phone(&to),
                        error = %e,
                        "Receipt SMS failed"
                    );
                    (
                        false,
                        Some(format!(
                            "Payment succeeded with confirmation {confirmation}, but the SMS receipt failed: {}",
                            e.message
                        )),
                    )
                }
            },
            None => (false, Some("No phone number for the SMS receipt".to_string())),
        };

        self.sessions.end_for_number(&number);

        Ok(PaymentReceipt {
            target,
            number,
            confirmation_number: confirmation,
            amount,
            payment_intent_id: payment_intent_id.to_string(),
            sms_sent,
            sms_warning,
        })
    }

    /// Browser confirmation of a reservation payment
    pub async fn confirm_reservation_payment(
        &self,
        data: ReservationPaymentConfirm,
    ) -> AppResult<PaymentReceipt> {
        if data.status != PaymentStatus::Paid {
            return Err(AppError::with_message(
                ErrorCode::PaymentFailed,
                "Payment was not completed",
            ));
        }
        self.mark_paid(
            PaymentTarget::Reservation(data.reservation_id),
            &data.payment_intent_id,
            data.amount,
            data.sms_number.as_deref(),
        )
        .await
    }

    /// Browser confirmation of an order payment
    ///
    /// Intent id and amount default to the stored intent and the order total.
    pub async fn confirm_order_payment(
        &self,
        order_id: i64,
        data: OrderPaymentConfirm,
    ) -> AppResult<PaymentReceipt> {
        if data.payment_status != PaymentStatus::Paid {
            return Err(AppError::with_message(
                ErrorCode::PaymentFailed,
                "Payment was not completed",
            ));
        }
        let Payable::Order(o) = self.load(PaymentTarget::Order(order_id)).await? else {
            return Err(AppError::new(ErrorCode::OrderNotFound));
        };
        let intent_id = data
            .payment_intent_id
            .or(o.payment_intent_id)
            .ok_or_else(|| AppError::new(ErrorCode::PaymentIntentNotFound))?;
        let amount = data.payment_amount.unwrap_or(o.total_amount);
        self.mark_paid(
            PaymentTarget::Order(order_id),
            &intent_id,
            amount,
            data.sms_number.as_deref(),
        )
        .await
    }

    /// Gateway webhook: raw body plus its `Stripe-Signature` header
    ///
    /// Unsigned, forged and stale deliveries fail with
    /// [`ErrorCode::WebhookSignatureInvalid`] before the body is parsed.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<Option<PaymentReceipt>> {
        let rejected = |reason: &'static str| {
            tracing::warn!(target: "payment", reason, "Webhook rejected");
            AppError::with_message(ErrorCode::WebhookSignatureInvalid, reason)
        };
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| rejected("Webhook signing secret is not configured"))?;
        let signature = signature.ok_or_else(|| rejected("Missing Stripe-Signature header"))?;
        verify_webhook_signature(payload, signature, secret).map_err(rejected)?;

        let event: GatewayEvent = serde_json::from_slice(payload).map_err(|e| {
            AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid webhook payload: {e}"))
        })?;
        self.apply_gateway_event(event).await
    }

    /// Apply a verified gateway event
    ///
    /// `Ok(None)` for events that change nothing (failures, unknown types,
    /// unknown intents, repeats of an already applied success).
    async fn apply_gateway_event(&self, event: GatewayEvent) -> AppResult<Option<PaymentReceipt>> {
        let intent = event.data.object;
        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                let Some(target) = self.target_for_intent(&intent.id).await? else {
                    tracing::warn!(
                        target: "payment",
                        payment_intent_id = %intent.id,
                        "Webhook for unknown payment intent"
                    );
                    return Ok(None);
                };
                let amount = match intent.amount {
                    Some(cents) => from_cents(cents),
                    None => self.status_view(target).await?.bill_total,
                };
                match self.mark_paid(target, &intent.id, amount, None).await {
                    Ok(receipt) => Ok(Some(receipt)),
                    Err(e)
                        if matches!(
                            e.code,
                            ErrorCode::ReservationAlreadyPaid | ErrorCode::OrderAlreadyPaid
                        ) =>
                    {
                        tracing::info!(
                            target: "payment",
                            payment_intent_id = %intent.id,
                            "Webhook repeat ignored, already paid"
                        );
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
            "payment_intent.payment_failed" => {
                let reason = intent
                    .last_payment_error
                    .as_ref()
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                tracing::warn!(
                    target: "payment",
                    payment_intent_id = %intent.id,
                    reason,
                    "Payment failed, record left unpaid"
                );
                Ok(None)
            }
            other => {
                tracing::debug!(target: "payment", event_type = other, "Ignoring gateway event");
                Ok(None)
            }
        }
    }

    /// Voice pay-verb callback
    pub async fn handle_pay_callback(&self, callback: PaymentCallback) -> AppResult<CallbackOutcome> {
        let payment = callback.payment;
        let status = payment.status.as_deref().unwrap_or_default();
        let params = &payment.parameters;

        let mut reservation_number = callback_param(params, "reservation_number");
        let mut order_number = callback_param(params, "order_number");
        let order_id = callback_param(params, "order_id").and_then(|v| v.parse::<i64>().ok());
        let mut payment_type =
            callback_param(params, "payment_type").unwrap_or_else(|| "reservation".into());

        if reservation_number.is_none() && order_number.is_none() {
            let description = payment.description.as_deref().unwrap_or_default();
            if let Some(number) = capture_number(&RESERVATION_REF, description) {
                reservation_number = Some(number);
                payment_type = "reservation".into();
            } else if let Some(number) = capture_number(&ORDER_REF, description) {
                order_number = Some(number);
                payment_type = "order".into();
            }
        }

        tracing::info!(
            target: "payment",
            status,
            payment_type = %payment_type,
            reservation_number = ?reservation_number,
            order_number = ?order_number,
            "Pay callback received"
        );

        if status != "success" {
            let reason = payment
                .error
                .as_ref()
                .map(|e| match e {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| format!("payment status '{status}'"));
            tracing::warn!(target: "payment", reason = %reason, "Voice payment failed");
            if let Some(number) = reservation_number.as_deref().or(order_number.as_deref()) {
                self.sessions.set_step_for_number(number, "failed");
            }
            return Err(AppError::with_message(
                ErrorCode::PaymentFailed,
                format!("Payment failed: {reason}"),
            ));
        }

        let (target, number) = if payment_type == "order" {
            let o = match (&order_number, order_id) {
                (Some(number), _) => order::find_by_number(&self.pool, number).await?,
                (None, Some(id)) => order::find_by_id(&self.pool, id).await?,
                (None, None) => None,
            }
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
            (PaymentTarget::Order(o.id), o.order_number)
        } else {
            let number = reservation_number.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::PaymentTargetMissing,
                    "No reservation or order number in payment callback",
                )
            })?;
            let r = reservation::find_by_number(&self.pool, &number)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound))?;
            (PaymentTarget::Reservation(r.id), r.reservation_number)
        };

        let intent_id = payment
            .payment_processor_id
            .or(payment.transaction_id)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("sw_pay_{number}"));
        let amount = match payment.amount.as_ref().and_then(parse_amount) {
            Some(amount) => amount,
            None => self.status_view(target).await?.bill_total,
        };
        let receipt_phone = callback_param(params, "phone_number");

        let receipt = self
            .mark_paid(target, &intent_id, amount, receipt_phone.as_deref())
            .await?;

        let sms_line = if receipt.sms_sent {
            "I've also sent you an SMS receipt with all the details."
        } else {
            "Please write this down for your records."
        };
        let voice_response = format!(
            "Excellent! Your payment of ${:.2} has been processed successfully. \
             Your confirmation number is {}. {sms_line} Thank you for choosing {}!",
            receipt.amount, receipt.confirmation_number, self.restaurant_name
        );
        Ok(CallbackOutcome {
            receipt,
            voice_response,
        })
    }

    async fn load(&self, target: PaymentTarget) -> AppResult<Payable> {
        match target {
            PaymentTarget::Reservation(id) => reservation::find_by_id(&self.pool, id)
                .await?
                .map(Payable::Reservation)
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::ReservationNotFound,
                        format!("Reservation {id} not found"),
                    )
                }),
            PaymentTarget::Order(id) => order::find_by_id(&self.pool, id)
                .await?
                .map(Payable::Order)
                .ok_or_else(|| {
                    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                }),
        }
    }

    async fn reservation_bill(&self, id: i64) -> AppResult<f64> {
        let lines = reservation::bill_lines(&self.pool, id).await?;
        Ok(sum_lines(lines))
    }

    /// Record holding this intent id; event metadata is never trusted for lookup
    async fn target_for_intent(&self, intent_id: &str) -> AppResult<Option<PaymentTarget>> {
        if let Some(r) = reservation::find_by_intent_id(&self.pool, intent_id).await? {
            return Ok(Some(PaymentTarget::Reservation(r.id)));
        }
        Ok(order::find_by_intent_id(&self.pool, intent_id)
            .await?
            .map(|o| PaymentTarget::Order(o.id)))
    }
}

fn ensure_payable(payable: &Payable) -> AppResult<()> {
    match payable {
        Payable::Reservation(r) if r.is_cancelled() => Err(AppError::with_message(
            ErrorCode::ReservationCancelled,
            format!("Reservation {} is cancelled", r.reservation_number),
        )),
        Payable::Reservation(r) if r.is_paid() => Err(AppError::with_message(
            ErrorCode::ReservationAlreadyPaid,
            format!("Reservation {} is already paid", r.reservation_number),
        )
        .with_detail("confirmation_number", r.confirmation_number.clone())),
        Payable::Order(o)
            if o.reservation_id.is_some() || o.order_type == OrderType::Reservation =>
        {
            Err(AppError::business_rule(format!(
                "Order {} is part of a reservation; pay the reservation bill instead",
                o.order_number
            )))
        }
        Payable::Order(o) if o.is_cancelled() => Err(AppError::with_message(
            ErrorCode::OrderCancelled,
            format!("Order {} is cancelled", o.order_number),
        )),
        Payable::Order(o) if o.is_paid() => Err(AppError::with_message(
            ErrorCode::OrderAlreadyPaid,
            format!("Order {} is already paid", o.order_number),
        )
        .with_detail("confirmation_number", o.confirmation_number.clone())),
        _ => Ok(()),
    }
}

/// Read a callback parameter given as an object or a `[{name, value}]` list
fn callback_param(params: &Value, key: &str) -> Option<String> {
    let value = match params {
        Value::Object(map) => map.get(key),
        Value::Array(list) => list
            .iter()
            .find(|p| p.get("name").and_then(Value::as_str) == Some(key))
            .and_then(|p| p.get("value")),
        _ => None,
    }?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|caps| caps[1].to_string())
}

fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::seed::seed_menu_if_empty;
    use crate::services::menu_service::MenuService;
    use crate::services::order_service::OrderService;
    use crate::services::payment_gateway::OfflineGateway;
    use crate::services::reservation_service::ReservationService;
    use crate::services::sms::RecordingSms;
    use serde_json::json;
    use crate::services::webhook_signature::sign_payload;
    use shared::models::{OrderItemInput, PartyOrderInput, ReservationCreate, ReservationDetail};

    const WEBHOOK_SECRET: &str = "whsec_test";

    struct Fixture {
        payments: PaymentService,
        reservations: ReservationService,
        sms: Arc<RecordingSms>,
    }

    async fn fixture_with(sms: RecordingSms) -> Fixture {
        let db = DbService::in_memory().await.unwrap();
        seed_menu_if_empty(&db.pool).await.unwrap();
        let menu = MenuService::new(db.pool.clone());
        let orders = OrderService::new(db.pool.clone(), menu.clone());
        let reservations = ReservationService::new(db.pool.clone(), menu, orders);
        let sms = Arc::new(sms);
        let payments = PaymentService::new(
            db.pool,
            Arc::new(OfflineGateway),
            sms.clone(),
            Arc::new(PaymentSessions::new()),
            "The Bistro",
            chrono_tz::America::New_York,
            "usd",
        )
        .with_webhook_secret(Some(WEBHOOK_SECRET.into()));
        Fixture {
            payments,
            reservations,
            sms,
        }
    }

    async fn booked(f: &Fixture) -> Reservation {
        booked_detail(f).await.reservation
    }

    async fn booked_detail(f: &Fixture) -> ReservationDetail {
        f.reservations
            .create(ReservationCreate {
                name: "Ann Lee".into(),
                phone_number: "555-123-4567".into(),
                party_size: 2,
                date: "2030-06-01".into(),
                time: "19:00".into(),
                special_requests: None,
                meta_data: None,
                party_orders: vec![PartyOrderInput {
                    person_name: "Ann".into(),
                    items: vec![OrderItemInput {
                        menu_item_id: None,
                        name: Some("Affogato".into()),
                        quantity: 2,
                        notes: None,
                    }],
                }],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mark_paid_once_only() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        let target = PaymentTarget::Reservation(r.id);

        let receipt = f.payments.mark_paid(target, "pi_1", 14.0, None).await.unwrap();
        assert!(receipt.confirmation_number.starts_with("CONF-"));
        assert_eq!(receipt.confirmation_number.len(), 13);
        assert!(receipt.sms_sent);
        assert_eq!(f.sms.sent()[0].0, "+15551234567");

        let err = f.payments.mark_paid(target, "pi_2", 14.0, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationAlreadyPaid);

        let view = f.payments.status_view(target).await.unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Paid);
        assert_eq!(view.confirmation_number.as_deref(), Some(receipt.confirmation_number.as_str()));
    }

    #[tokio::test]
    async fn test_cancelled_reservation_cannot_be_paid() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        f.reservations.cancel(r.id).await.unwrap();
        let err = f
            .payments
            .amount_due(PaymentTarget::Reservation(r.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationCancelled);
    }

    #[tokio::test]
    async fn test_sms_failure_is_a_warning() {
        let f = fixture_with(RecordingSms::failing()).await;
        let r = booked(&f).await;
        let receipt = f
            .payments
            .mark_paid(PaymentTarget::Reservation(r.id), "pi_1", 14.0, None)
            .await
            .unwrap();
        assert!(!receipt.sms_sent);
        assert!(receipt.sms_warning.is_some());
    }

    #[tokio::test]
    async fn test_intent_defaults_to_bill_and_webhook_marks_paid() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;

        let intent = f
            .payments
            .create_intent(PaymentIntentRequest {
                reservation_id: Some(r.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(intent.amount_cents, 1400);
        assert_eq!(intent.currency, "usd");

        let event: GatewayEvent = serde_json::from_value(json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": intent.payment_intent_id, "amount": 1400}}
        }))
        .unwrap();
        let receipt = f.payments.apply_gateway_event(event.clone()).await.unwrap();
        assert_eq!(receipt.unwrap().amount, 14.0);

        // 重复 webhook
        assert!(f.payments.apply_gateway_event(event).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_party_order_is_paid_through_its_reservation() {
        let f = fixture_with(RecordingSms::new()).await;
        let detail = booked_detail(&f).await;
        let party_order = PaymentTarget::Order(detail.party_orders[0].order.id);

        let err = f
            .payments
            .mark_paid(party_order, "pi_direct", 14.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRuleViolation);
        let err = f
            .payments
            .create_intent(PaymentIntentRequest {
                order_id: Some(detail.party_orders[0].order.id),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessRuleViolation);

        // 预订账单仍然完整未付，且只能付一次
        let reservation = PaymentTarget::Reservation(detail.reservation.id);
        let due = f.payments.amount_due(reservation).await.unwrap();
        assert_eq!(due.amount, 14.0);
        f.payments.mark_paid(reservation, "pi_1", 14.0, None).await.unwrap();

        // 点单随预订一起标记
        let view = f.payments.status_view(party_order).await.unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Paid);
        assert!(f.payments.mark_paid(party_order, "pi_2", 14.0, None).await.is_err());
    }

    #[tokio::test]
    async fn test_party_order_of_cancelled_reservation_cannot_be_paid() {
        let f = fixture_with(RecordingSms::new()).await;
        let detail = booked_detail(&f).await;
        f.reservations.cancel(detail.reservation.id).await.unwrap();

        let party_order = PaymentTarget::Order(detail.party_orders[0].order.id);
        assert!(f.payments.amount_due(party_order).await.is_err());
        assert!(f.payments.mark_paid(party_order, "pi_1", 14.0, None).await.is_err());
        let view = f.payments.status_view(party_order).await.unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_webhook_requires_valid_signature() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        let intent = f
            .payments
            .create_intent(PaymentIntentRequest {
                reservation_id: Some(r.id),
                ..Default::default()
            })
            .await
            .unwrap();
        let body = json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": intent.payment_intent_id, "amount": 1400}}
        })
        .to_string();
        let now = chrono::Utc::now().timestamp();

        let err = f.payments.handle_webhook(body.as_bytes(), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);

        let forged = sign_payload(body.as_bytes(), "whsec_guess", now).unwrap();
        let err = f
            .payments
            .handle_webhook(body.as_bytes(), Some(&forged))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
        let view = f.payments.status_view(PaymentTarget::Reservation(r.id)).await.unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Unpaid);

        let signed = sign_payload(body.as_bytes(), WEBHOOK_SECRET, now).unwrap();
        let receipt = f
            .payments
            .handle_webhook(body.as_bytes(), Some(&signed))
            .await
            .unwrap();
        assert_eq!(receipt.unwrap().amount, 14.0);
    }

    #[tokio::test]
    async fn test_webhook_without_secret_is_refused() {
        let f = fixture_with(RecordingSms::new()).await;
        let payments = f.payments.clone().with_webhook_secret(None);
        let body = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_x"}}}"#;
        let signed = sign_payload(body, WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap();
        let err = payments.handle_webhook(body, Some(&signed)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WebhookSignatureInvalid);
    }

    #[tokio::test]
    async fn test_webhook_ignores_metadata_for_unknown_intent() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        // 签名有效，但 intent 不是我们创建的
        let event: GatewayEvent = serde_json::from_value(json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_not_ours",
                "amount": 1,
                "metadata": {"reservation_id": r.id.to_string()}
            }}
        }))
        .unwrap();
        assert!(f.payments.apply_gateway_event(event).await.unwrap().is_none());
        let view = f.payments.status_view(PaymentTarget::Reservation(r.id)).await.unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_reference_patterns_capture_numbers() {
        assert_eq!(
            capture_number(&RESERVATION_REF, "The Bistro Reservation #123456").as_deref(),
            Some("123456")
        );
        assert_eq!(capture_number(&ORDER_REF, "Order #654321 pickup").as_deref(), Some("654321"));
        assert_eq!(capture_number(&ORDER_REF, "Reservation #123456"), None);
    }

    #[tokio::test]
    async fn test_intent_requires_a_target() {
        let f = fixture_with(RecordingSms::new()).await;
        let err = f
            .payments
            .create_intent(PaymentIntentRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentTargetMissing);
    }

    #[tokio::test]
    async fn test_pay_callback_reads_description_fallback() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        let callback: PaymentCallback = serde_json::from_value(json!({
            "payment": {
                "status": "success",
                "amount": "14.00",
                "description": format!("The Bistro Reservation #{}", r.reservation_number),
                "parameters": [{"name": "phone_number", "value": "+15559876543"}]
            }
        }))
        .unwrap();
        let outcome = f.payments.handle_pay_callback(callback).await.unwrap();
        assert_eq!(outcome.receipt.payment_intent_id, format!("sw_pay_{}", r.reservation_number));
        assert_eq!(outcome.receipt.amount, 14.0);
        assert!(outcome.voice_response.contains(&outcome.receipt.confirmation_number));
        assert_eq!(f.sms.sent()[0].0, "+15559876543");
    }

    #[tokio::test]
    async fn test_pay_callback_error_leaves_unpaid() {
        let f = fixture_with(RecordingSms::new()).await;
        let r = booked(&f).await;
        let callback: PaymentCallback = serde_json::from_value(json!({
            "payment": {
                "status": "error",
                "error": "card declined",
                "parameters": {"reservation_number": r.reservation_number}
            }
        }))
        .unwrap();
        let err = f.payments.handle_pay_callback(callback).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentFailed);

        let view = f
            .payments
            .status_view(PaymentTarget::Reservation(r.id))
            .await
            .unwrap();
        assert_eq!(view.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_callback_param_shapes() {
        let object = json!({"order_number": "123456", "order_id": 42});
        assert_eq!(callback_param(&object, "order_number").as_deref(), Some("123456"));
        assert_eq!(callback_param(&object, "order_id").as_deref(), Some("42"));

        let list = json!([{"name": "payment_type", "value": "order"}]);
        assert_eq!(callback_param(&list, "payment_type").as_deref(), Some("order"));
        assert_eq!(callback_param(&list, "missing"), None);
        assert_eq!(callback_param(&Value::Null, "x"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(&json!(42.5)), Some(42.5));
        assert_eq!(parse_amount(&json!("$42.50")), Some(42.5));
        assert_eq!(parse_amount(&json!("n/a")), None);
    }
}
