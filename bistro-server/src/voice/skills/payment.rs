//! 语音支付
//!
//! `get_card_details` quotes the amount; `pay_reservation` / `pay_order`
//! open a payment session and hand the call to the platform's `pay` verb.
//! The result arrives later at `/api/signalwire/payment-callback`.

use shared::error::ErrorCode;
use shared::models::PaymentTarget;

use crate::core::ServerState;
use crate::services::money::validate_payment_amount;
use crate::utils::phone::{extract_number, normalize_phone};
use crate::utils::{AppError, AppResult};
use crate::voice::skills::SkillResult;
use crate::voice::swaig::{Args, FunctionResult, PayRequest, SwaigRequest};

pub async fn get_card_details(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let target = if args.str("order_number").is_some() {
        order_target(state, req, args).await?
    } else {
        match reservation_target(state, req, args).await {
            Ok(target) => target,
            Err(e) if e.code == ErrorCode::PaymentTargetMissing => order_target(state, req, args).await?,
            Err(e) => return Err(e),
        }
    };
    let due = state.payments.amount_due(target).await?;
    if due.amount <= 0.0 {
        return Err(nothing_due(kind(target), &due.number));
    }
    let name = due
        .customer_name
        .as_deref()
        .map(|n| format!(" under {n}"))
        .unwrap_or_default();
    let response = format!(
        "The total for {} {}{name} is ${:.2}. Would you like to pay that now by card?",
        kind(target),
        due.number,
        due.amount
    );
    Ok(FunctionResult::new(response).add_action("payment_data", &due))
}

pub async fn pay_reservation(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let target = reservation_target(state, req, args).await?;
    start_payment(state, req, target, args.str("phone_number")).await
}

pub async fn pay_order(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let target = order_target(state, req, args).await?;
    start_payment(state, req, target, args.str("phone_number")).await
}

/// Open a session for this call and attach the `pay` action
pub(crate) async fn start_payment(
    state: &ServerState,
    req: &SwaigRequest,
    target: PaymentTarget,
    phone: Option<String>,
) -> AppResult<FunctionResult> {
    let due = state.payments.amount_due(target).await?;
    let kind = kind(target);
    if due.amount <= 0.0 {
        return Err(nothing_due(kind, &due.number));
    }
    validate_payment_amount(due.amount)?;

    let receipt_phone = normalize_phone(phone.as_deref(), due.phone_number.as_deref())
        .or_else(|| normalize_phone(req.caller_phone().as_deref(), None));
    let mut parameters = vec![
        (format!("{kind}_number"), due.number.clone()),
        ("payment_type".to_string(), kind.to_string()),
    ];
    if let Some(p) = &receipt_phone {
        parameters.push(("phone_number".to_string(), p.clone()));
    }
    if let Some(n) = &due.customer_name {
        parameters.push(("customer_name".to_string(), n.clone()));
    }

    let label = match target {
        PaymentTarget::Reservation(_) => "Reservation",
        PaymentTarget::Order(_) => "Order",
    };
    let pay = PayRequest {
        payment_connector_url: state.config.signalwire.payment_connector_url.clone(),
        charge_amount: format!("{:.2}", due.amount),
        currency: state.config.stripe.currency.clone(),
        description: format!("{} {label} #{}", state.config.restaurant_name, due.number),
        parameters,
    };

    state.payment_sessions.start(req.call_id(), target, &due.number);
    tracing::info!(
        target: "payment",
        call_id = req.call_id(),
        number = %due.number,
        amount = due.amount,
        "Voice payment started"
    );

    let response = format!(
        "I'll collect your card details now for the ${:.2} payment on {kind} {}. \
         Please enter your card number using your phone's keypad.",
        due.amount, due.number
    );
    Ok(FunctionResult::new(response)
        .add_action("payment_data", &due)
        .pay(&pay))
}

async fn reservation_target(state: &ServerState, req: &SwaigRequest, args: &Args) -> AppResult<PaymentTarget> {
    if let Some(raw) = args.str("reservation_number") {
        let number = six_digits(&raw)?;
        let detail = state.reservations.find_by_number(&number).await?;
        return Ok(PaymentTarget::Reservation(detail.reservation.id));
    }
    if let Some(phone) = normalize_phone(args.str("phone_number").as_deref(), req.caller_phone().as_deref()) {
        let found = state.reservations.for_phone(&phone).await?;
        if let Some(r) = found.iter().find(|r| !r.is_cancelled() && !r.is_paid()) {
            return Ok(PaymentTarget::Reservation(r.id));
        }
    }
    Err(AppError::with_message(
        ErrorCode::PaymentTargetMissing,
        "Which reservation would you like to pay for? Please tell me the reservation number.",
    ))
}

async fn order_target(state: &ServerState, req: &SwaigRequest, args: &Args) -> AppResult<PaymentTarget> {
    if let Some(raw) = args.str("order_number") {
        let number = six_digits(&raw)?;
        let detail = state.orders.find_by_number(&number).await?;
        return Ok(PaymentTarget::Order(detail.order.id));
    }
    if let Some(phone) = normalize_phone(args.str("phone_number").as_deref(), req.caller_phone().as_deref()) {
        if let Some(detail) = state.orders.latest_for_phone(&phone).await? {
            if !detail.order.is_paid() && !detail.order.is_cancelled() {
                return Ok(PaymentTarget::Order(detail.order.id));
            }
        }
    }
    Err(AppError::with_message(
        ErrorCode::PaymentTargetMissing,
        "Which order would you like to pay for? Please tell me the order number.",
    ))
}

fn kind(target: PaymentTarget) -> &'static str {
    match target {
        PaymentTarget::Reservation(_) => "reservation",
        PaymentTarget::Order(_) => "order",
    }
}

fn six_digits(raw: &str) -> AppResult<String> {
    extract_number(raw, 6).ok_or_else(|| {
        AppError::validation(format!("That number should have six digits. I heard '{raw}'."))
    })
}

fn nothing_due(kind: &str, number: &str) -> AppError {
    AppError::with_message(
        ErrorCode::PaymentAmountInvalid,
        format!("There's nothing to pay on {kind} {number} yet."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::{OrderCreate, OrderItemInput, OrderType, ReservationCreate};

    fn request(call_id: &str) -> SwaigRequest {
        SwaigRequest {
            call_id: Some(call_id.into()),
            caller_id_num: Some("+15557654321".into()),
            ..Default::default()
        }
    }

    fn args(value: serde_json::Value) -> Args {
        Args(value.as_object().cloned().unwrap_or_default())
    }

    async fn pickup_order(state: &ServerState) -> String {
        let created = state
            .orders
            .create(OrderCreate {
                order_type: OrderType::Pickup,
                customer_name: Some("Dee".into()),
                customer_phone: Some("+15557654321".into()),
                customer_address: None,
                target_date: Some("2099-01-01".into()),
                target_time: Some("12:00".into()),
                special_instructions: None,
                items: vec![OrderItemInput {
                    menu_item_id: None,
                    name: Some("Buffalo Wings".into()),
                    quantity: 2,
                    notes: None,
                }],
            })
            .await
            .unwrap();
        created.detail.order.order_number
    }

    #[tokio::test]
    async fn test_pay_order_starts_session_with_pay_action() {
        let (state, _) = ServerState::for_tests().await;
        let number = pickup_order(&state).await;

        let result = pay_order(&state, &request("call-7"), &args(json!({"order_number": number})))
            .await
            .unwrap();
        assert!(result.response.contains("$25.98"));

        let pay = &result.actions[1]["SWML"]["sections"]["main"][0]["pay"];
        assert_eq!(pay["charge_amount"], "25.98");
        assert_eq!(pay["parameters"][0]["name"], "order_number");
        assert_eq!(pay["parameters"][0]["value"], number.as_str());
        assert_eq!(pay["parameters"][1]["value"], "order");
        assert!(pay["description"].as_str().unwrap().ends_with(&format!("Order #{number}")));

        let session = state.payment_sessions.get("call-7").unwrap();
        assert_eq!(session.number, number);
    }

    #[tokio::test]
    async fn test_reservation_without_bill_cannot_be_paid() {
        let (state, _) = ServerState::for_tests().await;
        let detail = state
            .reservations
            .create(ReservationCreate {
                name: "Eve".into(),
                phone_number: "+15557654321".into(),
                party_size: 2,
                date: "2099-01-01".into(),
                time: "19:00".into(),
                special_requests: None,
                meta_data: None,
                party_orders: Vec::new(),
            })
            .await
            .unwrap();

        let err = pay_reservation(
            &state,
            &request("call-8"),
            &args(json!({"reservation_number": detail.reservation.reservation_number})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentAmountInvalid);
        assert!(!state.payment_sessions.is_active("call-8"));
    }

    #[tokio::test]
    async fn test_card_details_falls_back_to_callers_order() {
        let (state, _) = ServerState::for_tests().await;
        let number = pickup_order(&state).await;
        let result = get_card_details(&state, &request("call-9"), &Args::default())
            .await
            .unwrap();
        assert!(result.response.contains(&format!("order {number}")));
        assert!(result.response.contains("$25.98"));
    }
}
