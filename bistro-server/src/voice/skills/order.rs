//! 外卖/自取订单技能

use serde_json::json;
use shared::error::ErrorCode;
use shared::models::{OrderCreate, OrderDetail, OrderStatus, OrderType, PaymentTarget};

use crate::core::ServerState;
use crate::services::receipts;
use crate::utils::phone::{extract_number, normalize_phone};
use crate::utils::time::{format_12h, ready_at};
use crate::utils::{AppError, AppResult};
use crate::voice::skills::payment::start_payment;
use crate::voice::skills::{SkillResult, confirm_by_sms, describe_lines, parse_items};
use crate::voice::swaig::{Args, FunctionResult, SwaigRequest};

pub async fn create_order(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let items = parse_items(&args.array("items"))?;
    if items.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::OrderEmpty,
            "What would you like to order?",
        ));
    }
    let order_type = match args.str("order_type") {
        Some(raw) => raw
            .parse::<OrderType>()
            .ok()
            .filter(|t| *t != OrderType::Reservation)
            .ok_or_else(|| AppError::validation("Is this order for pickup or delivery?"))?,
        None => OrderType::Pickup,
    };
    let phone = normalize_phone(
        args.str("customer_phone").as_deref(),
        req.caller_phone().as_deref(),
    )
    .ok_or_else(|| AppError::validation("What phone number should we use for the order?"))?;

    let customer_name = match args.str("customer_name") {
        Some(name) => name,
        None => state
            .reservations
            .for_phone(&phone)
            .await?
            .into_iter()
            .next()
            .map(|r| r.name)
            .ok_or_else(|| AppError::validation("What name should I put the order under?"))?,
    };

    let (target_date, target_time) = ready_at(state.config.timezone, order_type.estimated_minutes());
    let created = state
        .orders
        .create(OrderCreate {
            order_type,
            customer_name: Some(customer_name),
            customer_phone: Some(phone.clone()),
            customer_address: args.str("customer_address"),
            target_date: Some(target_date),
            target_time: Some(target_time),
            special_instructions: args.str("special_instructions"),
            items,
        })
        .await?;

    let detail = &created.detail;
    let o = &detail.order;
    let lines = describe_lines(detail.items.iter().map(|i| (i.menu_item_name.as_str(), i.quantity)));
    let timing = match o.order_type {
        OrderType::Delivery => format!("It should arrive in about {} minutes.", created.estimated_minutes),
        _ => format!("It will be ready for pickup in about {} minutes.", created.estimated_minutes),
    };
    let response = format!(
        "Your {} order number {} is confirmed: {lines}. The total is ${:.2}. {timing}",
        o.order_type.as_str(),
        o.order_number,
        o.total_amount,
    );

    let body = receipts::order_confirmed(&state.config.restaurant_name, detail);
    let result = FunctionResult::new(response).add_action("order_data", &created);
    let result = confirm_by_sms(state, result, &phone, &body).await;

    let pay_now = args
        .str("payment_preference")
        .is_some_and(|p| p.eq_ignore_ascii_case("now"));
    if !pay_now {
        return Ok(result);
    }
    let payment = start_payment(state, req, PaymentTarget::Order(o.id), Some(phone)).await?;
    Ok(FunctionResult {
        response: format!("{} {}", result.response, payment.response),
        actions: result.actions.into_iter().chain(payment.actions).collect(),
    })
}

pub async fn get_order_status(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let detail = match args.str("order_number") {
        Some(raw) => {
            let number = order_number(&raw)?;
            state.orders.find_by_number(&number).await?
        }
        None => {
            let phone = normalize_phone(
                args.str("customer_phone").as_deref(),
                req.caller_phone().as_deref(),
            );
            let latest = match phone {
                Some(p) => state.orders.latest_for_phone(&p).await?,
                None => None,
            };
            match latest {
                Some(detail) => detail,
                None => {
                    return Ok(FunctionResult::new(
                        "I couldn't find any orders for this number. Do you have an order number?",
                    ));
                }
            }
        }
    };
    Ok(FunctionResult::new(describe_status(&detail)).add_action("order_data", &detail))
}

pub async fn update_order_status(state: &ServerState, args: &Args) -> SkillResult {
    let raw = args
        .str("order_number")
        .ok_or_else(|| AppError::validation("Which order number should I update?"))?;
    let number = order_number(&raw)?;
    let next: OrderStatus = args
        .str("status")
        .ok_or_else(|| AppError::validation("What status should the order move to?"))?
        .parse()
        .map_err(AppError::validation)?;

    let current = state.orders.find_by_number(&number).await?;
    let updated = state.orders.update_status(current.order.id, next).await?;
    let response = format!(
        "Order {} is now {}.",
        updated.order.order_number,
        updated.order.status
    );
    Ok(FunctionResult::new(response).add_action(
        "order_data",
        json!({ "order_number": updated.order.order_number, "status": updated.order.status }),
    ))
}

fn order_number(raw: &str) -> AppResult<String> {
    extract_number(raw, 6).ok_or_else(|| {
        AppError::validation(format!("Order numbers have six digits. I heard '{raw}'."))
    })
}

fn describe_status(detail: &OrderDetail) -> String {
    let o = &detail.order;
    let when = o
        .target_time
        .as_deref()
        .map(format_12h)
        .unwrap_or_else(|| "soon".to_string());
    let state = match (o.status, o.order_type) {
        (OrderStatus::Pending, _) => format!("has been received and is scheduled for {when}"),
        (OrderStatus::Preparing, _) => "is being prepared in the kitchen right now".to_string(),
        (OrderStatus::Ready, OrderType::Delivery) => "is ready and will be out for delivery shortly".to_string(),
        (OrderStatus::Ready, _) => "is ready for pickup".to_string(),
        (OrderStatus::Completed, _) => "has been completed".to_string(),
        (OrderStatus::Cancelled, _) => "was cancelled".to_string(),
    };
    let paid = if o.is_paid() { "paid" } else { "not yet paid" };
    format!(
        "Order {} {state}. The total is ${:.2} and it's {paid}.",
        o.order_number, o.total_amount
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn request(call_id: &str, caller: &str) -> SwaigRequest {
        SwaigRequest {
            call_id: Some(call_id.into()),
            caller_id_num: Some(caller.into()),
            ..Default::default()
        }
    }

    fn args(value: Value) -> Args {
        Args(value.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn test_create_order_by_fuzzy_names() {
        let (state, sms) = ServerState::for_tests().await;
        let req = request("c1", "+15552220000");
        let result = create_order(
            &state,
            &req,
            &args(json!({
                "customer_name": "Fay",
                "items": [{"name": "wings", "quantity": 2}, "sparkling water"]
            })),
        )
        .await
        .unwrap();
        assert!(result.response.contains("2 Buffalo Wings"));
        assert!(result.response.contains("1 Sparkling Water"));
        assert!(result.response.contains("$29.98"));
        assert_eq!(sms.sent()[0].0, "+15552220000");
        assert!(!state.payment_sessions.is_active("c1"));
    }

    #[tokio::test]
    async fn test_pay_now_attaches_pay_action() {
        let (state, _) = ServerState::for_tests().await;
        let req = request("c2", "+15552220001");
        let result = create_order(
            &state,
            &req,
            &args(json!({
                "customer_name": "Gus",
                "items": [{"name": "Affogato"}],
                "payment_preference": "now"
            })),
        )
        .await
        .unwrap();
        assert!(result.actions.iter().any(|a| a["SWML"]["sections"]["main"][0]
            .get("pay")
            .is_some()));
        assert!(state.payment_sessions.is_active("c2"));
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let (state, _) = ServerState::for_tests().await;
        let err = create_order(&state, &request("c3", "+15552220002"), &args(json!({"items": []})))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[tokio::test]
    async fn test_status_lookup_and_transition() {
        let (state, _) = ServerState::for_tests().await;
        let req = request("c4", "+15552220003");
        create_order(
            &state,
            &req,
            &args(json!({"customer_name": "Hal", "items": ["Lemon Tart"]})),
        )
        .await
        .unwrap();

        let status = get_order_status(&state, &req, &Args::default()).await.unwrap();
        assert!(status.response.contains("has been received"));

        let number = state
            .orders
            .latest_for_phone("+15552220003")
            .await
            .unwrap()
            .unwrap()
            .order
            .order_number;
        let moved = update_order_status(
            &state,
            &args(json!({"order_number": number, "status": "cooking"})),
        )
        .await
        .unwrap();
        assert!(moved.response.ends_with("is now preparing."));

        let invalid = update_order_status(
            &state,
            &args(json!({"order_number": number, "status": "pending"})),
        )
        .await
        .unwrap_err();
        assert_eq!(invalid.code, ErrorCode::OrderInvalidTransition);
    }
}
