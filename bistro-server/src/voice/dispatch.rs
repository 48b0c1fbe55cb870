//! SWAIG 函数分发
//!
//! 1. `get_signature` → 函数签名
//! 2. 支付会话中只允许支付相关函数
//! 3. 调用技能，错误转为可朗读的文本
//! 4. 记录会话记忆

use serde_json::{Value, json};
use shared::error::{ErrorCategory, ErrorCode};
use shared::models::PaymentTarget;
use shared::util::now_millis;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use crate::voice::signatures;
use crate::voice::skills::{self, SkillResult};
use crate::voice::swaig::{FunctionResult, SwaigRequest};

/// Spoken when a lookup or write fails for a system reason
const SYSTEM_TROUBLE: &str =
    "I'm sorry, I'm having trouble with our system right now. Please try again in a moment.";

/// Handle one `POST /receptionist` body
///
/// Unknown functions are a request error (400); skill failures are spoken.
pub async fn handle(state: &ServerState, req: SwaigRequest) -> AppResult<Value> {
    if req.is_signature_request() {
        return Ok(signature_response(state, &req.functions));
    }

    let function = req
        .function
        .clone()
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::invalid_request("Missing function name"))?;
    let def = signatures::find(&function).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Unknown function: {function}"))
            .with_detail("function", function.clone())
    })?;

    if !def.payment_step {
        if let Some(deflection) = payment_deflection(state, &req) {
            tracing::info!(call_id = req.call_id(), function = %function, "Function deferred during payment");
            return Ok(deflection.to_json());
        }
    }

    tracing::debug!(call_id = req.call_id(), function = %function, "SWAIG function call");
    let outcome = run(state, &function, &req).await;
    state
        .conversations
        .record(req.session_id(), &function, outcome.is_ok(), now_millis());

    let result = match outcome {
        Ok(result) => result,
        Err(e) => speak_error(&function, e),
    };
    Ok(result.to_json())
}

async fn run(state: &ServerState, function: &str, req: &SwaigRequest) -> SkillResult {
    let args = req.args();
    match function {
        "get_current_time" => Ok(skills::clock::current_time(state)),
        "get_current_date" => Ok(skills::clock::current_date(state)),
        "get_menu" => skills::menu::get_menu(state, &args).await,
        "create_reservation" => skills::reservation::create_reservation(state, req, &args).await,
        "get_reservation" => skills::reservation::get_reservation(state, req, &args).await,
        "update_reservation" => skills::reservation::update_reservation(state, req, &args).await,
        "cancel_reservation" => skills::reservation::cancel_reservation(state, req, &args).await,
        "get_todays_reservations" => skills::reservation::get_todays_reservations(state).await,
        "create_order" => skills::order::create_order(state, req, &args).await,
        "get_order_status" => skills::order::get_order_status(state, req, &args).await,
        "update_order_status" => skills::order::update_order_status(state, &args).await,
        "get_card_details" => skills::payment::get_card_details(state, req, &args).await,
        "pay_reservation" => skills::payment::pay_reservation(state, req, &args).await,
        "pay_order" => skills::payment::pay_order(state, req, &args).await,
        "transfer_to_manager" => skills::front_desk::transfer_to_manager(state, req, &args),
        "schedule_callback" => skills::front_desk::schedule_callback(state, req, &args),
        other => Err(AppError::invalid_request(format!("Unknown function: {other}"))),
    }
}

/// Names only, or full signatures for the requested names
fn signature_response(state: &ServerState, requested: &[String]) -> Value {
    if requested.is_empty() {
        return json!({ "functions": signatures::names() });
    }
    let url = state.config.receptionist_url();
    let list: Vec<Value> = requested
        .iter()
        .filter_map(|name| signatures::find(name))
        .map(|def| def.to_signature(&url))
        .collect();
    Value::Array(list)
}

/// Keep the caller on the payment while a card is being collected
///
/// A failed payment ends the session so the call can move on.
fn payment_deflection(state: &ServerState, req: &SwaigRequest) -> Option<FunctionResult> {
    let session = state.payment_sessions.get(req.call_id())?;
    if session.step == "failed" {
        state.payment_sessions.end(req.call_id());
        return None;
    }
    let kind = match session.target {
        PaymentTarget::Reservation(_) => "reservation",
        PaymentTarget::Order(_) => "order",
    };
    Some(FunctionResult::new(format!(
        "I'm currently processing your payment for {kind} {}. \
         Let's continue with the payment process, and I'll help with anything else right after.",
        session.number
    )))
}

fn speak_error(function: &str, e: AppError) -> FunctionResult {
    match e.code.category() {
        ErrorCategory::System => {
            tracing::error!(function, code = %e.code.code(), error = %e.message, "Voice function failed");
            FunctionResult::new(SYSTEM_TROUBLE)
        }
        _ => {
            tracing::info!(function, code = %e.code.code(), error = %e.message, "Voice function refused");
            FunctionResult::new(e.message)
        }
    }
}
