//! transfer_to_manager / schedule_callback

use serde_json::json;

use crate::core::ServerState;
use crate::utils::phone::{mask_phone, normalize_phone};
use crate::voice::skills::SkillResult;
use crate::voice::swaig::{Args, FunctionResult, SwaigRequest};

pub fn transfer_to_manager(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let reason = args.str("reason").unwrap_or_else(|| "not given".to_string());
    match state.config.manager_phone.as_deref() {
        Some(manager) => {
            tracing::info!(call_id = req.call_id(), reason = %reason, "Transferring call to manager");
            Ok(FunctionResult::new("Of course. Let me transfer you to our manager now. Please hold.")
                .connect(manager))
        }
        None => {
            tracing::warn!(call_id = req.call_id(), "Manager transfer requested but MANAGER_PHONE is not set");
            Ok(FunctionResult::new(
                "I'm sorry, our manager isn't available to take calls right now. \
                 I can schedule a callback for you instead.",
            ))
        }
    }
}

pub fn schedule_callback(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let phone = normalize_phone(
        args.str("phone_number").as_deref(),
        req.caller_phone().as_deref(),
    );
    let Some(phone) = phone else {
        return Ok(FunctionResult::new(
            "What's the best number to reach you on?",
        ));
    };
    let preferred_time = args
        .str("preferred_time")
        .unwrap_or_else(|| "as soon as possible".to_string());
    let reason = args.str("reason").unwrap_or_default();

    tracing::info!(
        target: "callback",
        call_id = req.call_id(),
        phone = %mask_phone(&phone),
        preferred_time = %preferred_time,
        reason = %reason,
        "Callback requested"
    );
    let response = format!(
        "I've scheduled a callback from {} to the number ending in {} {}. Is there anything else I can help with?",
        state.config.restaurant_name,
        &phone[phone.len().saturating_sub(4)..],
        if preferred_time == "as soon as possible" {
            preferred_time.clone()
        } else {
            format!("at {preferred_time}")
        },
    );
    Ok(FunctionResult::new(response).add_action(
        "callback_data",
        json!({ "phone_number": phone, "preferred_time": preferred_time, "reason": reason }),
    ))
}
