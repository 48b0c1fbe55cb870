//! get_current_time / get_current_date

use crate::core::ServerState;
use crate::utils::time::now_local;
use crate::voice::swaig::FunctionResult;

pub fn current_time(state: &ServerState) -> FunctionResult {
    let now = now_local(state.config.timezone);
    FunctionResult::new(format!(
        "The current time is {}.",
        now.format("%-I:%M %p")
    ))
    .add_action("time_data", serde_json::json!({ "time": now.format("%H:%M").to_string() }))
}

pub fn current_date(state: &ServerState) -> FunctionResult {
    let now = now_local(state.config.timezone);
    FunctionResult::new(format!("Today is {}.", now.format("%A, %B %-d, %Y")))
        .add_action("date_data", serde_json::json!({ "date": now.format("%Y-%m-%d").to_string() }))
}
