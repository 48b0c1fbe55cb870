//! 语音技能 - 每个 SWAIG 函数一个薄适配层
//!
//! 解析宽松参数 → 规范化 → 调用服务层 → 返回可朗读文本 + `*_data` 动作。

pub mod clock;
pub mod front_desk;
pub mod menu;
pub mod order;
pub mod payment;
pub mod reservation;

use serde_json::Value;
use shared::models::OrderItemInput;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use crate::voice::swaig::FunctionResult;

pub type SkillResult = AppResult<FunctionResult>;

/// Text the caller; if the server-side send fails, let the platform send it
pub(crate) async fn confirm_by_sms(
    state: &ServerState,
    result: FunctionResult,
    to: &str,
    body: &str,
) -> FunctionResult {
    if state.notify(to, body).await {
        result
    } else {
        result.send_sms(to, &state.config.signalwire.from_number, body)
    }
}

/// `[{name|menu_item_id, quantity, notes}]` from loosely typed JSON
///
/// Bare strings are item names with quantity 1.
pub(crate) fn parse_items(values: &[Value]) -> AppResult<Vec<OrderItemInput>> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::String(name) if !name.trim().is_empty() => Some(Ok(OrderItemInput {
                menu_item_id: None,
                name: Some(name.trim().to_string()),
                quantity: 1,
                notes: None,
            })),
            Value::Object(obj) => {
                let menu_item_id = obj.get("menu_item_id").and_then(|id| match id {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                });
                let name = obj
                    .get("name")
                    .or_else(|| obj.get("item"))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                if menu_item_id.is_none() && name.is_none() {
                    return None;
                }
                let quantity = obj
                    .get("quantity")
                    .and_then(|q| match q {
                        Value::Number(n) => n.as_i64(),
                        Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    })
                    .map_or(Ok(1), |n| spoken_count(n, "quantity"));
                let notes = obj.get("notes").and_then(Value::as_str).map(str::to_string);
                Some(quantity.map(|quantity| OrderItemInput {
                    menu_item_id,
                    name,
                    quantity,
                    notes,
                }))
            }
            _ => None,
        })
        .collect()
}

/// Narrow a spoken count; values beyond `i32` are refused, never wrapped
pub(crate) fn spoken_count(n: i64, what: &str) -> AppResult<i32> {
    i32::try_from(n).map_err(|_| AppError::validation(format!("{n} is not a valid {what}.")))
}

/// `2 Buffalo Wings, 1 Coca-Cola`
pub(crate) fn describe_lines<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = (&'a str, i32)>,
{
    lines
        .into_iter()
        .map(|(name, qty)| format!("{qty} {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}
