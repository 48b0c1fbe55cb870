//! Kitchen API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use shared::models::{KitchenBoard, KitchenQuery};

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::time::today_string;

/// GET /api/kitchen/orders - 按状态分列的进行中订单
pub async fn board(
    State(state): State<ServerState>,
    Query(query): Query<KitchenQuery>,
) -> AppResult<Json<KitchenBoard>> {
    let today = today_string(state.config.timezone);
    Ok(Json(state.orders.kitchen_board(&query, &today).await?))
}
