//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::models::{
    OrderCreate, OrderCreated, OrderDetail, OrderPaymentConfirm, OrderQuery, OrderStatusUpdate,
    PaymentReceipt, PaymentStatusView, PaymentTarget,
};

use crate::core::ServerState;
use crate::services::receipts;
use crate::utils::AppResult;
use crate::utils::time::ready_at;

/// GET /api/orders - 订单列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<OrderDetail>>> {
    Ok(Json(state.orders.list(&query).await?))
}

/// POST /api/orders - 创建订单
///
/// 未指定取餐时间时默认为当前时间 + 预计制作时长。
pub async fn create(
    State(state): State<ServerState>,
    Json(mut payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderCreated>)> {
    if payload.target_date.is_none() || payload.target_time.is_none() {
        let (date, time) = ready_at(state.config.timezone, payload.order_type.estimated_minutes());
        payload.target_date = payload.target_date.or(Some(date));
        payload.target_time = payload.target_time.or(Some(time));
    }
    let created = state.orders.create(payload).await?;
    let detail = &created.detail;
    if let Some(phone) = detail.order.customer_phone.as_deref() {
        let body = receipts::order_confirmed(&state.config.restaurant_name, detail);
        state.notify(phone, &body).await;
    }
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/orders/by-number/{number}
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.find_by_number(&number).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.get(id).await?))
}

/// PUT /api/orders/{id}/status - 后厨状态流转
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.update_status(id, payload.status).await?))
}

/// PUT /api/orders/{id}/payment - 网页支付确认
pub async fn confirm_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderPaymentConfirm>,
) -> AppResult<Json<PaymentReceipt>> {
    Ok(Json(state.payments.confirm_order_payment(id, payload).await?))
}

/// GET /api/orders/{id}/payment-status
pub async fn payment_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PaymentStatusView>> {
    Ok(Json(state.payments.status_view(PaymentTarget::Order(id)).await?))
}
