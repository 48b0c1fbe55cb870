//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::models::{
    CalendarEvent, OrderDetail, PartyOrderInput, PaymentReceipt, PaymentStatusView,
    PaymentTarget, Reservation, ReservationCreate, ReservationDetail, ReservationPaymentConfirm,
    ReservationQuery, ReservationUpdate,
};

use crate::core::ServerState;
use crate::services::receipts;
use crate::utils::time::today_string;
use crate::utils::{ApiResponse, AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Recomputed bill
#[derive(Debug, Serialize)]
pub struct BillView {
    pub reservation_id: i64,
    pub reservation_number: String,
    pub party_orders: Vec<OrderDetail>,
    pub bill_total: f64,
    pub payment_status: shared::models::PaymentStatus,
}

/// GET /api/reservations - 列表 / 搜索
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    Ok(Json(state.reservations.list(&query).await?))
}

/// POST /api/reservations - 创建预订并发送短信确认
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<(StatusCode, Json<ReservationDetail>)> {
    let detail = state.reservations.create(payload).await?;
    let body = receipts::reservation_confirmed(&state.config.restaurant_name, &detail);
    state.notify(&detail.reservation.phone_number, &body).await;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/reservations/today
pub async fn today(State(state): State<ServerState>) -> AppResult<Json<Vec<Reservation>>> {
    let date = today_string(state.config.timezone);
    Ok(Json(state.reservations.for_date(&date).await?))
}

/// GET /api/reservations/calendar?start=&end=
pub async fn calendar(
    State(state): State<ServerState>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    let events = state
        .reservations
        .calendar(query.start.as_deref(), query.end.as_deref())
        .await?;
    Ok(Json(events))
}

/// GET /api/reservations/by-number/{number}
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<ReservationDetail>> {
    Ok(Json(state.reservations.find_by_number(&number).await?))
}

/// GET /api/reservations/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationDetail>> {
    Ok(Json(state.reservations.get(id).await?))
}

/// PUT /api/reservations/{id} - 部分更新
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationUpdate>,
) -> AppResult<Json<ReservationDetail>> {
    if payload.is_empty() {
        return Err(AppError::validation("No fields to update"));
    }
    let detail = state.reservations.update(id, payload).await?;
    let body = receipts::reservation_updated(&state.config.restaurant_name, &detail.reservation);
    state.notify(&detail.reservation.phone_number, &body).await;
    Ok(Json(detail))
}

/// DELETE /api/reservations/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.reservations.delete(id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// POST /api/reservations/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationDetail>> {
    let detail = state.reservations.cancel(id).await?;
    let body = receipts::reservation_cancelled(&state.config.restaurant_name, &detail.reservation);
    state.notify(&detail.reservation.phone_number, &body).await;
    Ok(Json(detail))
}

/// POST /api/reservations/{id}/party_orders
pub async fn add_party_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PartyOrderInput>,
) -> AppResult<(StatusCode, Json<ReservationDetail>)> {
    let detail = state.reservations.add_party_order(id, payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/reservations/{id}/bill
pub async fn bill(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BillView>> {
    let detail = state.reservations.get(id).await?;
    Ok(Json(BillView {
        reservation_id: detail.reservation.id,
        reservation_number: detail.reservation.reservation_number,
        payment_status: detail.reservation.payment_status,
        party_orders: detail.party_orders,
        bill_total: detail.bill_total,
    }))
}

/// GET /api/reservations/{id}/payment-status - 网页轮询
pub async fn payment_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PaymentStatusView>> {
    let view = state
        .payments
        .status_view(PaymentTarget::Reservation(id))
        .await?;
    Ok(Json(view))
}

/// POST /api/reservations/payment - 网页支付确认
pub async fn confirm_payment(
    State(state): State<ServerState>,
    Json(payload): Json<ReservationPaymentConfirm>,
) -> AppResult<Json<PaymentReceipt>> {
    let receipt = state.payments.confirm_reservation_payment(payload).await?;
    Ok(Json(receipt))
}
