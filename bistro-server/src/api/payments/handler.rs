//! Payment API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::models::{
    PaymentCallback, PaymentIntentRequest, PaymentIntentResponse, PaymentReceipt,
    PaymentSessionInfo,
};

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

#[derive(Debug, Serialize)]
pub struct PaymentConfigResponse {
    pub publishable_key: Option<String>,
    pub currency: String,
    pub gateway: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PaymentReceipt>,
}

/// GET /api/payments/config
pub async fn config(State(state): State<ServerState>) -> Json<PaymentConfigResponse> {
    Json(PaymentConfigResponse {
        publishable_key: state.payments.publishable_key(),
        currency: state.config.stripe.currency.clone(),
        gateway: state.payments.gateway_name(),
    })
}

/// POST /api/payments/intent - 创建支付意图 (金额默认为当前账单)
pub async fn create_intent(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentIntentRequest>,
) -> AppResult<Json<PaymentIntentResponse>> {
    Ok(Json(state.payments.create_intent(payload).await?))
}

/// POST /api/payments/webhook - 网关事件 (验签, 幂等)
///
/// 签名覆盖原始 body，因此不经 `Json` 提取器。
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());
    let receipt = state.payments.handle_webhook(&body, signature).await?;
    Ok(Json(WebhookAck {
        received: true,
        receipt,
    }))
}

/// GET /api/payments/sessions
pub async fn sessions(State(state): State<ServerState>) -> Json<Vec<PaymentSessionInfo>> {
    Json(state.payment_sessions.list())
}

/// POST /api/signalwire/payment-callback
///
/// 任何失败都以 400 返回，记录保持未支付，可重试。
pub async fn pay_callback(
    State(state): State<ServerState>,
    Json(callback): Json<PaymentCallback>,
) -> Response {
    match state.payments.handle_pay_callback(callback).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            tracing::warn!(target: "payment", code = e.code.code(), error = %e.message, "Pay callback rejected");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::error(&e))).into_response()
        }
    }
}
