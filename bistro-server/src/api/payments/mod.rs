//! Payment API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/payments/config | GET | 浏览器端公钥 | 无 |
//! | /api/payments/intent | POST | 创建支付意图 | 无 |
//! | /api/payments/webhook | POST | 网关回调 | 无 |
//! | /api/payments/sessions | GET | 语音支付会话 (调试) | 管理员 |
//! | /api/signalwire/payment-callback | POST | 语音 pay 回调 | 无 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/payments", routes())
        .route("/api/signalwire/payment-callback", post(handler::pay_callback))
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/config", get(handler::config))
        .route("/intent", post(handler::create_intent))
        .route("/webhook", post(handler::webhook));

    let admin_routes = Router::new()
        .route("/sessions", get(handler::sessions))
        .layer(middleware::from_fn(require_admin));

    public_routes.merge(admin_routes)
}
