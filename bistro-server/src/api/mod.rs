//! HTTP API
//!
//! | 模块 | 前缀 | 说明 |
//! |------|------|------|
//! | [`health`] | /health | 健康检查 |
//! | [`menu_items`] | /api/menu, /api/menu_items | 菜单 |
//! | [`reservations`] | /api/reservations | 预订 |
//! | [`orders`] | /api/orders | 订单 |
//! | [`kitchen`] | /api/kitchen | 后厨看板 |
//! | [`payments`] | /api/payments | 支付 |
//! | [`receptionist`] | /receptionist | 语音接待 (SWML / SWAIG) |

use std::time::Duration;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod auth;
pub mod health;
pub mod kitchen;
pub mod menu_items;
pub mod orders;
pub mod payments;
pub mod receptionist;
pub mod reservations;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(menu_items::router())
        .merge(reservations::router())
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(payments::router())
        .merge(receptionist::router())
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by the integration tests.
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // ========== Tower HTTP Middleware ==========
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_millis(
            state.config.request_timeout_ms,
        )))
        // ========== Application Middleware ==========
        // 后添加的层在外层: Set 先生成 ID，Propagate 再写回响应
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // 注入 Caller，管理路由再叠加 require_admin
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::identify_caller,
        ))
}
