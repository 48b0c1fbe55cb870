//! Order API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | GET | 列表 (status/order_type/date/phone) | 管理员 |
//! | /api/orders | POST | 创建自取/外送订单 (201) | 无 |
//! | /api/orders/by-number/{number} | GET | 按订单号查询 | 无 |
//! | /api/orders/{id} | GET | 详情 | 无 |
//! | /api/orders/{id}/status | PUT | 后厨状态流转 | 管理员 |
//! | /api/orders/{id}/payment | PUT | 网页支付确认 | 无 |
//! | /api/orders/{id}/payment-status | GET | 支付状态轮询 | 无 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::api::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route("/by-number/{number}", get(handler::get_by_number))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/payment", put(handler::confirm_payment))
        .route("/{id}/payment-status", get(handler::payment_status));

    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/status", put(handler::update_status))
        .layer(middleware::from_fn(require_admin));

    public_routes.merge(admin_routes)
}
