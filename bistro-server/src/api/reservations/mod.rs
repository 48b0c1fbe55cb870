//! Reservation API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/reservations | GET | 列表 / 搜索 | 管理员 |
//! | /api/reservations | POST | 创建 (201, 短信确认) | 无 |
//! | /api/reservations/today | GET | 今日预订 | 无 |
//! | /api/reservations/calendar | GET | 日历 (2 小时时段) | 无 |
//! | /api/reservations/by-number/{number} | GET | 按预订号查询 | 无 |
//! | /api/reservations/payment | POST | 网页支付确认 | 无 |
//! | /api/reservations/{id} | GET / PUT | 详情 / 修改 | 无 |
//! | /api/reservations/{id} | DELETE | 删除 | 管理员 |
//! | /api/reservations/{id}/cancel | POST | 取消 | 无 |
//! | /api/reservations/{id}/party_orders | POST | 追加点单 | 无 |
//! | /api/reservations/{id}/bill | GET | 账单 | 无 |
//! | /api/reservations/{id}/payment-status | GET | 支付状态轮询 | 无 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::api::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    let public_routes = Router::new()
        .route("/", post(handler::create))
        .route("/today", get(handler::today))
        .route("/calendar", get(handler::calendar))
        .route("/by-number/{number}", get(handler::get_by_number))
        .route("/payment", post(handler::confirm_payment))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/party_orders", post(handler::add_party_order))
        .route("/{id}/bill", get(handler::bill))
        .route("/{id}/payment-status", get(handler::payment_status));

    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    public_routes.merge(admin_routes)
}
