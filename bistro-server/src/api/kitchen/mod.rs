//! Kitchen API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/kitchen/orders | GET | 后厨看板 (`date`, `start_time`, `end_time`) | 管理员 |

mod handler;

use axum::{Router, middleware, routing::get};

use crate::api::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::board))
        .layer(middleware::from_fn(require_admin))
}
