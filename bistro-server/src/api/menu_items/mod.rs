//! Menu API 模块
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/menu_items | GET | 可点菜品 (`?all=true` 含下架) | 无 |
//! | /api/menu_items/{id} | GET | 单个菜品 | 无 |
//! | /api/menu_items | POST | 新建 | 管理员 |
//! | /api/menu_items/{id} | PUT / DELETE | 修改 / 下架 | 管理员 |
//! | /api/menu | GET | 按分类分组 | 无 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::api::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/menu_items", routes())
        .route("/api/menu", get(handler::grouped))
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(write_routes)
}
