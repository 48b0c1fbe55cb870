//! 语音接待路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /receptionist | GET | SWML 文档 |
//! | /receptionist | POST | SWAIG 函数回调 |

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde_json::Value;

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::voice::{self, SwaigRequest};

pub fn router() -> Router<ServerState> {
    Router::new().route("/receptionist", get(document).post(function_call))
}

/// GET /receptionist
async fn document(State(state): State<ServerState>) -> Json<Value> {
    Json(voice::swml::document(&state.config))
}

/// POST /receptionist
async fn function_call(
    State(state): State<ServerState>,
    Json(req): Json<SwaigRequest>,
) -> AppResult<Json<Value>> {
    Ok(Json(voice::handle(&state, req).await?))
}
