//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::models::{MenuCategory, MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include unavailable items
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupedQuery {
    pub category: Option<String>,
}

/// GET /api/menu_items - 菜品列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<MenuItem>>> {
    let items = state.menu.list(query.all).await?;
    Ok(Json(items))
}

/// GET /api/menu_items/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MenuItem>> {
    Ok(Json(state.menu.get(id).await?))
}

/// GET /api/menu - 按分类分组
pub async fn grouped(
    State(state): State<ServerState>,
    Query(query): Query<GroupedQuery>,
) -> AppResult<Json<Vec<MenuCategory>>> {
    let groups = state.menu.grouped(query.category.as_deref()).await?;
    Ok(Json(groups))
}

/// POST /api/menu_items - 新建菜品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    let item = state.menu.create(payload).await?;
    tracing::info!(menu_item_id = item.id, name = %item.name, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/menu_items/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    let item = state.menu.update(id, payload).await?;
    Ok(Json(item))
}

/// DELETE /api/menu_items/{id} - 下架 (保留历史订单引用)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.menu.delete(id).await?;
    Ok(Json(ApiResponse::ok()))
}
