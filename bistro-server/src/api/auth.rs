//! 管理员鉴权中间件
//!
//! 全局层 [`identify_caller`] 解析 `Authorization: Bearer <token>` 并注入
//! [`Caller`]；管理路由再叠加 [`require_admin`]。
//!
//! `ADMIN_TOKEN` 未设置时 (开发环境) 所有请求视为管理员。
//!
//! | 情况 | 结果 |
//! |------|------|
//! | 无 Authorization 头 | 401 NotAuthenticated |
//! | 令牌不匹配 | 401 TokenInvalid |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::ErrorCode;

use crate::core::ServerState;
use crate::utils::AppError;

/// Request caller as seen by the admin check
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub is_admin: bool,
    /// Whether an Authorization header was sent at all
    pub presented_token: bool,
}

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Inject [`Caller`] into request extensions
pub async fn identify_caller(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer(&req).map(str::to_string);
    let caller = match state.config.admin_token.as_deref() {
        None => Caller {
            is_admin: true,
            presented_token: token.is_some(),
        },
        Some(expected) => Caller {
            is_admin: token.as_deref() == Some(expected),
            presented_token: token.is_some(),
        },
    };
    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Reject non-admin callers
///
/// ```ignore
/// Router::new()
///     .route("/", get(handler::list))
///     .layer(middleware::from_fn(require_admin));
/// ```
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let caller = req.extensions().get::<Caller>().cloned().unwrap_or_default();
    if caller.is_admin {
        return Ok(next.run(req).await);
    }
    tracing::warn!(
        method = %req.method(),
        uri = %req.uri(),
        presented_token = caller.presented_token,
        "Admin route refused"
    );
    if caller.presented_token {
        Err(AppError::new(ErrorCode::TokenInvalid))
    } else {
        Err(AppError::unauthorized())
    }
}
