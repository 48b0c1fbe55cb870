//! Bistro Server - 餐厅预订 / 点餐 / 支付 / 语音接待服务
//!
//! # 模块结构
//!
//! ```text
//! bistro-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── db/            # SQLite 连接、迁移、仓储
//! ├── services/      # 菜单、预订、订单、支付、短信
//! ├── voice/         # SWAIG 函数分发与技能
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、电话号码、时间、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;
pub mod voice;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____  _      __
   / __ )(_)____/ /__________
  / __  / / ___/ __/ ___/ __ \
 / /_/ / (__  ) /_/ /  / /_/ /
/_____/_/____/\__/_/   \____/
    "#
    );
}
