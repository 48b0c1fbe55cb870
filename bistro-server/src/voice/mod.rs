//! 语音接待 (SWAIG / SWML)
//!
//! - [`swaig`] - 请求/响应结构与 `FunctionResult` 构建器
//! - [`dispatch`] - 函数分发、支付会话保护
//! - [`skills`] - 各个函数的实现
//! - [`swml`] / [`signatures`] - 呼叫流程文档与函数签名
//! - [`normalize`] - 口语日期时间解析
//! - [`memory`] - 会话记忆 (诊断)

pub mod dispatch;
pub mod memory;
pub mod normalize;
pub mod signatures;
pub mod skills;
pub mod swaig;
pub mod swml;

pub use dispatch::handle;
pub use memory::ConversationMemory;
pub use swaig::{FunctionResult, SwaigRequest};
