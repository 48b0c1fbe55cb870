//! 业务服务层
//!
//! - [`MenuService`] / [`OrderService`] / [`ReservationService`] - 预订与订单
//! - [`PaymentService`] - 支付对账 (intent, webhook, 语音回调)
//! - [`PaymentSessions`] - 语音支付会话
//! - [`SmsSender`] / [`PaymentGateway`] - 外部协作方
//! - [`webhook_signature`] - 网关 webhook 签名校验

pub mod menu_match;
pub mod menu_service;
pub mod money;
pub mod numbers;
pub mod order_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod payment_sessions;
pub mod receipts;
pub mod reservation_service;
pub mod sms;
pub mod webhook_signature;

pub use menu_service::MenuService;
pub use order_service::OrderService;
pub use payment_gateway::{OfflineGateway, PaymentGateway, StripeGateway, gateway_from_config};
pub use payment_service::PaymentService;
pub use payment_sessions::PaymentSessions;
pub use reservation_service::ReservationService;
pub use sms::{LogOnlySms, RecordingSms, SignalWireSms, SmsSender, sender_from_config};
