use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::tasks::{self, BackgroundTasks, TaskKind};
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::db::seed::seed_menu_if_empty;
use crate::services::{
    MenuService, OrderService, PaymentGateway, PaymentService, PaymentSessions,
    ReservationService, SmsSender, gateway_from_config, sender_from_config,
};
use crate::voice::memory::ConversationMemory;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc / 连接池实现浅拷贝，clone 成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 |
/// | menu / orders / reservations | 预订与订单服务 |
/// | payments | 支付对账服务 |
/// | sms | 短信发送 (trait object, 测试可替换) |
/// | payment_sessions | 语音支付会话 |
/// | conversations | 语音会话记忆 (仅诊断) |
/// | shutdown | 全局取消令牌 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub menu: MenuService,
    pub orders: OrderService,
    pub reservations: ReservationService,
    pub payments: PaymentService,
    pub sms: Arc<dyn SmsSender>,
    pub payment_sessions: Arc<PaymentSessions>,
    pub conversations: Arc<ConversationMemory>,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录 (database/, logs/)
    /// 2. 数据库 (work_dir/database/bistro.db) 与默认菜单
    /// 3. 外部协作方 (SMS, 支付网关)
    /// 4. 各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(config.database_dir())?;
        std::fs::create_dir_all(config.log_dir())?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        if config.seed_menu {
            let seeded = seed_menu_if_empty(&db.pool).await?;
            if seeded > 0 {
                tracing::info!(items = seeded, "Default menu seeded");
            }
        }

        let sms = sender_from_config(&config.signalwire);
        let gateway = gateway_from_config(&config.stripe);
        tracing::info!(sms = sms.name(), gateway = gateway.name(), "Outbound collaborators ready");

        Ok(Self::with_services(config.clone(), db, sms, gateway))
    }

    /// 用给定的数据库和协作方组装状态 (测试使用 in-memory DB 和记录型 fake)
    pub fn with_services(
        config: Config,
        db: DbService,
        sms: Arc<dyn SmsSender>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let pool = db.pool.clone();
        let menu = MenuService::new(pool.clone());
        let orders = OrderService::new(pool.clone(), menu.clone());
        let reservations = ReservationService::new(pool.clone(), menu.clone(), orders.clone());
        let payment_sessions = Arc::new(PaymentSessions::new());
        let payments = PaymentService::new(
            pool,
            gateway,
            sms.clone(),
            payment_sessions.clone(),
            config.restaurant_name.clone(),
            config.timezone,
            config.stripe.currency.clone(),
        )
        .with_webhook_secret(config.stripe.webhook_secret.clone());

        Self {
            config,
            db,
            menu,
            orders,
            reservations,
            payments,
            sms,
            payment_sessions,
            conversations: Arc::new(ConversationMemory::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// 启动后台任务
    ///
    /// - 支付会话 / 会话记忆清理 (每分钟)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut background = BackgroundTasks::with_token(self.shutdown.clone());
        background.spawn(
            "session_sweeper",
            TaskKind::Periodic,
            tasks::session_sweeper(
                self.clone(),
                self.shutdown.clone(),
                tasks::SESSION_SWEEP_INTERVAL,
            ),
        );
        background.log_summary();
        background
    }

    /// Send an SMS; failures are logged and reported as `false`
    pub async fn notify(&self, to: &str, body: &str) -> bool {
        match self.sms.send(to, body).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    to = %crate::utils::phone::mask_phone(to),
                    error = %e,
                    "SMS notification failed"
                );
                false
            }
        }
    }

    /// In-memory state with the default menu and a recording SMS sender
    #[cfg(test)]
    pub(crate) async fn for_tests() -> (Self, Arc<crate::services::RecordingSms>) {
        let db = DbService::in_memory().await.expect("in-memory db");
        seed_menu_if_empty(&db.pool).await.expect("seed menu");
        let sms = Arc::new(crate::services::RecordingSms::new());
        let mut config = Config::default();
        config.restaurant_name = "The Bistro".into();
        config.timezone = chrono_tz::America::New_York;
        config.opening_hour = 0;
        config.closing_hour = 23;
        config.manager_phone = None;
        let state = Self::with_services(
            config,
            db,
            sms.clone(),
            Arc::new(crate::services::OfflineGateway),
        );
        (state, sms)
    }
}
