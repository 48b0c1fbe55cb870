use std::path::PathBuf;

use chrono_tz::Tz;

/// SMS provider settings (SignalWire compatibility API)
#[derive(Debug, Clone, Default)]
pub struct SignalWireConfig {
    /// e.g. `example.signalwire.com`
    pub space: Option<String>,
    pub project_id: Option<String>,
    pub token: Option<String>,
    /// Sender number for outbound SMS
    pub from_number: String,
    /// Where the voice pay verb posts its result
    pub payment_connector_url: String,
}

impl SignalWireConfig {
    /// All three REST credentials present
    pub fn has_credentials(&self) -> bool {
        self.space.is_some() && self.project_id.is_some() && self.token.is_some()
    }
}

/// Payment gateway settings (Stripe)
#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub api_key: Option<String>,
    pub publishable_key: Option<String>,
    /// `whsec_...`; webhooks are refused while unset
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub currency: String,
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (database/, logs/) |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
/// | RESTAURANT_NAME | The Bistro | SMS / voice greeting name |
/// | PUBLIC_BASE_URL | http://localhost:{HTTP_PORT} | Callback base URL |
/// | TIMEZONE | America/New_York | Restaurant-local clock |
/// | OPENING_HOUR / CLOSING_HOUR | 9 / 21 | Voice booking hours |
/// | SEED_MENU | true | Seed default menu into an empty DB |
/// | ADMIN_TOKEN | - | Bearer token for admin routes |
/// | SIGNALWIRE_SPACE / SIGNALWIRE_PROJECT_ID / SIGNALWIRE_TOKEN | - | SMS credentials |
/// | SIGNALWIRE_FROM_NUMBER | +15551234567 | SMS sender |
/// | SIGNALWIRE_PAYMENT_CONNECTOR_URL | {PUBLIC_BASE_URL}/api/signalwire/payment-callback | Pay verb callback |
/// | STRIPE_API_KEY / STRIPE_PUBLISHABLE_KEY | - | Payment gateway keys |
/// | STRIPE_WEBHOOK_SECRET | - | Webhook signing secret |
/// | MANAGER_PHONE | - | Transfer target |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/bistro HTTP_PORT=9000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    pub log_level: String,
    pub request_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,

    pub restaurant_name: String,
    pub public_base_url: String,
    pub timezone: Tz,
    /// First bookable hour (inclusive)
    pub opening_hour: u32,
    /// Last bookable hour (inclusive)
    pub closing_hour: u32,
    pub seed_menu: bool,
    /// None = admin routes open (development only)
    pub admin_token: Option<String>,
    pub manager_phone: Option<String>,

    pub signalwire: SignalWireConfig,
    pub stripe: StripeConfig,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let public_base_url = env_opt("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{http_port}"))
            .trim_end_matches('/')
            .to_string();

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),

            restaurant_name: std::env::var("RESTAURANT_NAME")
                .unwrap_or_else(|_| "The Bistro".into()),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::America::New_York),
            opening_hour: std::env::var("OPENING_HOUR")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(9),
            closing_hour: std::env::var("CLOSING_HOUR")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(21),
            seed_menu: std::env::var("SEED_MENU")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            admin_token: env_opt("ADMIN_TOKEN"),
            manager_phone: env_opt("MANAGER_PHONE"),

            signalwire: SignalWireConfig {
                space: env_opt("SIGNALWIRE_SPACE"),
                project_id: env_opt("SIGNALWIRE_PROJECT_ID"),
                token: env_opt("SIGNALWIRE_TOKEN"),
                from_number: std::env::var("SIGNALWIRE_FROM_NUMBER")
                    .unwrap_or_else(|_| "+15551234567".into()),
                payment_connector_url: env_opt("SIGNALWIRE_PAYMENT_CONNECTOR_URL")
                    .unwrap_or_else(|| {
                        format!("{public_base_url}/api/signalwire/payment-callback")
                    }),
            },
            stripe: StripeConfig {
                api_key: env_opt("STRIPE_API_KEY"),
                publishable_key: env_opt("STRIPE_PUBLISHABLE_KEY"),
                webhook_secret: env_opt("STRIPE_WEBHOOK_SECRET"),
                api_base: std::env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".into()),
                currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".into()),
            },
            public_base_url,
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("bistro.db")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// URL the agent platform calls for SWAIG functions
    pub fn receptionist_url(&self) -> String {
        format!("{}/receptionist", self.public_base_url)
    }

    /// Whether `hour` falls inside bookable hours
    pub fn is_open_at(&self, hour: u32) -> bool {
        (self.opening_hour..=self.closing_hour).contains(&hour)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_work_dir() {
        let config = Config::with_overrides("/tmp/bistro", 9999);
        assert_eq!(config.http_port, 9999);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/bistro/database/bistro.db")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/bistro/logs"));
    }

    #[test]
    fn test_opening_hours_inclusive() {
        let mut config = Config::default();
        config.opening_hour = 9;
        config.closing_hour = 21;
        assert!(config.is_open_at(9));
        assert!(config.is_open_at(21));
        assert!(!config.is_open_at(8));
        assert!(!config.is_open_at(22));
    }

    #[test]
    fn test_signalwire_credentials() {
        let mut sw = SignalWireConfig::default();
        assert!(!sw.has_credentials());
        sw.space = Some("x.signalwire.com".into());
        sw.project_id = Some("p".into());
        sw.token = Some("t".into());
        assert!(sw.has_credentials());
    }
}
