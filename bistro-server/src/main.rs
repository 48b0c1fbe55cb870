use bistro_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载 .env (可选)
    let _ = dotenv::dotenv();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 初始化日志 (stdout + 按天滚动文件)
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;
    init_logger_with_file(Some(config.log_level.as_str()), Some(&log_dir));

    print_banner();
    tracing::info!(restaurant = %config.restaurant_name, "🍽  Bistro server starting...");

    // 4. 初始化服务器状态 (数据库、迁移、菜单种子)
    let state = ServerState::initialize(&config).await?;

    // 5. 启动 HTTP 服务器 (Server::run 会自动启动后台任务)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
