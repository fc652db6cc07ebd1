use clap::Parser;
use colored::Colorize;
use tracing::info;

use doc2word::api::{self, state::AppState};
use doc2word::cleanup;
use doc2word::cli::Cli;
use doc2word::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 解析命令行参数
    let args = Cli::parse();
    let config = Config::from_cli(&args);

    // 创建临时目录
    tokio::fs::create_dir_all(&config.temp_dir).await?;
    info!("临时目录路径: {}", config.temp_dir.display());

    // 启动时先清理一轮遗留的旧会话目录
    cleanup::sweep_expired(&config.temp_dir, config.retention).await;

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("{}: http://{}", "服务已启动".green(), addr);
    axum::serve(listener, app).await?;

    Ok(())
}
