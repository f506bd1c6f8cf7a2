//! 主应用程序入口
//!
//! 启动命令行聊天机器人：加载配置，连接 Redis，引导新用户后进入命令循环。

mod cli;
mod commands;
mod render;

use std::sync::Arc;

use application::{ChatSession, IdentityRegistry, IdentityRegistryDependencies, SessionDependencies};
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::cli::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，默认只输出警告，避免打断交互提示
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    tracing::info!(redis = %config.redis.url, "配置加载完成");

    let infra = Infrastructure::connect(&config).await?;

    let registry = Arc::new(IdentityRegistry::new(IdentityRegistryDependencies {
        profile_store: infra.user_store.clone(),
        location_lookup: infra.location_lookup.clone(),
    }));

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let Some(profile) = console.onboard(&registry).await? else {
        return Ok(());
    };

    // 每个会话使用独立的订阅连接
    let broker = infra.connect_broker().await?;
    let mut session = ChatSession::start(
        SessionDependencies {
            registry,
            broker,
            membership_store: infra.user_store.clone(),
            location_lookup: infra.location_lookup.clone(),
            fact_source: infra.fact_source.clone(),
        },
        profile,
    )
    .await?;

    console.run(&mut session).await?;
    Ok(())
}
