use anyhow::Result;
use portal_order_bot::{utils::logging, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（包括 .env）
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
