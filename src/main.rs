use anyhow::Result;
use notion_page_export::orchestrator::App;
use notion_page_export::{config, logger};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置（失败是致命的，浏览器尚未启动）
    let path = config::config_path();
    let (global, jobs) = config::load(&path)?;

    // 初始化并运行应用
    let stats = App::initialize(global, jobs).await?.run().await?;

    // 单页失败不中断运行，但要反映在退出码上
    if stats.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
