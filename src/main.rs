use anyhow::{Context, Result};
use std::path::Path;
use truck_repack::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：可选的配置文件路径作为第一个参数
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(Path::new(&path))
            .with_context(|| format!("无法加载配置文件: {}", path))?,
        None => Config::from_env().context("无法读取环境变量配置")?,
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let summary = App::initialize(config)?.run().await?;

    if !summary.is_conserved() {
        std::process::exit(2);
    }
    Ok(())
}
