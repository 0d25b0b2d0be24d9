use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use codim_client::{logger, App, Config};
use tracing::error;

const USAGE: &str = "用法: codim-client <exercise_uuid> <source_file> [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(exercise_uuid), Some(source)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let config_path = args
        .next()
        .or_else(|| std::env::var("CODIM_CONFIG").ok())
        .map(PathBuf::from);

    // 加载配置
    let config = Config::load(config_path.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config, &exercise_uuid).await?;
    let outcome = app.run(&PathBuf::from(source)).await;
    app.shutdown().await;

    match outcome {
        Ok(verdict) if verdict.is_passed() => Ok(()),
        Ok(_) => std::process::exit(1),
        Err(e) => {
            error!("运行失败: {}", e);
            Err(e.into())
        }
    }
}
