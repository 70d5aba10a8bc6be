use anyhow::{Context, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::info;

use pnnx_cache::{
    application::{initialize_logger, shutdown_application, start_interceptor},
    cli::Cli,
    config::Settings,
    http::make_server,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = Settings::new(&args.config).with_context(|| "init config failed")?;

    let _guard = initialize_logger(&settings)?;

    let interceptor = start_interceptor(&settings).await?;
    let handle = make_server(&settings, interceptor.clone())
        .await
        .with_context(|| "start server failed")?;
    info!("Server started");

    // 保持主线程运行，直到收到退出信号
    tokio::signal::ctrl_c().await?;
    shutdown_application(&handle, &interceptor).await;

    Ok(())
}
