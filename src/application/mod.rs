use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::Handle;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::cache::CacheStorage;
use crate::config::Settings;
use crate::consts::{ARCH, COMMIT, COMPILER, NAME, OS, VERSION};
use crate::http::shutdown_server;
use crate::interceptor::{AssetInterceptor, ReqwestFetcher};
use crate::utils::init_logger;

/// 初始化日志系统，返回的 guard 需要在程序退出前一直持有
pub fn initialize_logger(settings: &Settings) -> Result<Option<WorkerGuard>> {
    let guard = init_logger(settings.log_level.as_str(), settings.log_folder.as_str())
        .with_context(|| "Failed to initialize logger")?;
    info!("{} v{} ({})", NAME, VERSION, COMMIT);
    info!("Compiler: {}", COMPILER);
    info!("OS: {} {}", OS, ARCH);
    debug!("Configuration: {:?}", settings);
    Ok(guard)
}

/// 根据配置创建缓存仓库与拦截器，并完成安装与激活
pub async fn start_interceptor(settings: &Settings) -> Result<Arc<AssetInterceptor>> {
    let storage = match &settings.cache_dir {
        Some(dir) => {
            info!("Cache persisted to {:?}", dir);
            CacheStorage::persistent(dir)
        }
        None => {
            info!("Cache kept in memory");
            CacheStorage::memory()
        }
    };

    let origin = settings.origin()?;
    if settings.upstream.is_none() {
        warn!("No upstream configured, same-origin requests to {} will fail", origin);
    }
    let fetcher = ReqwestFetcher::new(
        origin.clone(),
        settings.upstream.clone(),
        Duration::from_secs(settings.timeout.into()),
    )
    .with_context(|| "Failed to build http client")?;

    let interceptor = AssetInterceptor::new(Arc::new(storage), Arc::new(fetcher), &origin);
    interceptor
        .start()
        .await
        .with_context(|| "Failed to activate interceptor")?;
    info!(
        "Interceptor for {} using cache {}",
        origin,
        interceptor.cache_name()
    );
    Ok(Arc::new(interceptor))
}

/// 优雅关闭服务器，并等待拦截器的后台任务完成
pub async fn shutdown_application(handle: &Handle<SocketAddr>, interceptor: &AssetInterceptor) {
    info!("Received shutdown signal, closing server...");
    shutdown_server(handle);
    interceptor.shutdown().await;
    info!("Application shutdown complete");
}
