use std::str::FromStr;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

/// 初始化 Logger
///
/// 日志始终输出到控制台；`log_folder` 非空时额外写入按天分割的日志文件，
/// 此时返回的 guard 需要一直持有，drop 后缓冲区中的日志会被刷新并停止写入。
///
/// `log_level` 为 `EnvFilter` 语法，无法解析时回退到 `info`。
pub fn init_logger(log_level: &str, log_folder: &str) -> anyhow::Result<Option<WorkerGuard>> {
    let env_layer = EnvFilter::from_str(log_level).unwrap_or_else(|_| "info".into());

    let formatting_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let (file_layer, guard) = if log_folder.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::daily(log_folder, "pnnx_cache.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(true)
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed();
        (Some(layer), Some(guard))
    };

    let collector = tracing_subscriber::registry()
        .with(env_layer)
        .with(formatting_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(collector)
        .with_context(|| "to set a global collector")?;
    Ok(guard)
}
