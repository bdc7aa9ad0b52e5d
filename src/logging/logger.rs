//! 日志初始化
//!
//! 控制台输出 + 可选的按天滚动文件输出。
//! 级别优先读 RUST_LOG 环境变量，未设置时使用配置的默认级别。

use super::config::{LogConfig, LogFormat};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// 初始化全局日志
///
/// 返回文件日志的 WorkerGuard；调用方需持有它直到进程退出，
/// 否则缓冲中的日志会丢失。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(config.level.to_level_filter().into())
    });

    let mut layers = Vec::new();
    let mut guard = None;

    // 控制台层
    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    layers.push(console_layer);

    // 文件层（按天滚动）
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("无法创建日志目录: {}", dir.display()))?;

        let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);

        let file_layer = match config.format {
            LogFormat::Text => tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
        };
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .context("日志系统已初始化")?;

    tracing::info!(
        level = config.level.as_directive(),
        file_logging = config.log_dir.is_some(),
        "日志系统初始化完成"
    );

    Ok(guard)
}
