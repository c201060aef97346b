//! Worker 启动器
//!
//! 提供统一的后台 worker 启动模式

use std::future::Future;

use courier_config::AppConfig;
use courier_errors::AppResult;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::runtime::{init_runtime, shutdown_signal};
use crate::shutdown::cancel_on;

/// 运行后台 worker
///
/// 1. 加载配置
/// 2. 初始化运行时（日志、指标）
/// 3. 监听 SIGINT / SIGTERM，收到后取消 `CancellationToken`
/// 4. 调用用户提供的闭包并等待其结束
///
/// # 示例
///
/// ```ignore
/// use courier_bootstrap::run_worker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_worker("config", |config, shutdown| async move {
///         let worker = build_worker(&config)?;
///         worker.work(shutdown).await
///     }).await
/// }
/// ```
pub async fn run_worker<F, Fut>(
    config_dir: &str,
    worker: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(AppConfig, CancellationToken) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config);

    let shutdown = CancellationToken::new();
    let listener = cancel_on(shutdown.clone(), shutdown_signal());

    let result = worker(config, shutdown.clone()).await;

    shutdown.cancel();
    let _ = listener.await;

    match result {
        Ok(()) => {
            info!("Worker stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Worker terminated with error");
            Err(e.into())
        }
    }
}
