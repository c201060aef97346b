//! Graceful Shutdown

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 在 `signal` 完成时取消 `token`
///
/// 返回监听任务的句柄；`token` 被其他途径取消时任务随之退出。
pub fn cancel_on<F>(token: CancellationToken, signal: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = signal => {
                info!("Triggering shutdown");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
