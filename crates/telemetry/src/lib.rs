//! telemetry - 可观测性库

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 入队消息数
pub const MESSAGES_QUEUED_TOTAL: &str = "courier_messages_queued_total";
/// 投递成功消息数
pub const MESSAGES_SENT_TOTAL: &str = "courier_messages_sent_total";
/// 投递失败次数
pub const DISPATCH_FAILURES_TOTAL: &str = "courier_dispatch_failures_total";

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// 初始化 Prometheus metrics，并在 `listen` 上暴露抓取端点
///
/// 需要在 tokio 运行时内调用。
pub fn init_metrics(listen: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(listen).install()?;
    describe_metrics();
    Ok(())
}

/// 注册指标描述
pub fn describe_metrics() {
    metrics::describe_counter!(MESSAGES_QUEUED_TOTAL, "Messages persisted to the courier queue");
    metrics::describe_counter!(MESSAGES_SENT_TOTAL, "Messages delivered and marked as sent");
    metrics::describe_counter!(
        DISPATCH_FAILURES_TOTAL,
        "Delivery attempts that failed and were returned to the queue"
    );
}
