//! 通用重试机制模块
//!
//! 提供带指数退避、随机抖动和协作式取消的重试逻辑

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 通用重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数，`None` 表示只受总时长限制
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// 初始延迟
    pub initial_delay: Duration,
    /// 最大延迟
    pub max_delay: Duration,
    /// 退避乘数
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// 随机抖动系数，实际延迟落在 `delay * (1 ± factor)` 区间
    #[serde(default)]
    pub randomization_factor: f64,
    /// 重试总时长上限
    #[serde(default)]
    pub max_elapsed: Option<Duration>,
}

fn default_multiplier() -> f64 {
    1.5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_elapsed: Some(Duration::from_secs(15 * 60)),
        }
    }
}

impl RetryConfig {
    /// 创建按次数限制、无抖动的重试配置
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            initial_delay,
            max_delay,
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed: None,
        }
    }

    /// 计算第 n 次重试的基础延迟（不含抖动）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped_delay = (delay_ms as u64).min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped_delay)
    }

    /// 计算第 n 次重试的实际延迟（含抖动）
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.randomization_factor <= 0.0 || base.is_zero() {
            return base;
        }

        let base_ms = base.as_millis() as f64;
        let delta = self.randomization_factor * base_ms;
        let jittered = rand::thread_rng().gen_range((base_ms - delta)..=(base_ms + delta));
        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

/// 重试终止原因
#[derive(Debug)]
pub enum RetryError<E> {
    /// 等待期间收到取消信号
    Cancelled,
    /// 次数或总时长用尽，携带最后一次错误
    Exhausted { attempts: u32, last_error: E },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "retry cancelled"),
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempts: {last_error}"),
        }
    }
}

/// 带指数退避的异步操作执行器
///
/// 每次尝试前以及每次等待期间都会检查 `shutdown`；
/// 已经开始的尝试不会被中断。
///
/// # 参数
/// - `config`: 重试配置
/// - `operation_name`: 操作名称（用于日志）
/// - `shutdown`: 取消信号
/// - `operation`: 要执行的异步操作
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    shutdown: &CancellationToken,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        if shutdown.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                let delay = config.jittered_delay(attempt);
                attempt += 1;

                let attempts_exhausted = config.max_attempts.is_some_and(|max| attempt >= max);
                let elapsed_exhausted = config
                    .max_elapsed
                    .is_some_and(|max| started.elapsed() + delay > max);

                if attempts_exhausted || elapsed_exhausted {
                    warn!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "Operation failed, no more retries"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                warn!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                tokio::select! {
                    _ = shutdown.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
