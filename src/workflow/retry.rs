//! 重试策略
//!
//! 每次尝试都从头执行整个操作；不可重试的错误（确认超时、缺少文件）立即结束。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{PortalError, PortalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（至少 1 次）
    pub max_attempts: u32,
    /// 两次尝试之间的等待
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// 成功结果及用掉的尝试次数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// 最后一次失败及用掉的尝试次数
#[derive(Debug)]
pub struct RetryError {
    pub attempts: u32,
    pub error: PortalError,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries,
            delay: config.retry_delay(),
        }
    }

    /// 执行 `op` 直到成功、遇到不可重试的错误或次数用完
    ///
    /// `op` 的参数是当前尝试序号（从1开始）。
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<Attempted<T>, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!("{} 第 {}/{} 次尝试", label, attempt, max_attempts);

            let error = match op(attempt).await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    })
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                error!("{} ❌ 第 {} 次尝试失败且不可重试: {}", label, attempt, error);
                return Err(RetryError {
                    attempts: attempt,
                    error,
                });
            }

            if attempt >= max_attempts {
                error!("{} ❌ {} 次尝试全部失败: {}", label, max_attempts, error);
                return Err(RetryError {
                    attempts: attempt,
                    error,
                });
            }

            warn!(
                "{} ⚠️ 第 {} 次尝试失败: {}，{} 秒后重试",
                label,
                attempt,
                error,
                self.delay.as_secs()
            );
            sleep(self.delay).await;
            attempt += 1;
        }
    }
}
