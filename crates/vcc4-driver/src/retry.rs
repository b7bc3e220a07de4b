//! 设备忙重试策略
//!
//! 只有 `DeviceBusy` 会被重试，其余错误原样返回。
//! 尝试次数用尽后返回 `DeviceBusyTimeout`。

use crate::cancel::CancelSignal;
use crate::error::DriverError;
use std::time::Duration;
use tracing::{trace, warn};

/// 有界重试策略（指数退避，带上限）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次退避
    pub initial_backoff: Duration,
    /// 退避上限
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的退避时间（从 1 开始）
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// 执行操作，设备忙时重试
    ///
    /// `cancel` 为 `Some` 时，退避前和退避期间检查取消信号，取消后返回 `Cancelled`。
    pub fn run<T, F>(
        &self,
        operation: &'static str,
        cancel: Option<&CancelSignal>,
        mut f: F,
    ) -> Result<T, DriverError>
    where
        F: FnMut() -> Result<T, DriverError>,
    {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            match f() {
                Err(e) if e.is_retryable() => {
                    if attempt == attempts {
                        break;
                    }
                    if cancel.is_some_and(CancelSignal::is_cancelled) {
                        return Err(DriverError::Cancelled);
                    }
                    let delay = self.backoff(attempt);
                    if attempt == 1 {
                        trace!("{} busy, retrying in {:?}", operation, delay);
                    } else {
                        warn!(
                            "{} busy ({}/{}), retrying in {:?}",
                            operation, attempt, attempts, delay
                        );
                    }
                    match cancel {
                        Some(signal) => {
                            if signal.wait(delay) {
                                return Err(DriverError::Cancelled);
                            }
                        },
                        None => std::thread::sleep(delay),
                    }
                },
                other => return other,
            }
        }

        Err(DriverError::DeviceBusyTimeout {
            operation,
            attempts,
        })
    }
}
