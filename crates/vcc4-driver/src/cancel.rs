//! 会话取消信号
//!
//! 运行标志加可选的唤醒通道。停止会话时先清除标志再 drop 发送端，
//! 正在等待（周期间隔、忙重试退避）的控制线程因通道断开立即醒来。

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CancelSignal {
    is_running: Arc<AtomicBool>,
    wakeup: Option<Receiver<()>>,
}

impl CancelSignal {
    pub fn new(is_running: Arc<AtomicBool>) -> Self {
        Self {
            is_running,
            wakeup: None,
        }
    }

    /// 绑定唤醒通道（收到消息或发送端 drop 时提前结束等待）
    pub fn with_wakeup(mut self, wakeup: Receiver<()>) -> Self {
        self.wakeup = Some(wakeup);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_running.load(Ordering::Acquire)
    }

    /// 等待 `timeout`，返回等待结束时是否已取消
    pub fn wait(&self, timeout: Duration) -> bool {
        match &self.wakeup {
            Some(rx) => match rx.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            },
            None => {
                std::thread::sleep(timeout);
                self.is_cancelled()
            },
        }
    }
}
