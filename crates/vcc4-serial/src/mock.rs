//! Mock 链路
//!
//! 内存中的脚本化串口：写入被记录，读取从接收队列弹出。
//! 可以挂载应答器（responder），在每次写入时根据下行帧生成上行字节，
//! 用于在无硬件的情况下模拟相机。
//!
//! 接收队列为空时 `read_byte` 默认立即返回 `Timeout`；
//! 开启 `block_when_empty` 后先等待当前读超时，模拟真实串口的阻塞读取。

use crate::{LinkAdapter, LinkError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 应答器：输入下行帧，返回要注入接收队列的字节
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockState {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    responder: Option<Responder>,
    fail_writes: bool,
    fail_reads: bool,
    block_when_empty: bool,
    read_timeout: Duration,
    discards: usize,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock 链路（交给被测代码）
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

/// Mock 链路句柄（留在测试代码中，用于注入字节和检查写入）
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    /// 创建空链路
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            read_timeout: Duration::from_secs(1),
            ..Default::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }

    /// 创建带应答器的链路
    pub fn with_responder<F>(responder: F) -> (Self, MockHandle)
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        let (link, handle) = Self::new();
        handle.set_responder(responder);
        (link, handle)
    }
}

impl MockHandle {
    /// 注入接收字节
    pub fn push_rx(&self, bytes: &[u8]) {
        lock(&self.state).rx.extend(bytes.iter().copied());
    }

    /// 接收队列中尚未读取的字节数
    pub fn pending_rx(&self) -> usize {
        lock(&self.state).rx.len()
    }

    /// 所有已写入的帧（按写入顺序）
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    /// 已写入帧数
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes.len()
    }

    /// 清空写入记录
    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }

    /// 替换应答器
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        lock(&self.state).responder = Some(Box::new(responder));
    }

    /// 模拟写入失败
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// 模拟读取 IO 错误
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// 接收队列为空时是否等待读超时
    pub fn block_when_empty(&self, block: bool) {
        lock(&self.state).block_when_empty = block;
    }

    /// 当前读超时（由被测代码设置）
    pub fn read_timeout(&self) -> Duration {
        lock(&self.state).read_timeout
    }

    /// `discard_input` 被调用的次数
    pub fn discard_count(&self) -> usize {
        lock(&self.state).discards
    }
}

impl LinkAdapter for MockLink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if state.fail_writes {
            return Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.writes.push(bytes.to_vec());
        if let Some(responder) = state.responder.as_mut() {
            let reply = responder(bytes);
            state.rx.extend(reply);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        let mut state = lock(&self.state);
        if state.fail_reads {
            return Err(LinkError::Io(std::io::Error::other("mock read failure")));
        }
        if let Some(byte) = state.rx.pop_front() {
            return Ok(byte);
        }
        if state.block_when_empty {
            let timeout = state.read_timeout;
            drop(state);
            std::thread::sleep(timeout);
        }
        Err(LinkError::Timeout)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), LinkError> {
        lock(&self.state).read_timeout = timeout;
        Ok(())
    }

    fn read_timeout(&self) -> Duration {
        lock(&self.state).read_timeout
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        let mut state = lock(&self.state);
        state.rx.clear();
        state.discards += 1;
        Ok(())
    }
}
