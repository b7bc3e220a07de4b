//! 帧缓冲区与帧类别
//!
//! 所有帧长度都不超过 16 字节，使用栈上的 `SmallVec` 避免堆分配。

use crate::ProtocolError;
use crate::constants::*;
use smallvec::SmallVec;

/// 帧缓冲区类型（栈上预留 16 字节，覆盖最长的下行指令帧）
pub type FrameBuffer = SmallVec<[u8; MAX_COMMAND_LENGTH]>;

/// 帧类别
///
/// 决定下行长度上限、应答读取上限以及合法的应答长度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// 指令帧：设备只回 6 字节确认（含错误码）
    Command,
    /// 请求帧：设备回带数据字段的应答
    Request,
}

impl FrameKind {
    /// 下行帧长度上限
    pub const fn max_tx_len(self) -> usize {
        match self {
            FrameKind::Command => MAX_COMMAND_LENGTH,
            FrameKind::Request => MAX_REQUEST_LENGTH,
        }
    }

    /// 读取应答时，帧头之后最多再读取的字节数
    pub const fn max_rx_len(self) -> usize {
        MAX_REQUEST_LENGTH
    }

    /// 合法的应答长度
    pub const fn answer_lengths(self) -> &'static [usize] {
        match self {
            FrameKind::Command => COMMAND_ANSWER_LENGTHS,
            FrameKind::Request => REQUEST_ANSWER_LENGTHS,
        }
    }
}

/// 上行原始帧（由链路读取器组装，尚未校验）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    bytes: FrameBuffer,
}

impl RawFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: SmallVec::from_slice(bytes),
        }
    }

    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn last(&self) -> Option<u8> {
        self.bytes.last().copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// 校验帧结构：帧头、帧尾、长度
    ///
    /// 长度先于帧头帧尾检查，过短的帧不会越界访问。
    pub fn validate(&self, kind: FrameKind) -> Result<(), ProtocolError> {
        let len = self.bytes.len();
        let expected = kind.answer_lengths();
        if !expected.contains(&len) {
            return Err(ProtocolError::InvalidLength {
                expected,
                actual: len,
            });
        }
        if self.bytes[0] != RX_HEADER {
            return Err(ProtocolError::MalformedFrame {
                reason: "bad header byte",
            });
        }
        if self.bytes[len - 1] != FOOTER {
            return Err(ProtocolError::MalformedFrame {
                reason: "bad footer byte",
            });
        }
        Ok(())
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
