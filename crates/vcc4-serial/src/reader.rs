//! 链路读取器
//!
//! 从链路逐字节组装应答帧：先扫描帧头，再读取到帧尾或长度上限。
//! 结构校验（长度集合、帧头帧尾）由协议层的 `RawFrame::validate` 完成。

use crate::{LinkAdapter, LinkError};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;
use vcc4_protocol::{FOOTER, FrameKind, RX_HEADER, RawFrame};

/// 扫描帧头时最多读取的字节数
pub const DEFAULT_HEADER_SCAN_ATTEMPTS: usize = 8;

/// 读取一帧应答
///
/// 1. 逐字节扫描，丢弃帧头 `0xFE` 之前的字节；读超时也消耗一次尝试。
///    尝试次数用尽仍未见帧头时返回 `NoHeaderFound`。
///    给定 `is_running` 时，每次读取前检查标志，清除后返回 `Cancelled`，
///    因此取消最多延迟一个读超时。
/// 2. 帧头之后最多再读取 `kind.max_rx_len()` 字节，读到帧尾 `0xEF` 立即结束。
///    中途超时或 IO 错误直接返回。
/// 3. 长度上限用尽仍未见帧尾时原样返回，由协议层判定为畸形帧。
pub fn read_frame<L: LinkAdapter + ?Sized>(
    link: &mut L,
    kind: FrameKind,
    header_attempts: usize,
    is_running: Option<&AtomicBool>,
) -> Result<RawFrame, LinkError> {
    let mut frame = RawFrame::new();

    let mut found = false;
    for _ in 0..header_attempts {
        if let Some(flag) = is_running
            && !flag.load(Ordering::Acquire)
        {
            return Err(LinkError::Cancelled);
        }
        match link.read_byte() {
            Ok(RX_HEADER) => {
                found = true;
                break;
            },
            Ok(other) => trace!("Discarding stray byte 0x{:02X} before header", other),
            Err(LinkError::Timeout) => continue,
            Err(e) => return Err(e),
        }
    }
    if !found {
        return Err(LinkError::NoHeaderFound {
            attempts: header_attempts,
        });
    }
    frame.push(RX_HEADER);

    for _ in 0..kind.max_rx_len() {
        let byte = link.read_byte()?;
        frame.push(byte);
        if byte == FOOTER {
            return Ok(frame);
        }
    }

    trace!("Read {} bytes without seeing a footer", frame.len());
    Ok(frame)
}
