//! 协议常量定义

// ============================================================================
// 帧结构
// ============================================================================

/// 下行帧帧头
pub const TX_HEADER: u8 = 0xFF;

/// 上行帧帧头
pub const RX_HEADER: u8 = 0xFE;

/// 帧尾（上下行相同）
pub const FOOTER: u8 = 0xEF;

/// 下行帧固定前缀：帧头 + 设备地址 `30 30` + 保留字节
pub const TX_PREAMBLE: [u8; 4] = [TX_HEADER, 0x30, 0x30, 0x00];

/// 应答帧中错误码所在偏移
pub const ERROR_CODE_OFFSET: usize = 3;

/// 应答帧中第一个数据字段的偏移
pub const PAYLOAD_OFFSET: usize = 5;

/// 单个 16 位字段的 ASCII 十六进制字符数
pub const HEX_FIELD_WIDTH: usize = 4;

// ============================================================================
// 长度限制
// ============================================================================

/// 下行指令帧最大长度
pub const MAX_COMMAND_LENGTH: usize = 16;

/// 下行请求帧 / 上行请求应答帧最大长度
pub const MAX_REQUEST_LENGTH: usize = 14;

/// 指令应答帧固定长度
pub const COMMAND_ANSWER_LENGTH: usize = 6;

/// 请求应答帧允许的长度
pub const REQUEST_ANSWER_LENGTHS: &[usize] = &[6, 8, 14];

/// 指令应答帧允许的长度
pub const COMMAND_ANSWER_LENGTHS: &[usize] = &[COMMAND_ANSWER_LENGTH];

// ============================================================================
// 操作码
// ============================================================================

/// 电源开关
pub const OP_POWER: u8 = 0xA0;

/// 控制模式（主机控制）
pub const OP_CONTROL_MODE: u8 = 0x90;

/// 俯仰范围设置
pub const OP_TILT_RANGE: u8 = 0x64;

/// 绝对水平/俯仰位置设置
pub const OP_SET_PAN_TILT: u8 = 0x62;

/// 绝对水平/俯仰位置查询
pub const OP_GET_PAN_TILT: u8 = 0x63;

/// 绝对变焦位置设置
pub const OP_SET_ZOOM: u8 = 0xB3;

/// 绝对变焦位置查询
pub const OP_GET_ZOOM: u8 = 0xA4;

/// 参数字节：开启 / 选择
pub const ARG_ON: u8 = 0x31;

/// 参数字节：关闭 / 主机控制模式
pub const ARG_OFF: u8 = 0x30;

// ============================================================================
// 物理范围
// ============================================================================

/// 水平角最大值（度，对称）
pub const PAN_MAX_DEG: f64 = 98.0;

/// 俯仰角最小值（度）
pub const TILT_MIN_DEG: f64 = -30.0;

/// 俯仰角最大值（度）
pub const TILT_MAX_DEG: f64 = 88.0;

/// 变焦最大值（设备单位）
pub const ZOOM_MAX: u16 = 2140;

/// 每个设备单位对应的角度（度）
pub const DEG_PER_UNIT: f64 = 0.1125;

/// 设备单位零点偏移
pub const UNIT_ORIGIN: u16 = 0x8000;
