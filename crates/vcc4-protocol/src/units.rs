//! 物理单位与设备单位换算
//!
//! 设备以 16 位无符号整数表示角度：`0x8000` 为零点，每单位 0.1125°。
//! 变焦直接使用设备单位（0..=2140）。
//!
//! # 水平方向约定
//!
//! 设备水平角顺时针为正，上层（主机）约定逆时针为正。
//! 取反只在 [`PanTilt::to_device`] / [`DevicePanTilt::to_host`] 这一处边界完成，
//! 每个方向恰好一次。

use crate::constants::*;

/// 运动轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Pan,
    Tilt,
}

impl Axis {
    /// 轴的物理范围（度）
    pub const fn range(self) -> (f64, f64) {
        match self {
            Axis::Pan => (-PAN_MAX_DEG, PAN_MAX_DEG),
            Axis::Tilt => (TILT_MIN_DEG, TILT_MAX_DEG),
        }
    }
}

/// 将角度钳制到轴的物理范围内
///
/// NaN 按 0° 处理；±Inf 钳制到边界。
pub fn clamp_angle(axis: Axis, degrees: f64) -> f64 {
    let (min, max) = axis.range();
    if degrees.is_nan() {
        return 0.0;
    }
    degrees.clamp(min, max)
}

/// 角度（度）转设备单位：`floor(angle / 0.1125) + 0x8000`，先钳制
pub fn to_device_units(degrees: f64, axis: Axis) -> u16 {
    let clamped = clamp_angle(axis, degrees);
    let steps = (clamped / DEG_PER_UNIT).floor() as i32;
    (steps + UNIT_ORIGIN as i32) as u16
}

/// 设备单位转角度（度）：`(value - 0x8000) * 0.1125`
pub fn from_device_units(value: u16) -> f64 {
    (value as i32 - UNIT_ORIGIN as i32) as f64 * DEG_PER_UNIT
}

/// 将变焦值钳制到 [0, 2140]
pub fn clamp_zoom(zoom: i32) -> u16 {
    zoom.clamp(0, ZOOM_MAX as i32) as u16
}

/// 默认俯仰范围（设备单位，`(min, max)`）
pub fn default_tilt_range() -> (u16, u16) {
    (
        to_device_units(TILT_MIN_DEG, Axis::Tilt),
        to_device_units(TILT_MAX_DEG, Axis::Tilt),
    )
}

/// 主机约定下的水平/俯仰角（度，逆时针为正）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanTilt {
    pub pan: f64,
    pub tilt: f64,
}

impl PanTilt {
    pub fn new(pan: f64, tilt: f64) -> Self {
        Self { pan, tilt }
    }

    /// 钳制到物理范围
    pub fn clamped(self) -> Self {
        Self {
            pan: clamp_angle(Axis::Pan, self.pan),
            tilt: clamp_angle(Axis::Tilt, self.tilt),
        }
    }

    /// 转换为设备单位（钳制 + 水平取反）
    pub fn to_device(self) -> DevicePanTilt {
        DevicePanTilt {
            pan: to_device_units(-self.pan, Axis::Pan),
            tilt: to_device_units(self.tilt, Axis::Tilt),
        }
    }
}

/// 设备约定下的水平/俯仰位置（设备单位，顺时针为正）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DevicePanTilt {
    pub pan: u16,
    pub tilt: u16,
}

impl DevicePanTilt {
    /// 设备中心位置
    pub const CENTER: Self = Self {
        pan: UNIT_ORIGIN,
        tilt: UNIT_ORIGIN,
    };

    /// 转换为主机约定（水平取反）
    pub fn to_host(self) -> PanTilt {
        PanTilt {
            pan: -from_device_units(self.pan),
            tilt: from_device_units(self.tilt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_origin() {
        assert_eq!(to_device_units(0.0, Axis::Pan), 0x8000);
        assert_eq!(from_device_units(0x8000), 0.0);
    }

    #[test]
    fn test_clamp_at_boundary() {
        assert_eq!(clamp_angle(Axis::Pan, 150.0), 98.0);
        assert_eq!(clamp_angle(Axis::Pan, -150.0), -98.0);
        assert_eq!(clamp_angle(Axis::Tilt, -90.0), -30.0);
        assert_eq!(clamp_angle(Axis::Tilt, 120.0), 88.0);
        assert_eq!(clamp_zoom(5000), 2140);
        assert_eq!(clamp_zoom(-5), 0);
        assert_eq!(clamp_zoom(1200), 1200);
    }

    #[test]
    fn test_out_of_range_encodes_as_boundary() {
        assert_eq!(
            to_device_units(150.0, Axis::Pan),
            to_device_units(98.0, Axis::Pan)
        );
        assert_eq!(
            to_device_units(-90.0, Axis::Tilt),
            to_device_units(-30.0, Axis::Tilt)
        );
    }

    #[test]
    fn test_nan_maps_to_origin() {
        assert_eq!(to_device_units(f64::NAN, Axis::Tilt), 0x8000);
    }

    #[test]
    fn test_default_tilt_range() {
        // floor(-30 / 0.1125) = -267, floor(88 / 0.1125) = 782
        assert_eq!(default_tilt_range(), (0x8000 - 267, 0x8000 + 782));
        assert_eq!(default_tilt_range(), (0x7EF5, 0x830E));
    }

    #[test]
    fn test_pan_inverted_once_per_direction() {
        let device = PanTilt::new(10.0, 5.0).to_device();
        // 主机 +10°（逆时针）对应设备顺时针负方向
        assert!(device.pan < 0x8000);
        assert!(device.tilt > 0x8000);

        let host = device.to_host();
        assert!((host.pan - 10.0).abs() <= DEG_PER_UNIT + 1e-9);
        assert!((host.tilt - 5.0).abs() <= DEG_PER_UNIT + 1e-9);
    }

    #[test]
    fn test_center() {
        assert_eq!(PanTilt::default().to_device(), DevicePanTilt::CENTER);
        assert_eq!(DevicePanTilt::CENTER.to_host(), PanTilt::new(-0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_pan_roundtrip_within_one_step(p in -98.0f64..=98.0) {
            let recovered = from_device_units(to_device_units(p, Axis::Pan));
            prop_assert!((recovered - p).abs() <= DEG_PER_UNIT + 1e-9);
        }

        #[test]
        fn prop_tilt_roundtrip_within_one_step(t in -30.0f64..=88.0) {
            let recovered = from_device_units(to_device_units(t, Axis::Tilt));
            prop_assert!((recovered - t).abs() <= DEG_PER_UNIT + 1e-9);
        }

        #[test]
        fn prop_zoom_always_in_range(z in any::<i32>()) {
            prop_assert!(clamp_zoom(z) <= ZOOM_MAX);
        }

        #[test]
        fn prop_encoded_pan_within_device_limits(p in any::<f64>()) {
            let units = to_device_units(p, Axis::Pan);
            prop_assert!(units >= to_device_units(-98.0, Axis::Pan));
            prop_assert!(units <= to_device_units(98.0, Axis::Pan));
        }
    }
}
