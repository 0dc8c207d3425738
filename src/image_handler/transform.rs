//! # 变换状态模块
//!
//! 每张图片对应一份 `TransformState`：旋转、缩放、平移、翻转。
//!
//! 平移偏移量始终以“原图全分辨率像素”为单位存储，与最后一次由预览还是导出产生无关。
//! 切换渲染保真度时只改变渲染时的 render scale，从不改写已存储的状态。

use serde::{Deserialize, Serialize};

/// 旋转角度，仅允许 90° 的整数倍。JSON 中表示为整数度数（0 / 90 / 180 / 270）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<u32> for Rotation {
    type Error = String;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(format!("旋转角度必须为 0、90、180 或 270，收到 {}", other)),
        }
    }
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// 从任意整数角度构造（先对 360 取模）；非 90° 倍数返回 `None`。
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg270,
            Self::Deg90 => Self::Deg0,
            Self::Deg180 => Self::Deg90,
            Self::Deg270 => Self::Deg180,
        }
    }

    /// 宽高是否互换（90° / 270°）。
    pub fn swaps_axes(self) -> bool {
        self.degrees() % 180 != 0
    }

    /// 精确的 `(cos, sin)`。
    ///
    /// 使用查表而非三角函数，保证翻转与旋转组合能逐像素抵消。
    pub(crate) fn cos_sin(self) -> (f64, f64) {
        match self {
            Self::Deg0 => (1.0, 0.0),
            Self::Deg90 => (0.0, 1.0),
            Self::Deg180 => (-1.0, 0.0),
            Self::Deg270 => (0.0, -1.0),
        }
    }
}

/// 单张图片的交互变换状态。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    pub rotation: Rotation,
    /// 缩放百分比，默认 100；必须为正。
    pub zoom_percent: f64,
    /// 水平偏移（全分辨率像素）。
    pub offset_x: f64,
    /// 垂直偏移（全分辨率像素）。
    pub offset_y: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            rotation: Rotation::Deg0,
            zoom_percent: 100.0,
            offset_x: 0.0,
            offset_y: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }
}

impl TransformState {
    /// 缩放系数（`zoom_percent / 100`）。
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_percent / 100.0
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_in_both_directions() {
        let mut r = Rotation::Deg0;
        for expected in [90, 180, 270, 0] {
            r = r.clockwise();
            assert_eq!(r.degrees(), expected);
        }
        assert_eq!(Rotation::Deg0.counter_clockwise(), Rotation::Deg270);
        assert_eq!(Rotation::Deg90.counter_clockwise(), Rotation::Deg0);
    }

    #[test]
    fn from_degrees_normalizes_and_rejects_free_angles() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn default_state_matches_documented_defaults() {
        let state = TransformState::default();
        assert_eq!(state.rotation, Rotation::Deg0);
        assert_eq!(state.zoom_percent, 100.0);
        assert_eq!((state.offset_x, state.offset_y), (0.0, 0.0));
        assert!(!state.flip_horizontal && !state.flip_vertical);
        assert!(state.is_default());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(TransformState::default()).expect("serialize");
        assert_eq!(json["rotation"], 0);
        assert_eq!(json["zoomPercent"], 100.0);
        assert_eq!(json["flipHorizontal"], false);
    }

    #[test]
    fn rotation_is_an_integer_in_json() {
        let state = TransformState {
            rotation: Rotation::Deg270,
            ..TransformState::default()
        };
        let json = serde_json::to_value(state).expect("serialize");
        assert_eq!(json["rotation"], 270);

        let parsed: Rotation = serde_json::from_str("90").expect("integer degrees");
        assert_eq!(parsed, Rotation::Deg90);
        assert!(serde_json::from_str::<Rotation>("45").is_err());
        assert!(serde_json::from_str::<Rotation>("\"90\"").is_err());
    }
}
