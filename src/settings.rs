//! 全局设置模块
//!
//! # 设计思路
//!
//! 边框颜色、目标宽高比、输出格式是所有图片共享的三项全局设置。
//! 渲染时只读；任一项变更都会触发所有图片按顺序重新渲染（见 `ImageHandler::update_settings`）。
//!
//! # 实现思路
//!
//! - 三项设置均可 serde 序列化，前端以 JSON 传入。
//! - 颜色解析交给 `csscolorparser`，接受任意 CSS 颜色写法。
//! - 不做跨会话持久化。

use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::image_handler::ContainerType;

/// 边框颜色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BorderColor(pub Rgba<u8>);

impl Default for BorderColor {
    fn default() -> Self {
        Self(Rgba([0, 0, 0, 255]))
    }
}

impl BorderColor {
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(Rgba([r, g, b, a]))
    }

    /// 解析任意 CSS 颜色字符串（十六进制、`rgb()`/`rgba()`、`hsl()`/`hwb()`、颜色名等）。
    ///
    /// # 示例
    /// ```rust
    /// use letterbox_studio::settings::BorderColor;
    ///
    /// let c = BorderColor::parse("#fff")?;
    /// assert_eq!(c, BorderColor::rgba(255, 255, 255, 255));
    /// # Ok::<(), letterbox_studio::error::AppError>(())
    /// ```
    pub fn parse(spec: &str) -> Result<Self, AppError> {
        let spec = spec.trim();
        let parsed: csscolorparser::Color = spec
            .parse()
            .map_err(|e| AppError::Settings(format!("无法识别的颜色：{}（{}）", spec, e)))?;
        Ok(Self(Rgba(parsed.to_rgba8())))
    }
}

impl fmt::Display for BorderColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

impl TryFrom<String> for BorderColor {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BorderColor> for String {
    fn from(color: BorderColor) -> Self {
        color.to_string()
    }
}

/// 目标宽高比（固定枚举集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "9:16")]
    Story9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        Self::Square,
        Self::Portrait4x5,
        Self::Portrait3x4,
        Self::Portrait2x3,
        Self::Story9x16,
        Self::Landscape16x9,
        Self::Landscape4x3,
        Self::Landscape3x2,
    ];

    /// `(ratio_w, ratio_h)`。
    pub fn ratio(self) -> (u32, u32) {
        match self {
            Self::Square => (1, 1),
            Self::Portrait4x5 => (4, 5),
            Self::Portrait3x4 => (3, 4),
            Self::Portrait2x3 => (2, 3),
            Self::Story9x16 => (9, 16),
            Self::Landscape16x9 => (16, 9),
            Self::Landscape4x3 => (4, 3),
            Self::Landscape3x2 => (3, 2),
        }
    }

    /// 文件名中使用的标签，例如 `4x5`。
    pub fn label(self) -> String {
        let (w, h) = self.ratio();
        format!("{}x{}", w, h)
    }
}

/// 输出格式：`auto` 沿用原图容器，否则使用指定容器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Auto,
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// 解析出实际导出容器。
    ///
    /// `auto` 下原图容器不可编码（gif、bmp 等）时回退 PNG。
    pub fn resolve(self, source_mime: &str) -> ContainerType {
        match self {
            Self::Auto => ContainerType::from_mime(source_mime).unwrap_or(ContainerType::Png),
            Self::Png => ContainerType::Png,
            Self::Jpeg => ContainerType::Jpeg,
            Self::Webp => ContainerType::Webp,
        }
    }
}

/// 全局设置（渲染时只读）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    pub border_color: BorderColor,
    pub aspect_ratio: AspectRatio,
    pub output_format: OutputFormat,
}

impl GlobalSettings {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::Settings(format!("解析设置失败: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))
    }
}
