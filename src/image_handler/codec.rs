//! # 编解码接口
//!
//! ## 设计思路
//!
//! 解码器与编码器属于外部协作方，核心只依赖两个 trait：
//! - `ImageDecoder`：字节 → 像素（失败即 `ImageError::Decode` / `InvalidFormat`）
//! - `RasterEncoder`：像素 + 容器类型 + 质量 → 字节
//!
//! 默认实现 `ImageCrateCodec` 基于 `image` crate；测试可注入自定义实现（例如模拟编码失败）。

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{ImageConfig, ImageError};

/// 导出容器类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Png,
    Jpeg,
    Webp,
}

impl ContainerType {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// 从 MIME 解析；不可编码的容器（gif、bmp 等）返回 `None`。
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// 解码器输出。
#[derive(Debug)]
pub struct DecodedImage {
    pub pixels: RgbaImage,
    /// 预览代理图；`None` 表示原图已足够小，预览直接使用原图。
    pub preview_pixels: Option<RgbaImage>,
    /// 由文件内容识别出的容器 MIME。
    pub mime_hint: String,
}

/// 图片解码器。
///
/// `config` 携带体积/像素上限与预览代理图尺寸。
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], config: &ImageConfig) -> Result<DecodedImage, ImageError>;
}

/// 栅格编码器。
pub trait RasterEncoder: Send + Sync {
    fn encode(
        &self,
        raster: &RgbaImage,
        container: ContainerType,
        quality: u8,
    ) -> Result<Vec<u8>, ImageError>;
}

/// 基于 `image` crate 的默认编解码实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageDecoder for ImageCrateCodec {
    fn decode(&self, bytes: &[u8], config: &ImageConfig) -> Result<DecodedImage, ImageError> {
        super::pipeline::decode_with_limits(bytes, config)
    }
}

impl RasterEncoder for ImageCrateCodec {
    fn encode(
        &self,
        raster: &RgbaImage,
        container: ContainerType,
        quality: u8,
    ) -> Result<Vec<u8>, ImageError> {
        let mut cursor = Cursor::new(Vec::new());

        match container {
            ContainerType::Jpeg => {
                // JPEG 不支持透明通道，先转 RGB
                let rgb = DynamicImage::ImageRgba8(raster.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100))
                    .encode_image(&rgb)
                    .map_err(|e| ImageError::Encode(format!("JPEG 编码失败：{}", e)))?;
            }
            ContainerType::Png => raster
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(|e| ImageError::Encode(format!("PNG 编码失败：{}", e)))?,
            ContainerType::Webp => raster
                .write_to(&mut cursor, ImageFormat::WebP)
                .map_err(|e| ImageError::Encode(format!("WebP 编码失败：{}", e)))?,
        }

        Ok(cursor.into_inner())
    }
}
