//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线结果”解耦：
//! - `UploadedFile` 表示上传的原始文件（名称、字节、可选 MIME）
//! - `SourceImage` 表示已解码、之后不再修改的原图（含预览代理图）
//! - `ProcessedResult` 表示一次全分辨率渲染后的编码结果与展示句柄

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::RgbaImage;

use super::codec::ContainerType;
use super::handles::ResultHandle;

/// 上传的原始文件。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 原始文件名（含扩展名）。
    pub name: String,
    /// 原始字节。
    pub bytes: Bytes,
    /// 调用方提供的 MIME；缺省时由字节嗅探。
    pub mime: Option<String>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// 调用方给出的 MIME 优先，否则用 `infer` 嗅探文件头。
    pub fn effective_mime(&self) -> Option<String> {
        self.mime
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.mime_type().to_string()))
    }
}

/// 已解码的原图。
///
/// 像素数据只在解码时写入一次，之后通过 `Arc` 共享只读访问。
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// 上传时的文件名。
    pub file_name: String,
    /// 原图宽度（像素）。
    pub width: u32,
    /// 原图高度（像素）。
    pub height: u32,
    /// 原始容器 MIME，`auto` 导出时作为默认格式。
    pub mime_hint: String,
    pub(crate) pixels: Arc<RgbaImage>,
    pub(crate) preview_pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub(crate) fn new(
        file_name: String,
        mime_hint: String,
        pixels: RgbaImage,
        preview_pixels: Option<RgbaImage>,
    ) -> Self {
        let (width, height) = pixels.dimensions();
        let pixels = Arc::new(pixels);
        let preview_pixels = match preview_pixels {
            Some(proxy) => Arc::new(proxy),
            None => Arc::clone(&pixels),
        };
        Self {
            file_name,
            width,
            height,
            mime_hint,
            pixels,
            preview_pixels,
        }
    }

    /// 全分辨率像素。
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// 预览代理图（可能与原图共享同一份数据）。
    pub fn preview_pixels(&self) -> &RgbaImage {
        &self.preview_pixels
    }

    /// 去掉最后一个扩展名后的文件名主体。
    pub fn base_name(&self) -> &str {
        strip_extension(&self.file_name)
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// 输出文件名的组成部分：`{base_name}_{ratio_label}.{extension}`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    pub base_name: String,
    pub ratio_label: String,
    pub extension: String,
}

impl OutputName {
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.base_name, self.ratio_label, self.extension)
    }
}

/// 全分辨率渲染后的编码结果。
#[derive(Debug, Clone)]
pub struct ProcessedResult {
    pub name: OutputName,
    pub container: ContainerType,
    pub width: u32,
    pub height: u32,
    /// 编码后的字节。
    pub raster: Bytes,
    /// 展示/下载用的临时句柄；结果被替换或移除时释放。
    pub handle: ResultHandle,
}

impl ProcessedResult {
    pub fn file_name(&self) -> String {
        self.name.file_name()
    }

    /// 供前端直接展示的 Data URL。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.container.mime_type(),
            general_purpose::STANDARD.encode(&self.raster)
        )
    }
}
