//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中性能档位（quality / balanced / speed）作为高层语义，映射到预览尺寸、
//! 预览代理图尺寸与降采样滤镜的组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `ImagePerformanceProfile` 负责档位字符串解析与反向输出。
//! - `apply_performance_profile` 将档位转换为具体阈值。
//! - `infer_performance_profile` 用于从当前配置反推档位（给前端展示状态）。
//! - 导出始终使用原图全分辨率，档位只影响交互预览。

use image::imageops::FilterType;

use super::ImageError;

/// 图片处理配置。
///
/// 字段覆盖了加载校验、解码限制、交互预览与导出编码四个阶段。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 上传文件允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 交互预览画布的最长边（像素），决定预览的 render scale。
    pub preview_max_dimension: u32,
    /// 预览代理图的最长边（像素）。
    ///
    /// 预览只从代理图取样，导出只从原图取样。
    pub proxy_max_dimension: u32,
    /// 生成代理图时的降采样滤镜。
    pub resize_filter: FilterType,
    /// 有损编码质量（1~100），默认取最大值。
    pub jpeg_quality: u8,
    /// 缩放滑杆下限（百分比，必须为正）。
    pub zoom_min_percent: f64,
    /// 缩放滑杆上限（百分比）。
    pub zoom_max_percent: f64,
    /// 是否接受 MIME 不是 `image/*` 的文件（默认拒绝）。
    pub accept_non_image_mime: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            preview_max_dimension: 720,
            proxy_max_dimension: 2048,
            resize_filter: FilterType::Triangle,
            jpeg_quality: 100,
            zoom_min_percent: 10.0,
            zoom_max_percent: 400.0,
            accept_non_image_mime: false,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：预览尽量保真
/// - `Balanced`：质量与性能平衡
/// - `Speed`：优先预览刷新速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use letterbox_studio::image_handler::ImagePerformanceProfile;
    ///
    /// let p = ImagePerformanceProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), letterbox_studio::image_handler::ImageError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidFormat(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供前端展示。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ImageConfig {
    /// 基于当前参数反推性能档位。
    pub fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        if self.preview_max_dimension >= 1080 && self.proxy_max_dimension >= 4096 {
            return ImagePerformanceProfile::Quality;
        }

        if self.preview_max_dimension <= 480 || self.proxy_max_dimension <= 1024 {
            return ImagePerformanceProfile::Speed;
        }

        ImagePerformanceProfile::Balanced
    }

    /// 应用指定性能档位到实际参数。
    pub fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        match profile {
            ImagePerformanceProfile::Quality => {
                self.preview_max_dimension = 1080;
                self.proxy_max_dimension = 4096;
                self.resize_filter = FilterType::CatmullRom;
            }
            ImagePerformanceProfile::Balanced => {
                self.preview_max_dimension = 720;
                self.proxy_max_dimension = 2048;
                self.resize_filter = FilterType::Triangle;
            }
            ImagePerformanceProfile::Speed => {
                self.preview_max_dimension = 480;
                self.proxy_max_dimension = 1024;
                self.resize_filter = FilterType::Nearest;
            }
        }
    }

    /// 将缩放值约束到滑杆范围内。
    ///
    /// 非正数与非有限值直接拒绝：合成器本身不做防御。
    pub fn clamp_zoom(&self, zoom_percent: f64) -> Result<f64, ImageError> {
        if !zoom_percent.is_finite() || zoom_percent <= 0.0 {
            return Err(ImageError::InvalidGeometry(format!(
                "缩放比例必须为正数：{}",
                zoom_percent
            )));
        }
        Ok(zoom_percent.clamp(self.zoom_min_percent, self.zoom_max_percent))
    }
}
