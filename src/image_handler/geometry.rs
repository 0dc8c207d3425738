//! # 画布几何计算模块
//!
//! 根据原图尺寸、目标宽高比与旋转角度计算输出画布尺寸。
//!
//! # 设计思路
//!
//! - 算法纯函数化：输入为原图宽高、旋转、宽高比，输出唯一尺寸，便于测试。
//! - 先按旋转得出“有效尺寸”（90°/270° 时宽高互换），再与目标比例比较。
//! - 图片相对目标更宽 → 保留宽度、增高画布（上下留边）；否则保留高度、加宽画布（左右留边）。
//! - 结果四舍五入到整数像素。
//!
//! 入参合法性（正尺寸、正比例）由上层保证；这里不做防御，非法输入得到的结果无意义。

use super::transform::Rotation;

/// 画布像素尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// 按 render scale 缩放后的尺寸，至少 1×1。
    pub fn scaled(&self, render_scale: f64) -> Self {
        Self {
            width: ((self.width as f64 * render_scale).round() as u32).max(1),
            height: ((self.height as f64 * render_scale).round() as u32).max(1),
        }
    }
}

/// 计算输出画布尺寸。
///
/// # 参数
/// * `source_width` / `source_height` - 原图像素尺寸（正整数）
/// * `rotation` - 当前旋转角度
/// * `ratio` - 目标宽高比 `(ratio_w, ratio_h)`，两者均为正
///
/// # 示例
/// ```rust
/// use letterbox_studio::image_handler::{resolve_canvas, CanvasSize, Rotation};
///
/// let canvas = resolve_canvas(800, 600, Rotation::Deg0, (1, 1));
/// assert_eq!(canvas, CanvasSize::new(800, 800));
/// ```
pub fn resolve_canvas(
    source_width: u32,
    source_height: u32,
    rotation: Rotation,
    ratio: (u32, u32),
) -> CanvasSize {
    // 步骤 1：旋转 90°/270° 时按互换后的尺寸参与比较
    let (eff_width, eff_height) = if rotation.swaps_axes() {
        (source_height as f64, source_width as f64)
    } else {
        (source_width as f64, source_height as f64)
    };

    let target_ratio = ratio.0 as f64 / ratio.1 as f64;
    let image_ratio = eff_width / eff_height;

    // 步骤 2：沿较“短缺”的一侧扩展画布
    let (width, height) = if image_ratio > target_ratio {
        (eff_width, eff_width / target_ratio)
    } else {
        (eff_height * target_ratio, eff_height)
    };

    CanvasSize {
        width: width.round() as u32,
        height: height.round() as u32,
    }
}

/// 交互预览的 render scale：让画布最长边不超过 `preview_max_dimension`，且不放大。
pub fn preview_render_scale(canvas: CanvasSize, preview_max_dimension: u32) -> f64 {
    let longest = canvas.max_side();
    if longest == 0 || preview_max_dimension == 0 {
        return 1.0;
    }
    (preview_max_dimension as f64 / longest as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_into_square_adds_top_and_bottom_border() {
        let canvas = resolve_canvas(800, 600, Rotation::Deg0, (1, 1));
        assert_eq!(canvas, CanvasSize::new(800, 800));
    }

    #[test]
    fn rotated_landscape_into_square_uses_swapped_axes() {
        // 有效尺寸 600x800，image_ratio = 0.75 < 1 → 高度 800，宽度 800
        let canvas = resolve_canvas(800, 600, Rotation::Deg90, (1, 1));
        assert_eq!(canvas, CanvasSize::new(800, 800));
    }

    #[test]
    fn portrait_ratio_grows_height_for_wide_image() {
        // 1000x500，4:5 → 宽度保持 1000，高度 1250
        let canvas = resolve_canvas(1000, 500, Rotation::Deg0, (4, 5));
        assert_eq!(canvas, CanvasSize::new(1000, 1250));
    }

    #[test]
    fn story_ratio_grows_width_for_tall_image() {
        // 500x2000，9:16：0.25 < 0.5625 → 高度保持 2000，宽度 1125
        let canvas = resolve_canvas(500, 2000, Rotation::Deg0, (9, 16));
        assert_eq!(canvas, CanvasSize::new(1125, 2000));
    }

    #[test]
    fn rotation_270_behaves_like_90() {
        assert_eq!(
            resolve_canvas(640, 480, Rotation::Deg90, (16, 9)),
            resolve_canvas(640, 480, Rotation::Deg270, (16, 9))
        );
        assert_eq!(
            resolve_canvas(640, 480, Rotation::Deg0, (16, 9)),
            resolve_canvas(640, 480, Rotation::Deg180, (16, 9))
        );
    }

    #[test]
    fn exact_ratio_match_adds_no_border() {
        assert_eq!(
            resolve_canvas(1080, 1920, Rotation::Deg0, (9, 16)),
            CanvasSize::new(1080, 1920)
        );
    }

    #[test]
    fn result_is_rounded_to_nearest_pixel() {
        // 101x100 → 4:5：高度 101 / 0.8 = 126.25 → 126
        assert_eq!(
            resolve_canvas(101, 100, Rotation::Deg0, (4, 5)),
            CanvasSize::new(101, 126)
        );
    }

    #[test]
    fn preview_scale_never_upscales() {
        assert_eq!(preview_render_scale(CanvasSize::new(400, 300), 720), 1.0);
        let scale = preview_render_scale(CanvasSize::new(2400, 1200), 720);
        assert!((scale - 0.3).abs() < 1e-12);
        assert_eq!(CanvasSize::new(2400, 1200).scaled(scale), CanvasSize::new(720, 360));
    }
}
