//! # 变换合成模块
//!
//! ## 设计思路
//!
//! 同一个合成函数服务两种保真度：导出（`render_scale = 1.0`）与交互预览（`render_scale < 1.0`）。
//! 以画布中心为局部坐标原点，正向变换固定为：
//!
//! ```text
//! 画布点 = 翻转 · 旋转 · 缩放(zoom × render_scale) · (图像点 - 图像中心 + offset / zoom)
//! ```
//!
//! 顺序不可调换：同时存在翻转与非零旋转时，不同顺序得到不同画面。
//!
//! ## 实现思路
//!
//! - 先用边框色填满整张画布，未被图像覆盖的区域即为边框。
//! - 对每个目标像素做逆映射回原图的“自然坐标”，落在原图范围内则双线性取样并 source-over 混合。
//! - 偏移只除以 zoom，绝不除以 render scale；render scale 只通过缩放项作用于像素位置。
//! - 取样源可以是原图或预览代理图：数学统一在自然坐标下完成，代理图只是取样细节。
//! - 旋转只取 90° 倍数，`cos/sin` 查表得到精确值，翻转与 180° 旋转可以逐像素抵消。
//!
//! 合成器不校验 zoom 等参数（由控制层保证）；非法值只会得到无意义的画面，不会 panic。

use image::{Rgba, RgbaImage};

use super::geometry::CanvasSize;
use super::source::SourceImage;
use super::transform::TransformState;

/// 渲染目标：输出像素尺寸与边框色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub size: CanvasSize,
    pub border: Rgba<u8>,
}

impl RenderTarget {
    pub fn new(size: CanvasSize, border: Rgba<u8>) -> Self {
        Self { size, border }
    }

    /// 按 render scale 缩小后的预览目标。
    pub fn scaled(&self, render_scale: f64) -> Self {
        Self {
            size: self.size.scaled(render_scale),
            border: self.border,
        }
    }
}

/// 取样源：像素数据 + 原图自然尺寸。
#[derive(Debug, Clone, Copy)]
pub struct SourceView<'a> {
    pub raster: &'a RgbaImage,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl<'a> SourceView<'a> {
    /// 全分辨率取样（导出）。
    pub fn full(source: &'a SourceImage) -> Self {
        Self {
            raster: source.pixels(),
            natural_width: source.width,
            natural_height: source.height,
        }
    }

    /// 代理图取样（预览）。
    pub fn preview(source: &'a SourceImage) -> Self {
        Self {
            raster: source.preview_pixels(),
            natural_width: source.width,
            natural_height: source.height,
        }
    }

    /// 直接以一张栅格作为原图。
    pub fn from_raster(raster: &'a RgbaImage) -> Self {
        Self {
            raster,
            natural_width: raster.width(),
            natural_height: raster.height(),
        }
    }
}

/// 将原图按变换状态合成到带边框的画布上。
///
/// `target.size` 是实际输出像素尺寸；预览时应传入按 `render_scale` 缩小后的目标。
pub fn render(
    target: &RenderTarget,
    source: SourceView<'_>,
    state: &TransformState,
    render_scale: f64,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(target.size.width, target.size.height, target.border);

    if source.raster.width() == 0 || source.raster.height() == 0 {
        return canvas;
    }

    let zoom = state.zoom_scale();
    let inv_scale = 1.0 / (zoom * render_scale);
    let (cos, sin) = state.rotation.cos_sin();
    let flip_x = if state.flip_horizontal { -1.0 } else { 1.0 };
    let flip_y = if state.flip_vertical { -1.0 } else { 1.0 };

    let center_x = target.size.width as f64 / 2.0;
    let center_y = target.size.height as f64 / 2.0;

    let natural_width = source.natural_width as f64;
    let natural_height = source.natural_height as f64;

    // 偏移以全分辨率单位存储，只除以 zoom
    let anchor_x = natural_width / 2.0 - state.offset_x / zoom;
    let anchor_y = natural_height / 2.0 - state.offset_y / zoom;

    let sample_scale_x = source.raster.width() as f64 / natural_width;
    let sample_scale_y = source.raster.height() as f64 / natural_height;

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        // 逆翻转
        let local_x = (x as f64 + 0.5 - center_x) * flip_x;
        let local_y = (y as f64 + 0.5 - center_y) * flip_y;

        // 逆旋转
        let rotated_x = local_x * cos + local_y * sin;
        let rotated_y = -local_x * sin + local_y * cos;

        // 逆缩放，回到原图自然坐标
        let u = rotated_x * inv_scale + anchor_x;
        let v = rotated_y * inv_scale + anchor_y;

        // 写成取反形式，NaN 也落到边框
        if !(u >= 0.0 && u < natural_width && v >= 0.0 && v < natural_height) {
            continue;
        }

        let sample = bilinear_sample(
            source.raster,
            u * sample_scale_x - 0.5,
            v * sample_scale_y - 0.5,
        );
        *pixel = blend_over(sample, *pixel);
    }

    canvas
}

/// 边缘钳制的双线性取样。
fn bilinear_sample(img: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
    let max_x = img.width() as i64 - 1;
    let max_y = img.height() as i64 - 1;
    let x = x.clamp(0.0, max_x as f64);
    let y = y.clamp(0.0, max_y as f64);

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let fetch = |sx: i64, sy: i64| -> [f32; 4] {
        let p = img.get_pixel(sx as u32, sy as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x1, y0);
    let bl = fetch(x0, y1);
    let br = fetch(x1, y1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        out[c] = lerp(top, bot, fy);
    }
    out
}

/// source-over：取样像素盖在边框色之上。
fn blend_over(src: [f32; 4], dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = src[3] / 255.0;
    if src_a >= 1.0 {
        return Rgba([
            src[0].round().clamp(0.0, 255.0) as u8,
            src[1].round().clamp(0.0, 255.0) as u8,
            src[2].round().clamp(0.0, 255.0) as u8,
            255,
        ]);
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
