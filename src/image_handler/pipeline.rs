//! # 解码与预览代理图流水线
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 校验文件体积
//! 2. 猜测格式并读取 header 尺寸，按像素/内存上限快速拒绝
//! 3. 完整解码并转换 RGBA
//! 4. 超过 `proxy_max_dimension` 时降采样出预览代理图（导出仍用原图）

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use std::io::Cursor;

use super::codec::DecodedImage;
use super::{ImageConfig, ImageError};

/// 带资源限制的完整解码。
pub(crate) fn decode_with_limits(
    bytes: &[u8],
    config: &ImageConfig,
) -> Result<DecodedImage, ImageError> {
    if bytes.len() as u64 > config.max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            bytes.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| ImageError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

    let (header_width, header_height) = inspect_dimensions_from_memory(bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;
    validate_decoded_memory_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Decode(format!("图片尺寸无效：{}x{}", width, height)));
    }
    validate_pixel_limits(config, width, height)?;
    validate_decoded_memory_limits(config, width, height)?;

    let pixels = decoded.to_rgba8();
    let preview_pixels = build_preview_proxy(&pixels, config)?;

    log::info!(
        "✅ 图片解码成功 - 格式: {:?} 尺寸: {}x{} 预览代理: {}",
        format,
        width,
        height,
        preview_pixels
            .as_ref()
            .map(|p| format!("{}x{}", p.width(), p.height()))
            .unwrap_or_else(|| "原图".to_string())
    );

    Ok(DecodedImage {
        pixels,
        preview_pixels,
        mime_hint: format.to_mime_type().to_string(),
    })
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ImageError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn validate_decoded_memory_limits(
    config: &ImageConfig,
    width: u32,
    height: u32,
) -> Result<(), ImageError> {
    let estimated = (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 输出画布同样受像素与内存上限约束：细长图加边框后画布可能远大于原图。
pub(crate) fn validate_canvas_limits(
    config: &ImageConfig,
    width: u32,
    height: u32,
) -> Result<(), ImageError> {
    validate_pixel_limits(config, width, height)
        .and_then(|_| validate_decoded_memory_limits(config, width, height))
        .map_err(|e| match e {
            ImageError::ResourceLimit(msg) => {
                ImageError::ResourceLimit(format!("输出画布 {}x{} 超出限制：{}", width, height, msg))
            }
            other => other,
        })
}

/// 生成交互预览用的代理图；原图不超过上限时返回 `None`。
pub(crate) fn build_preview_proxy(
    pixels: &RgbaImage,
    config: &ImageConfig,
) -> Result<Option<RgbaImage>, ImageError> {
    let (width, height) = pixels.dimensions();
    let limit = config.proxy_max_dimension.max(1);

    if width <= limit && height <= limit {
        return Ok(None);
    }

    let scale = (limit as f64 / width as f64).min(limit as f64 / height as f64);
    let target_width = ((width as f64 * scale).round() as u32).max(1);
    let target_height = ((height as f64 * scale).round() as u32).max(1);

    log::debug!(
        "🧩 生成预览代理图：{}x{} -> {}x{}（filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        config.resize_filter
    );

    match resize_with_fast_image_resize(pixels, target_width, target_height, config.resize_filter) {
        Ok(resized) => Ok(Some(resized)),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
            Ok(Some(
                DynamicImage::ImageRgba8(pixels.clone())
                    .resize_exact(target_width, target_height, config.resize_filter)
                    .into_rgba8(),
            ))
        }
    }
}

fn resize_with_fast_image_resize(
    src: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: image::imageops::FilterType,
) -> Result<RgbaImage, ImageError> {
    let (src_width, src_height) = src.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

fn to_fast_filter(filter: image::imageops::FilterType) -> fr::FilterType {
    match filter {
        image::imageops::FilterType::Nearest => fr::FilterType::Box,
        image::imageops::FilterType::Triangle => fr::FilterType::Bilinear,
        image::imageops::FilterType::CatmullRom => fr::FilterType::CatmullRom,
        image::imageops::FilterType::Gaussian => fr::FilterType::Mitchell,
        image::imageops::FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn decodes_small_png_without_proxy() {
        let decoded = decode_with_limits(&create_png_bytes(64, 48), &ImageConfig::default())
            .expect("decode should succeed");
        assert_eq!(decoded.pixels.dimensions(), (64, 48));
        assert!(decoded.preview_pixels.is_none());
        assert_eq!(decoded.mime_hint, "image/png");
    }

    #[test]
    fn large_source_gets_bounded_proxy() {
        let mut config = ImageConfig::default();
        config.proxy_max_dimension = 100;

        let decoded =
            decode_with_limits(&create_png_bytes(400, 200), &config).expect("decode should succeed");
        let proxy = decoded.preview_pixels.expect("proxy expected");
        assert_eq!(proxy.dimensions(), (100, 50));
        assert_eq!(decoded.pixels.dimensions(), (400, 200));
    }

    #[test]
    fn rejects_too_many_pixels() {
        let mut config = ImageConfig::default();
        config.max_decoded_pixels = 1_000;

        let result = decode_with_limits(&create_png_bytes(100, 100), &config);
        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn rejects_oversized_file() {
        let mut config = ImageConfig::default();
        config.max_file_size = 16;

        let result = decode_with_limits(&create_png_bytes(8, 8), &config);
        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let result = decode_with_limits(b"definitely not an image", &ImageConfig::default());
        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn canvas_limits_use_the_decode_thresholds() {
        let mut config = ImageConfig::default();
        config.max_decoded_pixels = 400;
        config.max_decoded_bytes = 1_600;

        assert!(validate_canvas_limits(&config, 20, 20).is_ok());
        let result = validate_canvas_limits(&config, 400, 400);
        assert!(matches!(result, Err(ImageError::ResourceLimit(msg)) if msg.contains("400x400")));
        assert!(validate_canvas_limits(&config, u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let mut bytes = create_png_bytes(32, 32);
        bytes.truncate(bytes.len() / 2);
        let result = decode_with_limits(&bytes, &ImageConfig::default());
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }
}
