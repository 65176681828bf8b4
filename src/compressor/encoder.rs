//! # 重压缩编码模块
//!
//! ## 实现思路
//!
//! 1. 分配与解码结果同尺寸的画布
//! 2. 绘制前先用不透明背景色（默认白色）铺满整张画布
//! 3. 在 (0, 0) 处按原尺寸做 alpha 合成
//! 4. 按配置的格式与质量序列化
//! 5. 以原文件名包装为 `RecompressedFile`
//!
//! 有损输出无法表达 alpha，不铺底的话透明区域会落到后端默认色（通常是黑色）上。

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbImage, RgbaImage, imageops};

use super::{CompressError, CompressorConfig, DecodedSurface, OutputFormat, RecompressedFile};
use crate::upload::SelectedFile;

/// 把 [0, 1] 的质量系数映射为 JPEG 的 1..=100。
pub fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    scaled.clamp(1, 100)
}

/// 把解码结果压平到不透明背景上。
pub fn flatten_onto_background(surface: &DecodedSurface, background: [u8; 3]) -> RgbImage {
    let (width, height) = surface.dimensions();
    let [r, g, b] = background;

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, u8::MAX]));
    imageops::overlay(&mut canvas, surface.pixels(), 0, 0);

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// 同步编码，供阻塞线程池调用。
///
/// `original` 只提供文件名、修改时间与原始体积，不会被修改。
pub fn encode(
    surface: DecodedSurface,
    original: &SelectedFile,
    config: &CompressorConfig,
) -> Result<RecompressedFile, CompressError> {
    let (width, height) = surface.dimensions();
    let canvas = flatten_onto_background(&surface, config.background);
    drop(surface);

    let format = config.output_format();
    let quality = config.effective_quality();
    let bytes = serialize(&canvas, format, quality)?;

    if bytes.is_empty() {
        return Err(CompressError::Encode(format!("{} 编码结果为空", original.name())));
    }

    log::debug!(
        "📦 编码完成 - 文件: {} 类型: {} 质量: {:.2} 体积: {} -> {} 字节",
        original.name(),
        format.mime_type(),
        quality,
        original.len(),
        bytes.len()
    );

    let file = SelectedFile::new(original.name(), format.mime_type(), bytes)
        .with_last_modified(original.last_modified());

    Ok(RecompressedFile::new(file, original.len(), width, height))
}

/// 在阻塞线程池中编码。
pub async fn encode_async(
    surface: DecodedSurface,
    original: SelectedFile,
    config: CompressorConfig,
) -> Result<RecompressedFile, CompressError> {
    tokio::task::spawn_blocking(move || encode(surface, &original, &config))
        .await
        .map_err(|e| CompressError::Task(format!("编码任务异常退出：{}", e)))?
}

fn serialize(canvas: &RgbImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>, CompressError> {
    let mut cursor = Cursor::new(Vec::new());
    let (width, height) = canvas.dimensions();

    match format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut cursor, jpeg_quality(quality))
                .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| CompressError::Encode(format!("JPEG 编码失败：{}", e)))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut cursor)
                .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| CompressError::Encode(format!("PNG 编码失败：{}", e)))?;
        }
    }

    Ok(cursor.into_inner())
}
