//! # 位图解码模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 按 MIME 标记判断格式是否在可解码范围内
//! 2. 按内容猜测格式并读取 header 尺寸
//! 3. 按像素 / 内存上限快速拒绝
//! 4. 完整解码并转换 RGBA
//!
//! 损坏或截断的数据一律返回 `Decode`，不会静默透传。

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::{CompressError, CompressorConfig, DecodedSurface};
use crate::upload::SelectedFile;

/// 同步解码，供阻塞线程池调用。
pub fn decode(file: &SelectedFile, config: &CompressorConfig) -> Result<DecodedSurface, CompressError> {
    check_declared_format(file)?;

    let bytes = file.bytes();
    if bytes.is_empty() {
        return Err(CompressError::Decode(format!("{} 内容为空", file.name())));
    }
    if bytes.len() as u64 > config.max_file_size {
        return Err(CompressError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            bytes.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| CompressError::Decode(format!("{} 无法识别图片数据：{}", file.name(), e)))?;
    if !format.reading_enabled() {
        return Err(CompressError::UnsupportedFormat(format!(
            "{} 的格式 {:?} 没有可用的解码器",
            file.name(),
            format
        )));
    }

    let (header_width, header_height) = inspect_dimensions(bytes, format)?;
    validate_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| map_image_error(file, e))?;
    let pixels = decoded.to_rgba8();

    log::debug!(
        "🖼️ 解码完成 - 文件: {} 格式: {:?} 尺寸: {}x{}",
        file.name(),
        format,
        pixels.width(),
        pixels.height()
    );

    Ok(DecodedSurface::from_rgba(pixels))
}

/// 在阻塞线程池中解码，互不阻塞的多个解码可以并行推进。
pub async fn decode_async(file: SelectedFile, config: CompressorConfig) -> Result<DecodedSurface, CompressError> {
    tokio::task::spawn_blocking(move || decode(&file, &config))
        .await
        .map_err(|e| CompressError::Task(format!("解码任务异常退出：{}", e)))?
}

/// MIME 标记为图片族但不在可解码范围内时提前拒绝。
fn check_declared_format(file: &SelectedFile) -> Result<(), CompressError> {
    if !file.is_image() {
        return Ok(());
    }

    let mime = file.mime_type().trim().to_ascii_lowercase();

    match ImageFormat::from_mime_type(canonical_mime(&mime)) {
        Some(format) if format.reading_enabled() => Ok(()),
        Some(format) => Err(CompressError::UnsupportedFormat(format!(
            "{} 的格式 {:?} 没有可用的解码器",
            file.name(),
            format
        ))),
        None => Err(CompressError::UnsupportedFormat(format!(
            "{} 的类型 {} 不是可解码的位图",
            file.name(),
            file.mime_type()
        ))),
    }
}

/// 把常见的别名 MIME 归一到标准写法。
fn canonical_mime(mime: &str) -> &str {
    match mime {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        "image/x-png" | "image/apng" => "image/png",
        other => other,
    }
}

/// 仅通过 header 读取宽高。
fn inspect_dimensions(bytes: &[u8], format: ImageFormat) -> Result<(u32, u32), CompressError> {
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| CompressError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn validate_limits(config: &CompressorConfig, width: u32, height: u32) -> Result<(), CompressError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| CompressError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(CompressError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels
        .checked_mul(4)
        .ok_or_else(|| CompressError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(CompressError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

fn map_image_error(file: &SelectedFile, error: image::ImageError) -> CompressError {
    match error {
        image::ImageError::Unsupported(e) => {
            CompressError::UnsupportedFormat(format!("{}：{}", file.name(), e))
        }
        image::ImageError::Limits(e) => CompressError::ResourceLimit(format!("{}：{}", file.name(), e)),
        other => CompressError::Decode(format!("{} 解码失败：{}", file.name(), other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgba};

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
    fn decodes_to_intrinsic_dimensions() {
        let file = SelectedFile::new("a.png", "image/png", create_png_bytes(37, 21));
        let surface = decode(&file, &CompressorConfig::default()).expect("decode should succeed");
        assert_eq!(surface.dimensions(), (37, 21));
        assert!(!surface.has_transparency());
    }

    #[test]
    fn garbage_bytes_with_png_mime_is_decode_error() {
        let file = SelectedFile::new("corrupt.png", "image/png", b"definitely not a png".to_vec());
        let result = decode(&file, &CompressorConfig::default());
        assert!(matches!(result, Err(CompressError::Decode(_))));
    }

    #[test]
    fn truncated_png_is_decode_error() {
        let png = create_png_bytes(64, 64);

        let header_only = SelectedFile::new("cut.png", "image/png", png[..20].to_vec());
        assert!(matches!(
            decode(&header_only, &CompressorConfig::default()),
            Err(CompressError::Decode(_))
        ));

        let half = SelectedFile::new("half.png", "image/png", png[..png.len() / 2].to_vec());
        assert!(matches!(
            decode(&half, &CompressorConfig::default()),
            Err(CompressError::Decode(_))
        ));
    }

    #[test]
    fn non_raster_image_mime_is_unsupported() {
        let svg = SelectedFile::new("logo.svg", "image/svg+xml", b"<svg/>".to_vec());
        assert!(matches!(
            decode(&svg, &CompressorConfig::default()),
            Err(CompressError::UnsupportedFormat(_))
        ));

        let heic = SelectedFile::new("shot.heic", "image/heic", vec![0u8; 32]);
        assert!(matches!(
            decode(&heic, &CompressorConfig::default()),
            Err(CompressError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn jpg_alias_mime_is_accepted() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 8, image::Rgb([10, 20, 30])));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Jpeg).expect("encode jpeg failed");

        let file = SelectedFile::new("a.jpg", "image/jpg", cursor.into_inner());
        let surface = decode(&file, &CompressorConfig::default()).expect("decode should succeed");
        assert_eq!(surface.dimensions(), (8, 8));
    }

    #[test]
    fn legacy_mime_aliases_are_accepted() {
        let png = create_png_bytes(6, 5);
        for mime in ["image/x-png", "image/apng", "IMAGE/PNG"] {
            let file = SelectedFile::new("a.png", mime, png.clone());
            let surface = decode(&file, &CompressorConfig::default()).expect("decode should succeed");
            assert_eq!(surface.dimensions(), (6, 5), "{}", mime);
        }

        let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 3, image::Rgb([1, 2, 3])));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Jpeg).expect("encode jpeg failed");
        let file = SelectedFile::new("a.jpg", "image/pjpeg", cursor.into_inner());
        let surface = decode(&file, &CompressorConfig::default()).expect("decode should succeed");
        assert_eq!(surface.dimensions(), (4, 3));
    }

    #[test]
    fn oversized_image_is_rejected_before_full_decode() {
        let mut config = CompressorConfig::default();
        config.max_decoded_pixels = 1_000;

        let file = SelectedFile::new("big.png", "image/png", create_png_bytes(100, 100));
        assert!(matches!(decode(&file, &config), Err(CompressError::ResourceLimit(_))));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut config = CompressorConfig::default();
        config.max_file_size = 16;

        let file = SelectedFile::new("a.png", "image/png", create_png_bytes(10, 10));
        assert!(matches!(decode(&file, &config), Err(CompressError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn async_decode_matches_sync_decode() {
        let file = SelectedFile::new("a.png", "image/png", create_png_bytes(12, 9));
        let surface = decode_async(file, CompressorConfig::default())
            .await
            .expect("decode should succeed");
        assert_eq!(surface.dimensions(), (12, 9));
    }
}
