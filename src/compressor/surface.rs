//! # 中间模型
//!
//! - `DecodedSurface`：解码阶段输出，RGBA 像素网格，归一次编码调用独占
//! - `RecompressedFile`：编码阶段输出，外形与 `SelectedFile` 一致，附带压缩统计

use image::RgbaImage;

use crate::upload::SelectedFile;

/// 解码后的像素数据。
pub struct DecodedSurface {
    pub(crate) pixels: RgbaImage,
}

impl DecodedSurface {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// 是否存在非不透明像素。
    pub fn has_transparency(&self) -> bool {
        self.pixels.pixels().any(|p| p.0[3] != u8::MAX)
    }
}

/// 重新编码后的文件。
///
/// 文件名保持原样，不随新编码改扩展名；MIME 为实际产出的编码类型。
#[derive(Debug, Clone)]
pub struct RecompressedFile {
    file: SelectedFile,
    original_size: usize,
    width: u32,
    height: u32,
}

impl RecompressedFile {
    pub(crate) fn new(file: SelectedFile, original_size: usize, width: u32, height: u32) -> Self {
        Self {
            file,
            original_size,
            width,
            height,
        }
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub fn into_file(self) -> SelectedFile {
        self.file
    }

    pub fn original_size(&self) -> usize {
        self.original_size
    }

    pub fn compressed_size(&self) -> usize {
        self.file.len()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 压缩后体积 / 原体积；原体积为 0 时返回 1.0。
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.compressed_size() as f64 / self.original_size as f64
    }
}
