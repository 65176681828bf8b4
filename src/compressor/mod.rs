//! # 图片压缩模块（compressor）
//!
//! ## 设计思路
//!
//! 将“解码 → 铺底重绘 → 有损编码”按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排单文件与整次选择的处理
//! - `decoder`：格式判定、尺寸上限、完整解码
//! - `encoder`：白底合成与按质量序列化
//! - `config/error/surface`：配置、错误、中间数据模型
//!
//! ```text
//! SelectedFile
//!    ↓
//! decoder.rs（MIME 判定 + header 尺寸检查 + 解码）
//!    ↓ DecodedSurface
//! encoder.rs（白底铺满 + alpha 合成 + JPEG/PNG 序列化）
//!    ↓
//! RecompressedFile（原文件名 + 新 MIME）
//! ```

mod config;
pub mod decoder;
pub mod encoder;
mod error;
mod handler;
mod surface;

pub use config::{CompressionProfile, CompressorConfig, DEFAULT_OUTPUT_MIME, DEFAULT_QUALITY, OutputFormat};
pub use error::CompressError;
pub use handler::ImageCompressor;
pub use surface::{DecodedSurface, RecompressedFile};
