//! # 上传图片透明压缩：库入口
//!
//! 拦截用户在上传控件中选中的图片，在文件离开客户端前重新编码为更小的体积，
//! 下游（页面自己的提交逻辑、服务端）看到的仍是一份普通的文件列表。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           宿主页面 / 应用（实现 UploadControl）          │
//! │   accept 过滤串 · 文件列表 · 变更事件                    │
//! └───────┬──────────────────────────────────────▲───────────┘
//!         │ 用户选择                              │ 整体替换列表
//! ┌───────▼──────────────────────────────────────┼───────────┐
//! │  binder ───── CompressionService（代号 + 提交锁）         │
//! │    │                                         │           │
//! │    ├─ upload::classifier   accept → 目标筛选  │           │
//! │    ├─ compressor           解码 → 白底合成 → 编码        │
//! │    └─ upload::rebuilder    按原顺序重建 ──────┘           │
//! │                                                          │
//! │  error ────── AppError（统一错误类型）                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`upload`] | 文件模型、控件抽象、目标识别、选择重建 |
//! | [`compressor`] | 位图解码、铺底重编码、配置与档位 |
//! | [`binder`] | 绑定变更事件，串起整条链路并处理并发选择 |

pub mod binder;
pub mod compressor;
pub mod error;
pub mod upload;

pub use binder::{CompressionService, SelectionOutcome, SelectionReport, SelectionState};
pub use compressor::{
    CompressError, CompressionProfile, CompressorConfig, DecodedSurface, ImageCompressor, OutputFormat,
    RecompressedFile,
};
pub use error::AppError;
pub use upload::{FileCollection, MemoryUploadControl, SelectedFile, UploadControl, UploadTarget};
