//! 上传控件模块
//!
//! # 设计思路
//!
//! 统一管理与页面上传控件相关的能力：
//! - **文件模型**：`SelectedFile` / `FileCollection`
//! - **控件抽象**：`UploadControl` trait，外部协作方实现，本 crate 只绑定
//! - **目标识别**：按 accept 过滤串筛选接受位图的控件
//! - **选择重建**：按原顺序组装新列表，并以一次赋值装回控件

mod classifier;
mod file;
mod rebuilder;
mod target;

pub use classifier::{
    SUPPORTED_FORMATS, accepts_supported_format, classify_control, classify_controls, parse_accept_filter,
};
pub use file::{FileCollection, OCTET_STREAM_MIME, SelectedFile};
pub use rebuilder::{SelectionEntry, commit, rebuild};
pub use target::{ChangeListener, MemoryUploadControl, UploadControl, UploadTarget};
