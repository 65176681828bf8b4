//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义 crate 级统一的 `AppError` 枚举，对外接口统一返回 `Result<T, AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `CompressError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于跨 IPC / JS 边界上报。

use serde::Serialize;

use crate::compressor::CompressError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 压缩流水线错误（解码 / 编码 / 格式 / 资源限制）
    #[error("{0}")]
    Compress(#[from] CompressError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 输入数据格式不正确（如 Data URL）
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 重建或提交文件列表失败
    #[error("选择重建失败: {0}")]
    Selection(String),

    /// 绑定时没有可用的 tokio 运行时
    #[error("运行时不可用: {0}")]
    Runtime(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
