//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载压缩链路中的所有错误来源，调用侧可按分支匹配。
//! 任一文件出错都会中止整次选择的提交，因此这里不区分“可跳过”的错误。

/// 压缩流水线统一错误类型。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompressError {
    /// 负载不是可解码的位图（损坏、截断、无法识别）。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 序列化失败或没有产出任何字节。
    #[error("编码错误：{0}")]
    Encode(String),

    /// MIME 属于图片族，但不在可解码格式范围内。
    #[error("不支持的格式：{0}")]
    UnsupportedFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("配置无效：{0}")]
    InvalidConfig(String),

    /// 后台解码/编码任务异常退出。
    #[error("任务执行失败：{0}")]
    Task(String),
}
