//! # 文件模型
//!
//! ## 设计思路
//!
//! `SelectedFile` 对应用户在上传控件中选中的单个文件：名称、MIME 标记、字节负载。
//! 负载使用 `bytes::Bytes`，克隆只增加引用计数，整条流水线都按只读方式消费。
//!
//! `FileCollection` 是控件持有的有序文件列表，顺序即用户选择顺序，
//! 只允许整体替换，不提供逐项修改的接口。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// 无法识别类型时使用的 MIME。
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// 用户选中的单个文件（不可变）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    bytes: Bytes,
    last_modified: DateTime<Utc>,
}

impl SelectedFile {
    /// 以当前时间作为修改时间创建文件。
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            last_modified: Utc::now(),
        }
    }

    /// 指定修改时间。
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// 从本地路径读取文件，MIME 通过文件签名推断。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use upload_compressor::SelectedFile;
    ///
    /// # async fn demo() -> Result<(), upload_compressor::AppError> {
    /// let file = SelectedFile::from_path("/tmp/photo.png").await?;
    /// assert_eq!(file.name(), "photo.png");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        log::debug!("📁 读取本地文件 - 路径: {}", path.display());

        let bytes = tokio::fs::read(path).await?;
        let metadata = tokio::fs::metadata(path).await?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| OCTET_STREAM_MIME.to_string());
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            name,
            mime_type,
            bytes: Bytes::from(bytes),
            last_modified,
        })
    }

    /// 从 Data URL（`data:<mime>;base64,<payload>`）构建文件。
    pub fn from_data_url(name: impl Into<String>, data_url: &str) -> Result<Self, AppError> {
        let normalized = data_url.trim();
        let rest = normalized
            .strip_prefix("data:")
            .ok_or_else(|| AppError::InvalidInput("缺少 data: 前缀".to_string()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| AppError::InvalidInput("缺少 base64 标记".to_string()))?;

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| AppError::InvalidInput(format!("Base64 解码失败：{}", e)))?;

        let mime_type = if mime_type.is_empty() { OCTET_STREAM_MIME } else { mime_type };
        Ok(Self::new(name, mime_type, bytes))
    }

    /// 编码为 Data URL。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// MIME 是否属于图片族（`image/...`）。
    ///
    /// 只看标记，不看内容；标记为图片但内容损坏的文件由解码阶段报错。
    pub fn is_image(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("image")
    }
}

/// 有序文件列表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCollection {
    files: Vec<SelectedFile>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedFile> {
        self.files.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SelectedFile> {
        self.files.get(index)
    }

    /// 全部文件的字节总数。
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.len() as u64).sum()
    }

    pub fn into_vec(self) -> Vec<SelectedFile> {
        self.files
    }
}

impl From<Vec<SelectedFile>> for FileCollection {
    fn from(files: Vec<SelectedFile>) -> Self {
        Self { files }
    }
}

impl FromIterator<SelectedFile> for FileCollection {
    fn from_iter<I: IntoIterator<Item = SelectedFile>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = &'a SelectedFile;
    type IntoIter = std::slice::Iter<'a, SelectedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl IntoIterator for FileCollection {
    type Item = SelectedFile;
    type IntoIter = std::vec::IntoIter<SelectedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn image_family_is_detected_from_mime_tag() {
        assert!(SelectedFile::new("a.png", "image/png", vec![1]).is_image());
        assert!(SelectedFile::new("a.svg", "IMAGE/svg+xml", vec![1]).is_image());
        assert!(!SelectedFile::new("a.pdf", "application/pdf", vec![1]).is_image());
        assert!(!SelectedFile::new("a", "", vec![1]).is_image());
    }

    #[test]
    fn data_url_round_trip_keeps_mime_and_bytes() {
        let original = SelectedFile::new("dot.png", "image/png", PNG_SIGNATURE.to_vec());
        let url = original.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed = SelectedFile::from_data_url("dot.png", &url).expect("parse data url failed");
        assert_eq!(parsed.mime_type(), "image/png");
        assert_eq!(parsed.bytes(), original.bytes());
    }

    #[test]
    fn data_url_without_base64_marker_is_rejected() {
        let result = SelectedFile::from_data_url("x", "data:image/png,abcd");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = SelectedFile::from_data_url("x", "image/png;base64,abcd");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn from_path_sniffs_mime_from_signature() {
        let mut tmp = tempfile::Builder::new()
            .suffix(".bin")
            .tempfile()
            .expect("create temp file failed");
        tmp.write_all(&PNG_SIGNATURE).expect("write temp file failed");
        tmp.write_all(&[0u8; 16]).expect("write temp file failed");

        let file = SelectedFile::from_path(tmp.path()).await.expect("read file failed");
        assert_eq!(file.mime_type(), "image/png");
        assert_eq!(file.len(), 24);
        assert!(file.name().ends_with(".bin"));
    }

    #[tokio::test]
    async fn from_path_falls_back_to_octet_stream() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file failed");
        tmp.write_all(b"plain text content").expect("write temp file failed");

        let file = SelectedFile::from_path(tmp.path()).await.expect("read file failed");
        assert_eq!(file.mime_type(), OCTET_STREAM_MIME);
    }

    #[tokio::test]
    async fn from_path_reports_missing_file_as_io_error() {
        let result = SelectedFile::from_path("/definitely/not/here.png").await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn collection_preserves_order_and_totals() {
        let files: FileCollection = vec![
            SelectedFile::new("a", "text/plain", vec![0u8; 3]),
            SelectedFile::new("b", "text/plain", vec![0u8; 5]),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(files.total_bytes(), 8);
    }
}
