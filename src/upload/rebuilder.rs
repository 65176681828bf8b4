//! # 选择重建
//!
//! ## 设计思路
//!
//! 按原顺序把“透传文件 / 重压缩文件”重新组装为 `FileCollection`，
//! 再以一次赋值装回控件，不对控件上的旧列表做任何逐项修改，
//! 并发读取方（例如页面自己的提交逻辑）永远看不到半成品。

use super::{FileCollection, SelectedFile, UploadTarget};
use crate::compressor::RecompressedFile;
use crate::error::AppError;

/// 单个位置上的处理结果。
#[derive(Debug, Clone)]
pub enum SelectionEntry {
    /// 非图片文件，原样保留。
    Passthrough(SelectedFile),
    /// 图片文件的重压缩结果。
    Recompressed(RecompressedFile),
}

impl SelectionEntry {
    pub fn file(&self) -> &SelectedFile {
        match self {
            Self::Passthrough(file) => file,
            Self::Recompressed(recompressed) => recompressed.file(),
        }
    }

    pub fn into_file(self) -> SelectedFile {
        match self {
            Self::Passthrough(file) => file,
            Self::Recompressed(recompressed) => recompressed.into_file(),
        }
    }
}

/// 按原顺序重建文件列表。
///
/// 条目数必须与原列表一致，第 i 个条目必须对应原列表第 i 个文件。
pub fn rebuild(original: &FileCollection, entries: Vec<SelectionEntry>) -> Result<FileCollection, AppError> {
    if entries.len() != original.len() {
        return Err(AppError::Selection(format!(
            "重建条目数 {} 与原选择数 {} 不一致",
            entries.len(),
            original.len()
        )));
    }

    for (index, (source, entry)) in original.iter().zip(&entries).enumerate() {
        match entry {
            SelectionEntry::Passthrough(file) if file != source => {
                return Err(AppError::Selection(format!("第 {} 项透传文件与原文件不一致", index)));
            }
            SelectionEntry::Recompressed(recompressed) if recompressed.file().name() != source.name() => {
                return Err(AppError::Selection(format!(
                    "第 {} 项文件名不一致：{} != {}",
                    index,
                    recompressed.file().name(),
                    source.name()
                )));
            }
            _ => {}
        }
    }

    Ok(entries.into_iter().map(SelectionEntry::into_file).collect())
}

/// 以一次赋值替换目标控件上的文件列表。
pub fn commit(target: &UploadTarget, files: FileCollection) {
    log::debug!("📝 提交新文件列表 - 控件: {} 文件数: {}", target.id(), files.len());
    target.control().replace_files(files);
}
