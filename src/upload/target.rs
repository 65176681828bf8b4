//! # 上传控件抽象
//!
//! ## 设计思路
//!
//! 页面上的文件选择控件属于外部协作方，本 crate 只绑定、不创建。
//! `UploadControl` 描述核心需要的全部能力：
//! - 查询 accept 过滤串
//! - 读取当前文件列表
//! - 以一次赋值整体替换文件列表（程序化赋值，**不得**触发变更事件）
//! - 注册“用户产生新选择”的监听器
//!
//! `MemoryUploadControl` 是内存实现：宿主可直接用它承载自己的选择模型，测试也依赖它。

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::FileCollection;

/// 变更监听器：参数为用户刚选择的文件列表。
pub type ChangeListener = Arc<dyn Fn(FileCollection) + Send + Sync>;

/// 文件选择控件需要暴露的能力。
pub trait UploadControl: Send + Sync {
    /// 控件标识，用于日志与重复注册判断。
    fn id(&self) -> &str;

    /// accept 过滤串；未设置时返回 `None`。
    fn accept(&self) -> Option<String>;

    /// 当前持有的文件列表快照。
    fn files(&self) -> FileCollection;

    /// 整体替换文件列表。实现方必须保证该操作不触发变更监听器。
    fn replace_files(&self, files: FileCollection);

    /// 注册变更监听器。
    fn add_change_listener(&self, listener: ChangeListener);
}

/// 被追踪的上传目标：控件引用 + 解析后的可接受格式集合。
#[derive(Clone)]
pub struct UploadTarget {
    control: Arc<dyn UploadControl>,
    accepted_formats: BTreeSet<String>,
}

impl UploadTarget {
    pub(crate) fn new(control: Arc<dyn UploadControl>, accepted_formats: BTreeSet<String>) -> Self {
        Self {
            control,
            accepted_formats,
        }
    }

    pub fn id(&self) -> &str {
        self.control.id()
    }

    pub fn control(&self) -> &Arc<dyn UploadControl> {
        &self.control
    }

    /// accept 过滤串解析出的格式集合（已归一化，如 `png`、`jpeg`、`pdf`）。
    pub fn accepted_formats(&self) -> &BTreeSet<String> {
        &self.accepted_formats
    }
}

impl fmt::Debug for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTarget")
            .field("id", &self.id())
            .field("accepted_formats", &self.accepted_formats)
            .finish()
    }
}

/// 内存版上传控件。
pub struct MemoryUploadControl {
    id: String,
    accept: Option<String>,
    files: Mutex<FileCollection>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl MemoryUploadControl {
    pub fn new(id: impl Into<String>, accept: Option<&str>) -> Self {
        Self {
            id: id.into(),
            accept: accept.map(str::to_string),
            files: Mutex::new(FileCollection::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// 模拟用户选择：先替换列表，再依次通知监听器。
    pub fn select(&self, files: FileCollection) {
        {
            let mut current = self.files.lock().unwrap_or_else(|e| e.into_inner());
            *current = files.clone();
        }

        // 克隆出监听器列表后再回调，避免回调中注册监听器时死锁
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for listener in listeners {
            listener(files.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl UploadControl for MemoryUploadControl {
    fn id(&self) -> &str {
        &self.id
    }

    fn accept(&self) -> Option<String> {
        self.accept.clone()
    }

    fn files(&self) -> FileCollection {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace_files(&self, files: FileCollection) {
        let mut current = self.files.lock().unwrap_or_else(|e| e.into_inner());
        *current = files;
    }

    fn add_change_listener(&self, listener: ChangeListener) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::SelectedFile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn select_notifies_listeners_but_replace_does_not() {
        let control = MemoryUploadControl::new("avatar", Some(".png"));
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        control.add_change_listener(Arc::new(move |_files| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let files: FileCollection = vec![SelectedFile::new("a.png", "image/png", vec![1, 2])].into();
        control.select(files.clone());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        control.replace_files(FileCollection::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(control.files().is_empty());
    }

    #[test]
    fn accept_is_optional() {
        let control = MemoryUploadControl::new("doc", None);
        assert_eq!(control.accept(), None);
        assert_eq!(control.listener_count(), 0);
    }
}
