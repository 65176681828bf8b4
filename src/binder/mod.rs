//! # 事件绑定（服务层）
//!
//! ## 设计思路
//!
//! `CompressionService` 把识别、解码、编码、重建串成完整链路，并挂到每个上传目标的变更事件上。
//! 每次调用的状态机为 `Idle → Processing → Idle`：
//! 1. 用户产生新选择，监听器同步分配本目标的新代号（generation）
//! 2. 在 tokio 运行时上依次处理选择中的每个文件
//! 3. 持提交锁复查代号，仍是最新才整体替换控件列表，否则丢弃
//!
//! ## 实现思路
//!
//! - 代号在监听器中同步递增，保证“后选择的代号更大”与用户操作顺序一致。
//! - 提交锁只覆盖“复查代号 + 替换”这一步，处理过程本身不加锁，多次选择可以同时在途。
//! - 程序化替换不会触发变更事件，因此不会递归进入监听器。
//! - 监听器只持有服务与绑定的 `Weak` 引用，控件、绑定、服务之间不形成引用环；
//!   `unregister` 释放绑定后，留在控件上的监听器自动失效。
//! - 任一文件失败都不提交，原选择保留；错误写日志并推送 `SelectionReport::Failed`。

mod report;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::compressor::ImageCompressor;
use crate::error::AppError;
use crate::upload::{self, FileCollection, UploadControl, UploadTarget};

pub use report::{SelectionOutcome, SelectionReport, SelectionState};

/// 单个被追踪目标的绑定状态。
struct TargetBinding {
    target: UploadTarget,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    commit_lock: Mutex<()>,
}

impl TargetBinding {
    fn new(target: UploadTarget) -> Self {
        Self {
            target,
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            commit_lock: Mutex::new(()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn state(&self) -> SelectionState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SelectionState::Processing
        } else {
            SelectionState::Idle
        }
    }
}

/// 处理期间的计数守卫，`Drop` 时回到 Idle。
struct ProcessingGuard<'a> {
    binding: &'a TargetBinding,
}

impl<'a> ProcessingGuard<'a> {
    fn new(binding: &'a TargetBinding) -> Self {
        binding.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { binding }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.binding.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ServiceInner {
    compressor: ImageCompressor,
    runtime: Handle,
    bindings: Mutex<Vec<Arc<TargetBinding>>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SelectionReport>>>,
}

impl ServiceInner {
    fn emit(&self, report: SelectionReport) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(report.clone()).is_ok());
    }

    async fn run(
        &self,
        binding: Arc<TargetBinding>,
        generation: u64,
        files: FileCollection,
    ) -> Result<SelectionOutcome, AppError> {
        let target_id = binding.target.id().to_string();

        if files.is_empty() {
            log::debug!("⏭️ 控件 {} 选择为空，不做处理", target_id);
            return Ok(SelectionOutcome::Empty);
        }

        let _processing = ProcessingGuard::new(&binding);
        log::info!(
            "🚀 开始处理选择 - 控件: {} 代号: {} 文件数: {}",
            target_id,
            generation,
            files.len()
        );

        let rebuilt = match self.rebuild(&files).await {
            Ok(rebuilt) => rebuilt,
            Err(err) => {
                log::error!("❌ 控件 {} 的选择处理失败，保留原选择: {}", target_id, err);
                self.emit(SelectionReport::Failed {
                    target_id,
                    generation,
                    error: err.to_string(),
                });
                return Err(err);
            }
        };

        let bytes_before = files.total_bytes();
        let bytes_after = rebuilt.total_bytes();
        let file_count = rebuilt.len();

        {
            let _commit = binding.commit_lock.lock().unwrap_or_else(|e| e.into_inner());
            let latest_generation = binding.latest_generation();

            if latest_generation != generation {
                log::warn!(
                    "⚠️ 控件 {} 的代号 {} 已被 {} 取代，丢弃本次结果",
                    target_id,
                    generation,
                    latest_generation
                );
                self.emit(SelectionReport::Superseded {
                    target_id,
                    generation,
                    latest_generation,
                });
                return Ok(SelectionOutcome::Superseded {
                    generation,
                    latest_generation,
                });
            }

            upload::commit(&binding.target, rebuilt);
        }

        log::info!(
            "✅ 控件 {} 已提交新选择 - 代号: {} 文件数: {} 体积: {} -> {} 字节",
            target_id,
            generation,
            file_count,
            bytes_before,
            bytes_after
        );
        self.emit(SelectionReport::Committed {
            target_id,
            generation,
            file_count,
            bytes_before,
            bytes_after,
        });

        Ok(SelectionOutcome::Committed {
            generation,
            file_count,
            bytes_before,
            bytes_after,
        })
    }

    async fn rebuild(&self, files: &FileCollection) -> Result<FileCollection, AppError> {
        let entries = self.compressor.compress_selection(files).await?;
        upload::rebuild(files, entries)
    }
}

/// 压缩服务：追踪上传目标并在其选择变化时自动重压缩。
#[derive(Clone)]
pub struct CompressionService {
    inner: Arc<ServiceInner>,
}

impl CompressionService {
    /// 使用当前 tokio 运行时创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use upload_compressor::{CompressionService, CompressorConfig, ImageCompressor};
    ///
    /// # async fn demo() -> Result<(), upload_compressor::AppError> {
    /// let compressor = ImageCompressor::new(CompressorConfig::default())?;
    /// let service = CompressionService::new(compressor)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(compressor: ImageCompressor) -> Result<Self, AppError> {
        let runtime = Handle::try_current().map_err(|e| AppError::Runtime(e.to_string()))?;
        Ok(Self::with_runtime(compressor, runtime))
    }

    /// 指定运行时创建服务，监听器产生的任务都会派发到该运行时。
    pub fn with_runtime(compressor: ImageCompressor, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                compressor,
                runtime,
                bindings: Mutex::new(Vec::new()),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn compressor(&self) -> &ImageCompressor {
        &self.inner.compressor
    }

    /// 一次性扫描全部控件并绑定符合条件的目标，返回新绑定的目标 ID（保持输入顺序）。
    ///
    /// 之后新增的控件不会被自动发现，需要调用 [`register`](Self::register)。
    pub fn bind_all<I>(&self, controls: I) -> Vec<String>
    where
        I: IntoIterator<Item = Arc<dyn UploadControl>>,
    {
        let bound: Vec<String> = upload::classify_controls(controls)
            .into_iter()
            .filter_map(|target| self.bind_target(target))
            .collect();

        log::info!("🔗 已绑定 {} 个上传控件: {:?}", bound.len(), bound);
        bound
    }

    /// 注册单个控件；返回该控件此后是否处于追踪状态。
    pub fn register(&self, control: Arc<dyn UploadControl>) -> bool {
        if self.is_tracked(control.id()) {
            return true;
        }

        match upload::classify_control(control) {
            Some(target) => {
                self.bind_target(target);
                true
            }
            None => false,
        }
    }

    /// 取消追踪；返回该控件之前是否处于追踪状态。
    ///
    /// 已在途的处理仍会按代号规则提交，之后的选择不再处理。
    pub fn unregister(&self, target_id: &str) -> bool {
        let mut bindings = self.inner.bindings.lock().unwrap_or_else(|e| e.into_inner());
        let before = bindings.len();
        bindings.retain(|b| b.target.id() != target_id);
        let removed = bindings.len() != before;

        if removed {
            log::info!("🔌 已解除控件 {} 的绑定", target_id);
        }
        removed
    }

    /// 订阅处理结果事件。
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SelectionReport> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// 手动处理一次选择，等价于目标控件触发了一次变更事件，但在当前任务中等待结果。
    pub async fn process_selection(
        &self,
        target_id: &str,
        files: FileCollection,
    ) -> Result<SelectionOutcome, AppError> {
        let binding = self
            .binding(target_id)
            .ok_or_else(|| AppError::Selection(format!("控件 {} 未被追踪", target_id)))?;
        let generation = binding.next_generation();
        self.inner.run(binding, generation, files).await
    }

    pub fn is_tracked(&self, target_id: &str) -> bool {
        self.binding(target_id).is_some()
    }

    /// 已追踪目标的 ID，按绑定顺序。
    pub fn tracked_targets(&self) -> Vec<String> {
        self.inner
            .bindings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|b| b.target.id().to_string())
            .collect()
    }

    pub fn state(&self, target_id: &str) -> Option<SelectionState> {
        self.binding(target_id).map(|b| b.state())
    }

    fn binding(&self, target_id: &str) -> Option<Arc<TargetBinding>> {
        self.inner
            .bindings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|b| b.target.id() == target_id)
            .cloned()
    }

    fn bind_target(&self, target: UploadTarget) -> Option<String> {
        let id = target.id().to_string();
        let binding = {
            let mut bindings = self.inner.bindings.lock().unwrap_or_else(|e| e.into_inner());
            if bindings.iter().any(|b| b.target.id() == id) {
                log::debug!("控件 {} 已绑定，跳过", id);
                return None;
            }
            let binding = Arc::new(TargetBinding::new(target));
            bindings.push(binding.clone());
            binding
        };

        let weak: Weak<ServiceInner> = Arc::downgrade(&self.inner);
        let weak_binding: Weak<TargetBinding> = Arc::downgrade(&binding);
        binding.target.control().add_change_listener(Arc::new(move |files: FileCollection| {
            let (Some(inner), Some(binding)) = (weak.upgrade(), weak_binding.upgrade()) else {
                return;
            };
            let generation = binding.next_generation();
            let runtime = inner.runtime.clone();

            runtime.spawn(async move {
                // 错误已在 run 内记录并上报
                let _ = inner.run(binding, generation, files).await;
            });
        }));

        Some(id)
    }
}
