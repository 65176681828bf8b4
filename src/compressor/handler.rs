//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageCompressor` 只负责流程编排与配置管理，不直接与上传控件绑定。
//! 单个文件的处理链路固定为：读取配置快照 → 解码 → 铺底重编码。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<CompressorConfig>>` 支持运行时切换档位。
//! - 单次选择内使用同一份配置快照，避免处理中途配置漂移。
//! - 同一次选择内的文件严格按顺序处理：第 N 个文件完成后才开始第 N+1 个。
//! - 记录 `decode/encode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{CompressError, CompressionProfile, CompressorConfig, RecompressedFile, decoder, encoder};
use crate::upload::{FileCollection, SelectedFile, SelectionEntry};

/// 图片压缩器。
#[derive(Clone)]
pub struct ImageCompressor {
    config: Arc<RwLock<CompressorConfig>>,
}

impl ImageCompressor {
    /// 根据初始配置创建压缩器。
    ///
    /// # 示例
    /// ```rust
    /// use upload_compressor::{CompressorConfig, ImageCompressor};
    ///
    /// let compressor = ImageCompressor::new(CompressorConfig::default())?;
    /// # Ok::<(), upload_compressor::CompressError>(())
    /// ```
    pub fn new(config: CompressorConfig) -> Result<Self, CompressError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<CompressorConfig, CompressError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| CompressError::InvalidConfig("配置读取锁已中毒".to_string()))
    }

    /// 整体替换配置，只影响之后开始的处理。
    pub fn set_config(&self, config: CompressorConfig) -> Result<(), CompressError> {
        config.validate()?;
        let mut current = self
            .config
            .write()
            .map_err(|_| CompressError::InvalidConfig("配置写入锁已中毒".to_string()))?;
        *current = config;
        Ok(())
    }

    /// 切换压缩档位。
    pub fn set_profile(&self, profile: CompressionProfile) -> Result<(), CompressError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| CompressError::InvalidConfig("配置写入锁已中毒".to_string()))?;
        config.apply_profile(profile);

        log::info!(
            "⚙️ 已切换压缩档位：{}（quality={}, output={}）",
            profile.as_str(),
            config.quality,
            config.output_mime
        );

        Ok(())
    }

    pub fn profile(&self) -> Result<CompressionProfile, CompressError> {
        Ok(self.config_snapshot()?.infer_profile())
    }

    /// 压缩单个图片文件。
    pub async fn compress_file(&self, file: &SelectedFile) -> Result<RecompressedFile, CompressError> {
        let config = self.config_snapshot()?;
        self.compress_with(file, &config).await
    }

    /// 依次处理一次选择中的全部文件。
    ///
    /// 非图片文件原样透传；任一图片失败立即返回错误，不产出部分结果。
    pub async fn compress_selection(&self, files: &FileCollection) -> Result<Vec<SelectionEntry>, CompressError> {
        let config = self.config_snapshot()?;
        let mut entries = Vec::with_capacity(files.len());

        for file in files {
            if !file.is_image() {
                log::debug!("⏭️ 非图片文件原样保留：{}（{}）", file.name(), file.mime_type());
                entries.push(SelectionEntry::Passthrough(file.clone()));
                continue;
            }

            let recompressed = self.compress_with(file, &config).await?;
            entries.push(SelectionEntry::Recompressed(recompressed));
        }

        Ok(entries)
    }

    async fn compress_with(
        &self,
        file: &SelectedFile,
        config: &CompressorConfig,
    ) -> Result<RecompressedFile, CompressError> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let surface = decoder::decode_async(file.clone(), config.clone()).await?;
        let decode_elapsed = decode_start.elapsed();

        let encode_start = Instant::now();
        let recompressed = encoder::encode_async(surface, file.clone(), config.clone()).await?;
        let encode_elapsed = encode_start.elapsed();

        let (width, height) = recompressed.dimensions();
        log::info!(
            "✅ 图片压缩完成 - 文件: {} 尺寸: {}x{} 体积: {} -> {} 字节（{:.0}%） decode={}ms encode={}ms total={}ms",
            file.name(),
            width,
            height,
            recompressed.original_size(),
            recompressed.compressed_size(),
            recompressed.ratio() * 100.0,
            decode_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(recompressed)
    }
}
