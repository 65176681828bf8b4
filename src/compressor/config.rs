//! # 配置模块
//!
//! ## 设计思路
//!
//! 所有可调策略集中到 `CompressorConfig`，在构造压缩器时显式传入，不使用进程级全局常量。
//! 压缩档位（compact / balanced / optimal）作为高层语义，映射到质量系数。
//!
//! ## 实现思路
//!
//! - `Default` 提供默认配置：质量 0.5、输出 `image/jpeg`、白色背景。
//! - 质量越界时按 [0, 1] 钳制，NaN 视为配置错误。
//! - `OutputFormat::from_mime_type` 对未知 MIME 回退到 PNG，与浏览器 `toBlob` 行为一致。

use serde::{Deserialize, Serialize};

use super::CompressError;

pub const DEFAULT_QUALITY: f32 = 0.5;
pub const DEFAULT_OUTPUT_MIME: &str = "image/jpeg";

/// 压缩配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// 质量系数，推荐范围 [0, 1]，越界值会被钳制。
    pub quality: f32,
    /// 输出编码的 MIME。
    pub output_mime: String,
    /// 透明区域铺底颜色（RGB）。
    pub background: [u8; 3],
    /// 单个文件允许的最大字节数。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            output_mime: DEFAULT_OUTPUT_MIME.to_string(),
            background: [255, 255, 255],
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

impl CompressorConfig {
    /// 从 JSON 读取配置，缺失字段取默认值。
    ///
    /// ```rust
    /// use upload_compressor::CompressorConfig;
    ///
    /// let config = CompressorConfig::from_json(r#"{ "quality": 0.8 }"#)?;
    /// assert_eq!(config.output_mime, "image/jpeg");
    /// # Ok::<(), upload_compressor::CompressError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, CompressError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CompressError::InvalidConfig(format!("配置解析失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置。越界质量不算错误（会被钳制），NaN 与零上限才算。
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.quality.is_nan() {
            return Err(CompressError::InvalidConfig("quality 不能为 NaN".to_string()));
        }
        if self.max_file_size == 0 || self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(CompressError::InvalidConfig("资源上限必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 钳制到 [0, 1] 后的质量系数。
    pub fn effective_quality(&self) -> f32 {
        if self.quality.is_nan() {
            return DEFAULT_QUALITY;
        }
        let clamped = self.quality.clamp(0.0, 1.0);
        if clamped != self.quality {
            log::warn!("⚠️ 质量系数 {} 超出 [0, 1]，按 {} 处理", self.quality, clamped);
        }
        clamped
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_mime_type(&self.output_mime)
    }

    /// 基于当前质量反推档位。
    pub fn infer_profile(&self) -> CompressionProfile {
        let quality = self.effective_quality();
        if quality >= CompressionProfile::Optimal.quality() {
            CompressionProfile::Optimal
        } else if quality <= CompressionProfile::Compact.quality() {
            CompressionProfile::Compact
        } else {
            CompressionProfile::Balanced
        }
    }

    pub fn apply_profile(&mut self, profile: CompressionProfile) {
        self.quality = profile.quality();
    }
}

/// 输出编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 有损，使用质量系数。
    Jpeg,
    /// 无损，忽略质量系数。
    Png,
}

impl OutputFormat {
    pub fn from_mime_type(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/png" => Self::Png,
            other => {
                log::warn!("⚠️ 不支持的输出类型 {:?}，回退为 image/png", other);
                Self::Png
            }
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// 压缩档位。
///
/// - `Compact`：体积优先
/// - `Balanced`：默认
/// - `Optimal`：质量与体积的推荐平衡点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionProfile {
    Compact,
    Balanced,
    Optimal,
}

impl CompressionProfile {
    pub fn from_str(profile: &str) -> Result<Self, CompressError> {
        match profile.trim().to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "balanced" => Ok(Self::Balanced),
            "optimal" => Ok(Self::Optimal),
            other => Err(CompressError::InvalidConfig(format!(
                "未知压缩档位：{}（可选：compact / balanced / optimal）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Balanced => "balanced",
            Self::Optimal => "optimal",
        }
    }

    pub fn quality(self) -> f32 {
        match self {
            Self::Compact => 0.3,
            Self::Balanced => DEFAULT_QUALITY,
            Self::Optimal => 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_quality_is_clamped() {
        let mut config = CompressorConfig::default();
        config.quality = 1.7;
        assert_eq!(config.effective_quality(), 1.0);

        config.quality = -0.2;
        assert_eq!(config.effective_quality(), 0.0);

        config.quality = 0.42;
        assert_eq!(config.effective_quality(), 0.42);
    }

    #[test]
    fn nan_quality_fails_validation() {
        let mut config = CompressorConfig::default();
        config.quality = f32::NAN;
        assert!(matches!(config.validate(), Err(CompressError::InvalidConfig(_))));
        assert_eq!(config.effective_quality(), DEFAULT_QUALITY);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = CompressorConfig::from_json(r#"{ "quality": 0.8, "output_mime": "image/png" }"#)
            .expect("config should parse");
        assert_eq!(config.quality, 0.8);
        assert_eq!(config.output_format(), OutputFormat::Png);
        assert_eq!(config.background, [255, 255, 255]);

        let bad = CompressorConfig::from_json(r#"{ "max_decoded_pixels": 0 }"#);
        assert!(matches!(bad, Err(CompressError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_output_mime_falls_back_to_png() {
        assert_eq!(OutputFormat::from_mime_type("image/jpg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_mime_type("image/webp"), OutputFormat::Png);
    }

    #[test]
    fn profile_round_trips_through_config() {
        for profile in [
            CompressionProfile::Compact,
            CompressionProfile::Balanced,
            CompressionProfile::Optimal,
        ] {
            let mut config = CompressorConfig::default();
            config.apply_profile(profile);
            assert_eq!(config.infer_profile(), profile);
            assert_eq!(CompressionProfile::from_str(profile.as_str()), Ok(profile));
        }
        assert!(CompressionProfile::from_str("max").is_err());
    }
}
