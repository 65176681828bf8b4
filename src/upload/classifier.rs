//! # 目标识别
//!
//! ## 设计思路
//!
//! 根据 accept 过滤串判断控件是否接受位图上传，只有接受 png/jpg/jpeg 之一的控件才会被追踪。
//!
//! ## 实现思路
//!
//! 1. 按逗号切分 accept，逐项 trim + 小写
//! 2. 去掉前缀 `.` 或 `image/`，得到格式名
//! 3. 任一格式名包含 png / jpg / jpeg 之一即为目标
//!
//! 按子串匹配，`image/x-png`、`image/pjpeg`、`image/apng` 这类变体写法也会命中；
//! `image/*` 之类通配符不算命中；accept 缺失或为空的控件直接排除，不报错。

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{UploadControl, UploadTarget};

/// 会被拦截的位图格式。
pub const SUPPORTED_FORMATS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 把 accept 过滤串解析为归一化的格式集合。
///
/// ```rust
/// use upload_compressor::upload::parse_accept_filter;
///
/// let formats = parse_accept_filter("image/png, .PDF");
/// assert!(formats.contains("png"));
/// assert!(formats.contains("pdf"));
/// ```
pub fn parse_accept_filter(accept: &str) -> BTreeSet<String> {
    accept
        .split(',')
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let format = token
                .strip_prefix('.')
                .or_else(|| token.strip_prefix("image/"))
                .unwrap_or(&token);
            format.to_string()
        })
        .collect()
}

/// 是否有格式名包含受支持的位图格式。
pub fn accepts_supported_format(formats: &BTreeSet<String>) -> bool {
    formats
        .iter()
        .any(|format| SUPPORTED_FORMATS.iter().any(|supported| format.contains(*supported)))
}

/// 识别单个控件；不符合条件时返回 `None`。
pub fn classify_control(control: Arc<dyn UploadControl>) -> Option<UploadTarget> {
    let accept = control.accept()?;
    let formats = parse_accept_filter(&accept);

    if !accepts_supported_format(&formats) {
        log::debug!("⏭️ 控件 {} 不接受位图（accept={:?}），跳过", control.id(), accept);
        return None;
    }

    Some(UploadTarget::new(control, formats))
}

/// 从全部控件中筛选上传目标，保持输入顺序。
pub fn classify_controls<I>(controls: I) -> Vec<UploadTarget>
where
    I: IntoIterator<Item = Arc<dyn UploadControl>>,
{
    controls.into_iter().filter_map(classify_control).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::MemoryUploadControl;

    fn control(id: &str, accept: Option<&str>) -> Arc<dyn UploadControl> {
        Arc::new(MemoryUploadControl::new(id, accept))
    }

    #[test]
    fn mixed_filter_with_png_is_selected() {
        assert!(classify_control(control("a", Some("image/png, application/pdf"))).is_some());
    }

    #[test]
    fn pdf_only_filter_is_not_selected() {
        assert!(classify_control(control("b", Some("application/pdf"))).is_none());
    }

    #[test]
    fn missing_or_blank_accept_is_not_selected() {
        assert!(classify_control(control("c", None)).is_none());
        assert!(classify_control(control("d", Some(""))).is_none());
        assert!(classify_control(control("e", Some(" , "))).is_none());
    }

    #[test]
    fn extensions_and_case_are_normalized() {
        assert!(classify_control(control("f", Some(".JPG"))).is_some());
        assert!(classify_control(control("g", Some("IMAGE/JPEG"))).is_some());
    }

    #[test]
    fn wildcard_image_filter_is_not_selected() {
        assert!(classify_control(control("h", Some("image/*"))).is_none());
        assert!(classify_control(control("i", Some("image/webp"))).is_none());
    }

    #[test]
    fn variant_mime_spellings_are_selected() {
        for accept in ["image/x-png", "image/pjpeg", "image/apng", ".PNG"] {
            assert!(classify_control(control("v", Some(accept))).is_some(), "{}", accept);
        }
        assert!(classify_control(control("w", Some("image/gif, text/plain"))).is_none());
    }

    #[test]
    fn output_keeps_input_order() {
        let targets = classify_controls(vec![
            control("first", Some(".png")),
            control("skip", Some(".txt")),
            control("second", Some("image/jpeg")),
            control("third", Some(".jpeg,.gif")),
        ]);

        let ids: Vec<&str> = targets.iter().map(|t| t.id()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
        assert!(targets[2].accepted_formats().contains("gif"));
    }
}
