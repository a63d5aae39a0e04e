//! # 分辨率检查模块
//!
//! ## 设计思路
//!
//! 分辨率检查是校验链路中唯一需要“看懂图片内容”的环节，因此抽象为 `ResolutionChecker`，
//! 默认实现基于 `image` 只读取图片头信息拿到宽高，不做完整解码。
//! 任何解析失败都按“不通过”处理（fail closed）。

use std::io::Cursor;

use async_trait::async_trait;

use super::encoder::decode_data_url;
use super::{ResolutionType, UploadError};

/// 分辨率判定后端。
#[async_trait]
pub trait ResolutionChecker: Send + Sync {
    /// 返回 `data_url` 所表示图片的尺寸是否满足 `mode` 下的目标宽高。
    async fn check(&self, data_url: &str, mode: ResolutionType, width: u32, height: u32) -> bool;
}

/// 基于 `image` 图片头的默认实现，在阻塞线程池中解析。
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageHeaderChecker;

impl ImageHeaderChecker {
    /// 仅通过图片头信息读取宽高。
    pub fn inspect_dimensions(data_url: &str) -> Result<(u32, u32), UploadError> {
        let bytes = decode_data_url(data_url)?;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| UploadError::ResolutionMismatch(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| UploadError::ResolutionMismatch(format!("无法读取图片尺寸：{}", e)))
    }
}

#[async_trait]
impl ResolutionChecker for ImageHeaderChecker {
    async fn check(&self, data_url: &str, mode: ResolutionType, width: u32, height: u32) -> bool {
        let owned = data_url.to_string();
        let task = tokio::task::spawn_blocking(move || Self::inspect_dimensions(&owned));
        let dimensions = match task.await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("⚠️ 分辨率检查任务异常退出：{}", e);
                return false;
            }
        };

        match dimensions {
            Ok(actual) => {
                let passed = mode.matches(actual, (width, height));
                log::debug!(
                    "📐 分辨率检查 - 实际: {}x{} 目标: {}x{} 模式: {} 结果: {}",
                    actual.0,
                    actual.1,
                    width,
                    height,
                    mode.as_str(),
                    passed
                );
                passed
            }
            Err(err) => {
                log::warn!("⚠️ 分辨率检查无法解析图片，按不通过处理：{}", err);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::uploader::encoder::encode_data_url;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    pub(crate) fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn inspect_dimensions_reads_png_header() {
        let url = encode_data_url("image/png", &create_png_bytes(64, 32));
        let dims = ImageHeaderChecker::inspect_dimensions(&url).expect("inspect should succeed");
        assert_eq!(dims, (64, 32));
    }

    #[tokio::test]
    async fn exact_mode_rejects_smaller_image() {
        let url = encode_data_url("image/png", &create_png_bytes(50, 50));
        let checker = ImageHeaderChecker;

        assert!(!checker.check(&url, ResolutionType::Exact, 100, 100).await);
        assert!(checker.check(&url, ResolutionType::Exact, 50, 50).await);
        assert!(checker.check(&url, ResolutionType::Less, 100, 100).await);
        assert!(!checker.check(&url, ResolutionType::More, 100, 100).await);
    }

    #[tokio::test]
    async fn undecodable_payload_fails_closed() {
        let checker = ImageHeaderChecker;

        let garbage = encode_data_url("image/png", b"not really a png");
        assert!(!checker.check(&garbage, ResolutionType::Less, 10_000, 10_000).await);
        assert!(!checker.check("data:image/png;base64,@@", ResolutionType::More, 1, 1).await);
    }
}
