//! # 编码模块
//!
//! ## 设计思路
//!
//! 把宿主交来的 `FileHandle` 转成可移植的 `data:` URL，同时提取名称、体积与声明类型。
//! 同一批次的文件并发编码，全部完成后才进入校验；任意一个失败则整批作废（all-or-nothing）。
//!
//! ## 实现思路
//!
//! - 先看体积再读取。读取上限取 `ingest_size_limit` 与 `max_file_size` 中较大者，
//!   超过上限的文件只读开头几十字节识别类型，以空 `data_url` 交给校验，由体积检查拦下。
//! - 声明类型优先取宿主给出的 MIME，否则用 `infer` 按文件签名识别。
//! - `try_join_all` 保证输出顺序与输入一致，并在首个错误处整体返回。
//! - `KeyGenerator` 生成 `时间戳-文件名` 形式的 key，时间戳严格单调递增，同名文件也不会撞 key。

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use futures::future::try_join_all;
use tokio::io::AsyncReadExt;

use super::UploadError;
use super::source::{FileContent, FileHandle, FileInfo, UploadItem};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

const SNIFF_HEAD_LEN: usize = 64;

/// 条目 key 生成器。
#[derive(Debug, Default)]
pub struct KeyGenerator {
    last_millis: AtomicI64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成 `{毫秒时间戳}-{文件名}`，同一毫秒内的多次调用会顺延时间戳。
    pub fn next_key(&self, name: &str) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut previous = self.last_millis.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(previous + 1);
            match self.last_millis.compare_exchange(
                previous,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return format!("{}-{}", candidate, name),
                Err(actual) => previous = actual,
            }
        }
    }
}

/// 文件编码器。
#[derive(Debug)]
pub struct Encoder {
    ingest_size_limit: u64,
    max_file_size: Option<u64>,
    keys: KeyGenerator,
}

impl Encoder {
    pub fn new(ingest_size_limit: u64) -> Self {
        Self {
            ingest_size_limit,
            max_file_size: None,
            keys: KeyGenerator::new(),
        }
    }

    /// 设置校验阶段的体积上限，读取上限会被抬高到不低于它。
    pub fn with_max_file_size(mut self, max_file_size: Option<u64>) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// 实际生效的读取上限。
    pub fn read_ceiling(&self) -> u64 {
        self.ingest_size_limit.max(self.max_file_size.unwrap_or_default())
    }

    /// 并发编码整批文件，输出顺序与输入一致。
    ///
    /// # 示例
    /// ```rust
    /// use image_uploading::uploader::{Encoder, FileHandle};
    ///
    /// # async fn demo() -> Result<(), image_uploading::uploader::UploadError> {
    /// let encoder = Encoder::new(1024);
    /// let items = encoder
    ///     .ingest(&[FileHandle::from_bytes("a.png", vec![1_u8, 2, 3]).with_declared_type("image/png")])
    ///     .await?;
    /// assert_eq!(items[0].data_url, "data:image/png;base64,AQID");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn ingest(&self, handles: &[FileHandle]) -> Result<Vec<UploadItem>, UploadError> {
        let start = Instant::now();

        let encoded = try_join_all(handles.iter().map(|handle| self.encode_one(handle))).await?;

        let items: Vec<UploadItem> = encoded
            .into_iter()
            .map(|(data_url, info)| UploadItem {
                key: self.keys.next_key(&info.name),
                data_url,
                file: Some(info),
            })
            .collect();

        log::info!(
            "📦 批次编码完成 - 文件数: {} 耗时: {}ms",
            items.len(),
            start.elapsed().as_millis()
        );

        Ok(items)
    }

    async fn encode_one(&self, handle: &FileHandle) -> Result<(String, FileInfo), UploadError> {
        let size = self.content_size(handle).await?;
        if size > self.read_ceiling() {
            return self.describe_oversized(handle, size).await;
        }

        let bytes = self.read_content(handle).await?;
        let mime_type = declared_or_sniffed(handle, &bytes);
        let data_url = encode_data_url(&mime_type, &bytes);

        log::debug!(
            "📝 已编码文件 - 名称: {} 类型: {} 体积: {} 字节",
            handle.name(),
            if mime_type.is_empty() { "<unknown>" } else { mime_type.as_str() },
            bytes.len()
        );

        Ok((
            data_url,
            FileInfo {
                name: handle.name().to_string(),
                size: bytes.len() as u64,
                mime_type,
                handle: handle.clone(),
            },
        ))
    }

    /// 超过读取上限的文件不读入内容，只带元数据和空 `data_url` 交给校验。
    ///
    /// 读取上限不低于 `max_file_size`，所以这样的条目必然在体积检查处被拦下，不会进入列表。
    /// 未配置 `max_file_size` 时没有校验能拦住它，只能按编码失败处理。
    async fn describe_oversized(
        &self,
        handle: &FileHandle,
        size: u64,
    ) -> Result<(String, FileInfo), UploadError> {
        if self.max_file_size.is_none() {
            return Err(UploadError::EncodingFailure(format!(
                "文件 {} 超过读取上限：{:.2} MB（限制：{:.2} MB）",
                handle.name(),
                size as f64 / 1024.0 / 1024.0,
                self.ingest_size_limit as f64 / 1024.0 / 1024.0
            )));
        }

        let head = self.read_head(handle).await?;
        let mime_type = declared_or_sniffed(handle, &head);
        log::warn!(
            "⚠️ 文件 {} 体积 {} 字节超过读取上限 {}，跳过读取内容",
            handle.name(),
            size,
            self.read_ceiling()
        );

        Ok((
            String::new(),
            FileInfo {
                name: handle.name().to_string(),
                size,
                mime_type,
                handle: handle.clone(),
            },
        ))
    }

    async fn content_size(&self, handle: &FileHandle) -> Result<u64, UploadError> {
        match handle.content() {
            FileContent::Memory(bytes) => Ok(bytes.len() as u64),
            FileContent::Path(path) => {
                let metadata = tokio::fs::metadata(path).await.map_err(|e| {
                    UploadError::EncodingFailure(format!(
                        "无法读取文件信息 '{}'：{}",
                        path.display(),
                        e
                    ))
                })?;
                if !metadata.is_file() {
                    return Err(UploadError::EncodingFailure(format!(
                        "不是普通文件：{}",
                        path.display()
                    )));
                }
                Ok(metadata.len())
            }
        }
    }

    async fn read_content(&self, handle: &FileHandle) -> Result<Bytes, UploadError> {
        match handle.content() {
            FileContent::Memory(bytes) => Ok(bytes.clone()),
            FileContent::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    UploadError::EncodingFailure(format!("无法读取文件 '{}'：{}", path.display(), e))
                })?;
                Ok(Bytes::from(bytes))
            }
        }
    }

    /// 只读取开头若干字节，用于识别文件签名。
    async fn read_head(&self, handle: &FileHandle) -> Result<Bytes, UploadError> {
        match handle.content() {
            FileContent::Memory(bytes) => Ok(bytes.slice(..bytes.len().min(SNIFF_HEAD_LEN))),
            FileContent::Path(path) => {
                let read_error = |e: std::io::Error| {
                    UploadError::EncodingFailure(format!("无法读取文件 '{}'：{}", path.display(), e))
                };
                let mut file = tokio::fs::File::open(path).await.map_err(read_error)?;
                let mut head = vec![0_u8; SNIFF_HEAD_LEN];
                let read = file.read(&mut head).await.map_err(read_error)?;
                head.truncate(read);
                Ok(Bytes::from(head))
            }
        }
    }
}

/// 优先取宿主声明的类型，否则按文件签名识别，识别不出为空串。
fn declared_or_sniffed(handle: &FileHandle, bytes: &[u8]) -> String {
    match handle.declared_type() {
        Some(declared) => declared.to_string(),
        None => infer::get(bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_default(),
    }
}

/// 生成 `data:{mime};base64,{payload}`。
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.is_empty() {
        FALLBACK_MIME_TYPE
    } else {
        mime_type
    };
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// 解析 `data:` URL 或纯 Base64 字符串，返回原始字节。
pub fn decode_data_url(data: &str) -> Result<Vec<u8>, UploadError> {
    let normalized = data.trim();

    let payload = if normalized.starts_with("data:") {
        let base64_start = normalized
            .find(";base64,")
            .ok_or_else(|| UploadError::EncodingFailure("缺少 base64 标记".to_string()))?;
        &normalized[base64_start + 8..]
    } else {
        normalized
    };

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| UploadError::EncodingFailure(format!("Base64 解码失败：{}", e)))
}
