//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”与“暂存列表条目”解耦：
//! - `FileHandle` 表示宿主交来的原始文件（路径或内存字节），对核心是不透明的
//! - `FileInfo` 表示编码阶段提取出的元数据（名称 / 体积 / 声明类型）以及原始句柄
//! - `UploadItem` 是暂存列表中的条目，带唯一 `key`
//! - `PublicItem` 是对外发布的形态，去掉了内部 `key`

use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;

/// 文件内容来源。
#[derive(Debug, Clone)]
pub enum FileContent {
    /// 本地文件路径，编码时异步读取。
    Path(PathBuf),
    /// 已在内存中的字节。
    Memory(Bytes),
}

/// 宿主交来的原始文件句柄。
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    declared_type: Option<String>,
    content: FileContent,
}

impl FileHandle {
    /// 以本地路径创建句柄，名称取路径中的文件名。
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            declared_type: None,
            content: FileContent::Path(path),
        }
    }

    /// 以内存字节创建句柄。
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            content: FileContent::Memory(bytes.into()),
        }
    }

    /// 指定宿主声明的 MIME 类型（相当于浏览器 `File.type`）。
    pub fn with_declared_type(mut self, mime_type: impl Into<String>) -> Self {
        self.declared_type = Some(mime_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }

}

/// 编码阶段提取的文件元数据，附带原始句柄。
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    /// 文件体积（字节）。
    pub size: u64,
    /// 声明类型，无法识别时为空串。
    pub mime_type: String,
    #[serde(skip)]
    pub handle: FileHandle,
}

impl FileInfo {
    /// 名称中最后一个 `.` 之后的部分；没有 `.` 时为整个名称。
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or_default()
    }
}

/// 暂存列表条目。
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub key: String,
    pub data_url: String,
    /// 预置条目可能没有原始文件。
    pub file: Option<FileInfo>,
}

impl UploadItem {
    pub fn to_public(&self) -> PublicItem {
        PublicItem {
            data_url: self.data_url.clone(),
            file: self.file.clone(),
        }
    }
}

/// 对外发布的条目：只有编码数据与文件元数据。
#[derive(Debug, Clone, Serialize)]
pub struct PublicItem {
    pub data_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
}

/// 预置条目输入，`key` 取 `data_url` 本身。
#[derive(Debug, Clone)]
pub struct SeedItem {
    pub data_url: String,
    pub file: Option<FileInfo>,
}

impl SeedItem {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
            file: None,
        }
    }
}

pub(crate) fn to_public_list(items: &[UploadItem]) -> Vec<PublicItem> {
    items.iter().map(UploadItem::to_public).collect()
}
