//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调约束”集中到 `UploadConfig`：数量、体积、扩展名白名单、分辨率与多选开关。
//! 宿主既可以直接构造，也可以从 JSON 设置文件加载；两种方式都要经过 `validate` 才会被协调器接受。
//!
//! ## 实现思路
//!
//! - `Default` 提供宿主最常用的默认值（`max_number = 1000`、单选、不限类型）。
//! - `ResolutionType` 负责比较模式的字符串解析与反向输出。
//! - `accept_string` 根据白名单生成文件选择器的过滤串。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::UploadError;

/// 默认最多暂存的文件数量。
pub const DEFAULT_MAX_NUMBER: usize = 1000;

/// 单个文件读取时的硬上限，`max_file_size` 更大时以后者为准。
pub const DEFAULT_INGEST_SIZE_LIMIT: u64 = 50 * 1024 * 1024;

/// 分辨率比较模式。
///
/// - `Exact`：宽高都必须相等
/// - `Less`：宽高都不能超过目标
/// - `More`：宽高都不能低于目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionType {
    Exact,
    Less,
    More,
}

impl ResolutionType {
    /// 从外部字符串解析比较模式。
    ///
    /// # 示例
    /// ```rust
    /// use image_uploading::uploader::ResolutionType;
    ///
    /// let mode = ResolutionType::from_str("exact")?;
    /// assert_eq!(mode.as_str(), "exact");
    /// # Ok::<(), image_uploading::uploader::UploadError>(())
    /// ```
    pub fn from_str(mode: &str) -> Result<Self, UploadError> {
        match mode.trim().to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "less" => Ok(Self::Less),
            "more" => Ok(Self::More),
            other => Err(UploadError::InvalidConfig(format!(
                "未知分辨率比较模式：{}（可选：exact / less / more）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Less => "less",
            Self::More => "more",
        }
    }

    /// 按模式比较实际尺寸与目标尺寸。
    pub fn matches(self, actual: (u32, u32), target: (u32, u32)) -> bool {
        let (width, height) = actual;
        let (target_width, target_height) = target;
        match self {
            Self::Exact => width == target_width && height == target_height,
            Self::Less => width <= target_width && height <= target_height,
            Self::More => width >= target_width && height >= target_height,
        }
    }
}

/// 分辨率约束。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConstraint {
    pub mode: ResolutionType,
    pub width: u32,
    pub height: u32,
}

/// 上传暂存配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// 单个文件允许的最大体积（字节），`None` 表示不限制。
    pub max_file_size: Option<u64>,
    /// 列表允许的最大文件数，`None` 表示不限制。
    pub max_number: Option<usize>,
    /// 允许的扩展名（不带点），为空表示任意图片类型。
    pub accept_type: Vec<String>,
    /// 分辨率约束，`None` 表示跳过分辨率检查。
    pub resolution: Option<ResolutionConstraint>,
    /// 追加模式下是否允许一次选择多个文件。
    pub multiple: bool,
    /// 编码阶段读取单个文件内容的上限（字节），不会低于 `max_file_size`。
    pub ingest_size_limit: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: None,
            max_number: Some(DEFAULT_MAX_NUMBER),
            accept_type: Vec::new(),
            resolution: None,
            multiple: false,
            ingest_size_limit: DEFAULT_INGEST_SIZE_LIMIT,
        }
    }
}

impl UploadConfig {
    /// 从 JSON 字符串解析并校验配置，缺省字段取默认值。
    ///
    /// # 示例
    /// ```rust
    /// use image_uploading::uploader::UploadConfig;
    ///
    /// let config = UploadConfig::from_json_str(r#"{ "max_number": 2, "accept_type": ["png"] }"#)?;
    /// assert_eq!(config.max_number, Some(2));
    /// assert!(!config.multiple);
    /// # Ok::<(), image_uploading::uploader::UploadError>(())
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self, UploadError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| UploadError::InvalidConfig(format!("解析配置失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 配置文件加载。
    pub fn load_from_path(path: &Path) -> Result<Self, UploadError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UploadError::InvalidConfig(format!("读取配置文件 '{}' 失败：{}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.max_number == Some(0) {
            return Err(UploadError::InvalidConfig("max_number 不能为 0".to_string()));
        }
        if self.max_file_size == Some(0) {
            return Err(UploadError::InvalidConfig("max_file_size 不能为 0".to_string()));
        }
        if self.ingest_size_limit == 0 {
            return Err(UploadError::InvalidConfig("ingest_size_limit 不能为 0".to_string()));
        }
        if let Some(resolution) = self.resolution {
            if resolution.width == 0 || resolution.height == 0 {
                return Err(UploadError::InvalidConfig(format!(
                    "分辨率约束必须为正数：{}x{}",
                    resolution.width, resolution.height
                )));
            }
        }
        if self.accept_type.iter().any(|ext| ext.trim().is_empty()) {
            return Err(UploadError::InvalidConfig("accept_type 不能包含空扩展名".to_string()));
        }
        Ok(())
    }

    /// 文件选择器的过滤串：白名单为空时为 `image/*`。
    pub fn accept_string(&self) -> String {
        if self.accept_type.is_empty() {
            return "image/*".to_string();
        }
        self.accept_type
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
