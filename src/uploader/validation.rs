//! # 校验流水线模块
//!
//! ## 设计思路
//!
//! 对一个批次按固定顺序执行约束检查，输出通过/失败与四个错误标志。
//!
//! ## 实现思路
//!
//! 1. 错误标志整体重置
//! 2. 追加模式下先做数量检查，超限则直接短路，不再执行任何逐文件检查
//! 3. 逐文件依次检查：声明类型 → 体积 → 扩展名白名单 → 分辨率
//! 4. 任意文件任意一项失败即停止整个批次
//!
//! 第 4 步“首个坏文件中止整批”是对外可观察的行为，予以保留；但它更像是提前退出循环带来的副作用，
//! 不要在此基础上继续扩展（比如据此做部分提交）。

use std::sync::Arc;

use super::resolution::ResolutionChecker;
use super::source::UploadItem;
use super::state::ErrorState;
use super::{UploadConfig, UploadError};

/// 协调器当前的编辑模式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    /// 追加（或单选模式下整体替换）。
    Append,
    /// 替换指定 key 的条目。
    Replace(String),
}

/// 单次校验结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: ErrorState,
    /// 第一个失败的具体原因，仅用于诊断。
    pub failure: Option<UploadError>,
}

impl ErrorState {
    fn record(&mut self, failure: &UploadError) {
        match failure {
            UploadError::TooManyFiles { .. } => self.max_number = true,
            UploadError::UnsupportedType(_) => self.accept_type = true,
            UploadError::FileTooLarge { .. } => self.max_file_size = true,
            UploadError::ResolutionMismatch(_) => self.resolution = true,
            UploadError::EncodingFailure(_) | UploadError::InvalidConfig(_) => {}
        }
    }
}

/// 校验流水线。
pub struct ValidationPipeline {
    config: UploadConfig,
    checker: Arc<dyn ResolutionChecker>,
}

impl ValidationPipeline {
    pub fn new(config: UploadConfig, checker: Arc<dyn ResolutionChecker>) -> Self {
        Self { config, checker }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// 校验一个批次。`current_len` 为当前列表长度。
    pub async fn validate(
        &self,
        batch: &[UploadItem],
        current_len: usize,
        mode: &EditMode,
    ) -> ValidationReport {
        let mut errors = ErrorState::default();

        let failure = match self.check_count(batch.len(), current_len, mode) {
            Err(failure) => Some(failure),
            Ok(()) => self.check_items(batch).await,
        };

        if let Some(failure) = &failure {
            errors.record(failure);
            log::warn!("🚫 批次校验未通过 - {}：{}", failure.code(), failure);
        }

        ValidationReport {
            ok: !errors.has_error(),
            errors,
            failure,
        }
    }

    fn check_count(
        &self,
        selected: usize,
        existing: usize,
        mode: &EditMode,
    ) -> Result<(), UploadError> {
        if *mode != EditMode::Append {
            return Ok(());
        }
        match self.config.max_number {
            Some(max) if selected + existing > max => Err(UploadError::TooManyFiles {
                selected,
                existing,
                max,
            }),
            _ => Ok(()),
        }
    }

    /// 逐文件检查，遇到第一个失败立即返回。
    async fn check_items(&self, batch: &[UploadItem]) -> Option<UploadError> {
        for item in batch {
            if let Err(failure) = self.check_item(item).await {
                return Some(failure);
            }
        }
        None
    }

    async fn check_item(&self, item: &UploadItem) -> Result<(), UploadError> {
        if let Some(file) = &item.file {
            if !file.mime_type.contains("image") {
                return Err(UploadError::UnsupportedType(format!(
                    "{}（类型：{}）",
                    file.name,
                    if file.mime_type.is_empty() { "<unknown>" } else { file.mime_type.as_str() }
                )));
            }

            if let Some(max) = self.config.max_file_size {
                if file.size > max {
                    return Err(UploadError::FileTooLarge {
                        name: file.name.clone(),
                        size: file.size,
                        max,
                    });
                }
            }

            if !self.config.accept_type.is_empty() {
                let extension = file.extension();
                if !self.config.accept_type.iter().any(|allowed| allowed == extension) {
                    return Err(UploadError::UnsupportedType(format!(
                        "{}（扩展名 {} 不在白名单内）",
                        file.name, extension
                    )));
                }
            }

            log::debug!("🔎 文件基础检查通过：{}", file.name);
        }

        if let Some(resolution) = self.config.resolution {
            if !item.data_url.is_empty()
                && !self
                    .checker
                    .check(&item.data_url, resolution.mode, resolution.width, resolution.height)
                    .await
            {
                let name = item
                    .file
                    .as_ref()
                    .map(|file| file.name.clone())
                    .unwrap_or_else(|| item.key.clone());
                return Err(UploadError::ResolutionMismatch(format!(
                    "{} 不满足 {} {}x{}",
                    name,
                    resolution.mode.as_str(),
                    resolution.width,
                    resolution.height
                )));
            }
        }

        Ok(())
    }
}
