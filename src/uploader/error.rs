//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 上传暂存链路中的所有失败都归入单一枚举 `UploadError`，调用侧按分支匹配。
//! 校验类错误（数量 / 类型 / 体积 / 分辨率）只用于诊断，真正对外的状态是 `ErrorState` 标志位；
//! `EncodingFailure` 只中止当前这一次选择，不会向宿主传播为致命错误。

/// 上传暂存统一错误类型。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("文件数量超限：已有 {existing} 个，本次选择 {selected} 个（限制：{max} 个）")]
    TooManyFiles {
        selected: usize,
        existing: usize,
        max: usize,
    },

    #[error("不支持的文件类型：{0}")]
    UnsupportedType(String),

    #[error("文件过大：{name} 为 {size} 字节（限制：{max} 字节）")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("图片分辨率不符合要求：{0}")]
    ResolutionMismatch(String),

    #[error("文件编码失败：{0}")]
    EncodingFailure(String),

    #[error("配置无效：{0}")]
    InvalidConfig(String),
}

impl UploadError {
    /// 稳定错误码，供宿主侧做分支展示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooManyFiles { .. } => "E_TOO_MANY_FILES",
            Self::UnsupportedType(_) => "E_UNSUPPORTED_TYPE",
            Self::FileTooLarge { .. } => "E_FILE_TOO_LARGE",
            Self::ResolutionMismatch(_) => "E_RESOLUTION_MISMATCH",
            Self::EncodingFailure(_) => "E_ENCODING_FAILURE",
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EncodingFailure(_) => "ingest",
            Self::InvalidConfig(_) => "config",
            _ => "validate",
        }
    }
}

impl From<UploadError> for String {
    fn from(error: UploadError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_stages_are_stable() {
        let err = UploadError::TooManyFiles {
            selected: 3,
            existing: 0,
            max: 2,
        };
        assert_eq!(err.code(), "E_TOO_MANY_FILES");
        assert_eq!(err.stage(), "validate");

        let err = UploadError::EncodingFailure("boom".to_string());
        assert_eq!(err.code(), "E_ENCODING_FAILURE");
        assert_eq!(err.stage(), "ingest");

        assert_eq!(UploadError::InvalidConfig(String::new()).stage(), "config");
    }

    #[test]
    fn converts_into_readable_string() {
        let message: String = UploadError::UnsupportedType("a.txt".to_string()).into();
        assert!(message.contains("a.txt"));
    }
}
