//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，命令行入口统一返回 `Result<T, AppError>`。
//! 上传链路本身的错误由 `UploadError` 承载，这里只负责汇总与序列化。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `UploadError` / `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 输出给宿主。

use serde::Serialize;

use crate::uploader::UploadError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 上传暂存链路错误（配置 / 编码 / 校验）
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// 输出结果时的 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 结果序列化失败
    #[error("序列化失败: {0}")]
    Serialize(String),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_converts_and_serializes_as_string() {
        let err: AppError = UploadError::InvalidConfig("max_number 不能为 0".to_string()).into();
        let json = serde_json::to_string(&err).expect("serialize app error");

        assert!(matches!(err, AppError::Upload(UploadError::InvalidConfig(_))));
        assert!(json.contains("max_number"));
    }

    #[test]
    fn io_error_converts_for_output_failures() {
        let err: AppError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed").into();

        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("stdout closed"));
    }
}
