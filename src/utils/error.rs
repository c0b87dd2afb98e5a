use thiserror::Error;

use crate::models::chart::Beat;

/// 谱面解析错误，对单次上传是致命的
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无法识别的谱面格式")]
    UnsupportedFormat,

    #[error("非法的拍数分数: {0}")]
    InvalidTimeSignature(Beat),

    #[error("读取谱面失败: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("谱面解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("存储失败: {0}")]
    Storage(String),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde JSON错误: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("验证错误: {0}")]
    ValidationError(String),

    #[error("状态错误: {0}")]
    InvalidState(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 给调用方使用的简短错误类型标识
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Parse(ParseError::UnsupportedFormat) => "unsupported_format",
            AppError::Parse(ParseError::InvalidTimeSignature(_)) => "invalid_time_signature",
            AppError::Parse(ParseError::Io(_)) | AppError::IoError(_) => "io_error",
            AppError::Storage(_) => "storage_error",
            AppError::SerdeJsonError(_) => "serialization_error",
            AppError::ConfigError(_) => "configuration_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::InvalidState(_) => "invalid_state",
        }
    }
}
