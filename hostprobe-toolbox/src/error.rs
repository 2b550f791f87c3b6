//! 统一错误类型定义

use serde::Serialize;
use thiserror::Error;

/// 工具箱错误类型
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// 验证错误 (caller input rejected before any probing)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 网络错误
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 解析错误
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ToolboxError {
    /// Whether the error is expected behaviour (bad input, unreachable host),
    /// used to pick between `warn` and `error` log levels.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_) | Self::NetworkError(_) => true,
            Self::ParseError(_) => false,
        }
    }
}

/// 工具箱 Result 类型别名
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;
