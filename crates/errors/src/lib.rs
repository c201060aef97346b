//! courier-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 验证码不匹配时返回给用户的提示
pub const CODE_MISMATCH_MESSAGE: &str =
    "the provided code is invalid, check for spelling mistakes in the code or phone number";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(String),

    #[error("Unexpected template type: {0}")]
    TemplateResolution(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 队列为空，调度层视为成功
    #[error("queue is empty")]
    EmptyQueue,

    #[error("active code found, will not resend until it expires")]
    ActiveCodeExists,

    #[error("active code not found")]
    NoActiveCode,

    #[error("{CODE_MISMATCH_MESSAGE}")]
    CodeMismatch,

    #[error("Flow invalid: {0}")]
    FlowInvalid(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn configuration_missing(msg: impl Into<String>) -> Self {
        Self::ConfigurationMissing(msg.into())
    }

    pub fn transport_failure(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    pub fn unsupported_message_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMessageType(msg.into())
    }

    pub fn template_resolution(msg: impl Into<String>) -> Self {
        Self::TemplateResolution(msg.into())
    }

    pub fn flow_invalid(msg: impl Into<String>) -> Self {
        Self::FlowInvalid(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 是否为空队列信号
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, Self::EmptyQueue)
    }

    /// 错误信息是否可以直接展示给终端用户
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::ActiveCodeExists
                | Self::NoActiveCode
                | Self::CodeMismatch
                | Self::FlowInvalid(_)
                | Self::Validation(_)
        )
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ConfigurationMissing(_) => 500,
            Self::TransportFailure(_) => 502,
            Self::UnsupportedMessageType(_) => 500,
            Self::TemplateResolution(_) => 500,
            Self::Serialization(_) => 500,
            Self::EmptyQueue => 404,
            Self::ActiveCodeExists => 429,
            Self::NoActiveCode => 400,
            Self::CodeMismatch => 400,
            Self::FlowInvalid(_) => 410,
            Self::Validation(_) => 400,
            Self::Store(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    ///
    /// 非用户可见的错误只暴露标题，不暴露内部细节。
    pub fn to_problem_details(&self) -> ProblemDetails {
        let detail = if self.is_user_facing() {
            self.to_string()
        } else {
            self.problem_title()
        };

        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail,
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::ConfigurationMissing(_) => "configuration-missing",
            Self::TransportFailure(_) => "transport-failure",
            Self::UnsupportedMessageType(_) => "unsupported-message-type",
            Self::TemplateResolution(_) => "template-resolution",
            Self::Serialization(_) => "serialization",
            Self::EmptyQueue => "empty-queue",
            Self::ActiveCodeExists => "active-code-exists",
            Self::NoActiveCode => "no-active-code",
            Self::CodeMismatch => "code-mismatch",
            Self::FlowInvalid(_) => "flow-invalid",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
            Self::Internal(_) => "internal",
        };
        format!("https://courier.dev/problems/{slug}")
    }

    fn problem_title(&self) -> String {
        match self {
            Self::ConfigurationMissing(_) => "Configuration Missing".to_string(),
            Self::TransportFailure(_) => "Transport Failure".to_string(),
            Self::UnsupportedMessageType(_) => "Unsupported Message Type".to_string(),
            Self::TemplateResolution(_) => "Template Resolution Failure".to_string(),
            Self::Serialization(_) => "Serialization Error".to_string(),
            Self::EmptyQueue => "Queue Empty".to_string(),
            Self::ActiveCodeExists => "Code Already Sent".to_string(),
            Self::NoActiveCode => "No Active Code".to_string(),
            Self::CodeMismatch => "Invalid Code".to_string(),
            Self::FlowInvalid(_) => "Flow Invalid".to_string(),
            Self::Validation(_) => "Validation Error".to_string(),
            Self::Store(_) => "Store Error".to_string(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mismatch_is_user_facing() {
        let err = AppError::CodeMismatch;
        let problem = err.to_problem_details();

        assert!(err.is_user_facing());
        assert_eq!(problem.status, 400);
        assert_eq!(problem.detail, CODE_MISMATCH_MESSAGE);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::transport_failure("dial tcp 10.0.0.3:25: connection refused");
        let problem = err.to_problem_details();

        assert!(!err.is_user_facing());
        assert_eq!(problem.status, 502);
        assert!(!problem.detail.contains("10.0.0.3"));
        assert!(problem.r#type.ends_with("/transport-failure"));
    }

    #[test]
    fn test_empty_queue_signal() {
        assert!(AppError::EmptyQueue.is_empty_queue());
        assert!(!AppError::store("down").is_empty_queue());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Serialization(_)));
    }
}
