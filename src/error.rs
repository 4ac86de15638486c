use thiserror::Error;

/// 推荐核心的错误类型。
///
/// 合法但退化的输入（空历史、空候选池、未匹配的知识点）不会产生错误，
/// 只有绕过边界校验的越界请求或非法调参才会被拒绝。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl RecommendError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
