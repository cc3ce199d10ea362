//! 生成器错误类型
//!
//! 核心生成流程只会因为配置问题失败，所有错误都应立即向上传播，不做重试。

use flowgen_shared::error::FlowgenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("转移表中不存在状态: {state}")]
    InvalidState { state: String },

    #[error("状态 {state} 的转移概率无效: {reason}")]
    InvalidTransitions { state: String, reason: String },

    #[error("未知的行为类型: {0}")]
    UnknownAction(String),

    #[error("缺少结果模板: action={action} status={status}")]
    MissingTemplate { action: String, status: u16 },

    #[error("候选集合为空: {0}")]
    EmptyPool(&'static str),

    #[error("连续 {attempts} 次会话未产生任何事件，请检查转移表")]
    EmptyFlow { attempts: usize },

    #[error("无效的日期: {0}")]
    InvalidDate(String),

    #[error("无效的时间窗口: start={start} 晚于 end={end}")]
    InvalidWindow { start: String, end: String },

    #[error("无效的生成参数: {field} - {message}")]
    InvalidParams { field: String, message: String },

    #[error(transparent)]
    Infra(#[from] FlowgenError),
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::InvalidTransitions { .. } => "INVALID_TRANSITIONS",
            Self::UnknownAction(_) => "UNKNOWN_ACTION",
            Self::MissingTemplate { .. } => "MISSING_TEMPLATE",
            Self::EmptyPool(_) => "EMPTY_POOL",
            Self::EmptyFlow { .. } => "EMPTY_FLOW",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidWindow { .. } => "INVALID_WINDOW",
            Self::InvalidParams { .. } => "INVALID_PARAMS",
            Self::Infra(e) => e.code(),
        }
    }

    pub(crate) fn invalid_params(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
