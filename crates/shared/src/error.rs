//! 统一错误处理模块
//!
//! 定义基础设施层（配置加载、数据集读写）共享的错误类型，使用 thiserror 提供良好的错误信息。

use std::path::PathBuf;

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum FlowgenError {
    // ==================== 文件错误 ====================
    #[error("文件读写失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("数据集不存在: {dataset}{suffix}")]
    DatasetNotFound { dataset: String, suffix: String },

    // ==================== 序列化错误 ====================
    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    // ==================== 配置错误 ====================
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("无效的配置项: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    // ==================== 可观测性错误 ====================
    #[error("可观测性初始化失败: {0}")]
    Observability(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, FlowgenError>;

impl FlowgenError {
    /// 构造带路径信息的 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::DatasetNotFound { .. } => "DATASET_NOT_FOUND",
            Self::Json(_) => "JSON_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Observability(_) => "OBSERVABILITY_ERROR",
        }
    }
}
