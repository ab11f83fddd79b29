//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Service Availability 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum ServiceAvailabilityError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 探测错误类型
///
/// 只覆盖"请求无法构建"一类问题；网络错误、非2xx状态码和超时
/// 都属于正常的失败判定，由 [`crate::health::Verdict`] 表达。
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP方法无效
    #[error("无效的HTTP方法: {method:?}")]
    InvalidMethod { method: String },

    /// 请求构建失败（URL、请求头等无效）
    #[error("构建请求失败 {url}: {source}")]
    RequestBuild {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP客户端创建失败
    #[error("创建HTTP客户端失败: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ServiceAvailabilityError>;
