//! 配置数据结构定义
//!
//! 定义端点描述、监控参数以及配置验证逻辑

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 主配置结构，包含监控参数和端点列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 监控参数
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// 端点列表（保持配置顺序）
    pub endpoints: Vec<Endpoint>,
}

/// 监控参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorSettings {
    /// 每轮之间的间隔（秒）
    #[serde(default = "default_round_interval")]
    pub round_interval_seconds: u64,
    /// 判定成功的延迟上限（毫秒，含边界）
    #[serde(default = "default_latency_threshold")]
    pub latency_threshold_ms: u64,
    /// 单次探测的网络超时（毫秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// 每轮最大并发探测数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_probes: usize,
    /// 请求构建失败是否计入总次数
    #[serde(default)]
    pub count_build_failures: bool,
    /// 使用旧版无分隔符的"无数据"输出
    #[serde(default)]
    pub legacy_no_data_format: bool,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            round_interval_seconds: default_round_interval(),
            latency_threshold_ms: default_latency_threshold(),
            request_timeout_ms: default_request_timeout(),
            max_concurrent_probes: default_max_concurrent(),
            count_build_failures: false,
            legacy_no_data_format: false,
            log_level: default_log_level(),
        }
    }
}

impl MonitorSettings {
    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.round_interval_seconds)
    }

    pub fn latency_threshold(&self) -> Duration {
        Duration::from_millis(self.latency_threshold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 单个被探测的HTTP端点
///
/// 启动时加载一次，此后不可变。`url` 与 `method` 不做预校验，
/// 无效值在探测时按失败路径处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    /// 展示名称，不参与任何逻辑
    #[serde(default)]
    pub name: String,
    /// 绝对URL
    pub url: String,
    /// HTTP方法，原样传递给客户端
    #[serde(default)]
    pub method: String,
    /// 请求头
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// 原始请求体，空字符串表示零长度请求体
    #[serde(default)]
    pub body: String,
}

impl Endpoint {
    /// 用于日志的标签：有名称时用名称，否则用URL
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

// 默认值函数
fn default_round_interval() -> u64 {
    15
}
fn default_latency_threshold() -> u64 {
    500
}
fn default_request_timeout() -> u64 {
    1000
}
fn default_max_concurrent() -> usize {
    16
}
fn default_log_level() -> String {
    "info".to_string()
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    let monitor = &config.monitor;

    if monitor.round_interval_seconds == 0 {
        return Err("轮询间隔不能为0".to_string());
    }

    if monitor.latency_threshold_ms == 0 {
        return Err("延迟阈值不能为0".to_string());
    }

    if monitor.request_timeout_ms == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if monitor.max_concurrent_probes == 0 {
        return Err("最大并发探测数不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&monitor.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            monitor.log_level, valid_log_levels
        ));
    }

    if config.endpoints.is_empty() {
        return Err("至少需要配置一个端点".to_string());
    }

    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.url.trim().is_empty() {
            return Err(format!("第 {} 个端点的URL不能为空", index + 1));
        }
    }

    Ok(())
}
