//! Service Availability - HTTP端点可用性监控工具
//!
//! 周期性探测一组HTTP(S)端点，支持：
//! - 按状态码范围与延迟上限联合判定成功
//! - 按域名累计成功次数与总次数
//! - 每轮输出累计可用性百分比
//! - 有界并发探测与优雅关闭

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod shutdown;

// 重新导出主要类型
pub use config::{Config, Endpoint, MonitorSettings};
pub use error::ServiceAvailabilityError;
pub use health::{DomainKey, DomainStats, HealthProbe, MonitorScheduler, StatsAggregator};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
