//! 健康探测模块
//!
//! 提供域名提取、HTTP探测与判定、统计聚合、报告输出和轮次调度功能

pub mod domain;
pub mod probe;
pub mod report;
pub mod result;
pub mod scheduler;
pub mod stats;

// 重新导出主要类型
pub use domain::{extract_domain, DomainKey};
pub use probe::{HealthProbe, HttpHealthProbe};
pub use report::{CollectingSink, NoDataStyle, ReportFormat, ReportLine, ReportSink, Reporter, StdoutSink};
pub use result::{classify, FailureReason, ProbeResult, Verdict};
pub use scheduler::{MonitorScheduler, MonitoredEndpoint, RoundSummary, SchedulerSettings};
pub use stats::{DomainStats, StatsAggregator, StatsSnapshot};
