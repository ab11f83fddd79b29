//! 可用性报告
//!
//! 将统计快照渲染为每个域名一行的文本或JSON输出

use crate::health::stats::{DomainStats, StatsSnapshot};
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// 报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `<domain> has <percentage>% availability`
    #[default]
    Text,
    /// 每行一个JSON对象
    Json,
}

/// "无数据"行的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoDataStyle {
    /// `No data is available for <domain>`
    #[default]
    Separated,
    /// `No data is available<domain>`，兼容旧输出
    Legacy,
}

impl NoDataStyle {
    /// 根据配置中的兼容开关选择写法
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            NoDataStyle::Legacy
        } else {
            NoDataStyle::Separated
        }
    }
}

/// 单个域名的报告行
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    /// 有数据：可用性百分比
    Availability {
        domain: String,
        percentage: f64,
        stats: DomainStats,
    },
    /// 尚无任何计数
    NoData { domain: String },
}

impl ReportLine {
    pub fn from_stats(domain: &str, stats: DomainStats) -> Self {
        match stats.availability() {
            Some(percentage) => ReportLine::Availability {
                domain: domain.to_string(),
                percentage,
                stats,
            },
            None => ReportLine::NoData {
                domain: domain.to_string(),
            },
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            ReportLine::Availability { domain, .. } | ReportLine::NoData { domain } => domain,
        }
    }

    /// 渲染为一行输出（不含换行符）
    pub fn render(&self, format: ReportFormat, no_data_style: NoDataStyle) -> String {
        match (format, self) {
            (ReportFormat::Text, ReportLine::Availability { domain, percentage, .. }) => {
                format!("{domain} has {percentage:.2}% availability")
            }
            (ReportFormat::Text, ReportLine::NoData { domain }) => match no_data_style {
                NoDataStyle::Separated => format!("No data is available for {domain}"),
                NoDataStyle::Legacy => format!("No data is available{domain}"),
            },
            (ReportFormat::Json, ReportLine::Availability { domain, percentage, stats }) => json!({
                "domain": domain,
                "availability": percentage,
                "success": stats.success,
                "total": stats.total,
            })
            .to_string(),
            (ReportFormat::Json, ReportLine::NoData { domain }) => json!({
                "domain": domain,
                "availability": null,
                "success": 0,
                "total": 0,
            })
            .to_string(),
        }
    }
}

/// 报告输出目标
pub trait ReportSink: Send + Sync {
    /// 写出一行（不含换行符）
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// 标准输出
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// 收集到内存中的输出，主要用于测试
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写出的全部行
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 取出并清空已写出的行
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ReportSink for CollectingSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}

/// 可用性报告器
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ReportSink>,
    format: ReportFormat,
    no_data_style: NoDataStyle,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ReportSink>, format: ReportFormat, no_data_style: NoDataStyle) -> Self {
        Self {
            sink,
            format,
            no_data_style,
        }
    }

    /// 快照中每个域名一行
    pub fn lines(snapshot: &StatsSnapshot) -> Vec<ReportLine> {
        snapshot
            .domains
            .iter()
            .map(|(domain, stats)| ReportLine::from_stats(domain, *stats))
            .collect()
    }

    /// 渲染快照
    pub fn render(&self, snapshot: &StatsSnapshot) -> Vec<String> {
        Self::lines(snapshot)
            .iter()
            .map(|line| line.render(self.format, self.no_data_style))
            .collect()
    }

    /// 渲染快照并写出到输出目标
    pub fn report(&self, snapshot: &StatsSnapshot) -> io::Result<()> {
        for line in self.render(snapshot) {
            self.sink.write_line(&line)?;
        }
        Ok(())
    }
}
