//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::health::ReportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Service Availability - HTTP端点可用性监控工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "service-availability",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "配置文件路径",
        env = "SERVICE_AVAILABILITY_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别（未指定时使用配置文件中的级别）
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        help = "日志级别",
        env = "SERVICE_AVAILABILITY_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, global = true, help = "以JSON格式输出日志")]
    pub json_logs: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 持续监控，直到收到终止信号
    Run {
        /// 轮询间隔（秒），覆盖配置文件
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            help = "轮询间隔（秒）",
            env = "SERVICE_AVAILABILITY_INTERVAL"
        )]
        interval: Option<u64>,

        /// 每轮最大并发探测数，覆盖配置文件
        #[arg(
            long,
            value_name = "COUNT",
            help = "每轮最大并发探测数",
            env = "SERVICE_AVAILABILITY_MAX_CONCURRENT"
        )]
        max_concurrent: Option<usize>,

        /// 报告格式
        #[arg(short, long, value_enum, default_value = "text", help = "报告格式")]
        format: OutputFormat,
    },

    /// 执行一轮探测并输出报告
    Check {
        /// 报告格式
        #[arg(short, long, value_enum, default_value = "text", help = "报告格式")]
        format: OutputFormat,
    },

    /// 验证配置文件
    Validate {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径")]
        config_path: Option<PathBuf>,

        /// 是否显示详细信息
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 生成示例配置文件
    Init {
        /// 配置文件路径
        #[arg(value_name = "FILE", help = "配置文件路径", default_value = "config.toml")]
        config_path: PathBuf,

        /// 是否覆盖现有文件
        #[arg(short, long, help = "覆盖现有文件")]
        force: bool,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

impl Args {
    /// 获取配置文件路径
    pub fn get_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::get_default_config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let args = Args::try_parse_from([
            "service-availability",
            "--config",
            "monitor.toml",
            "run",
            "--interval",
            "5",
            "--max-concurrent",
            "4",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("monitor.toml")));
        assert_eq!(args.get_config_path(), PathBuf::from("monitor.toml"));
        match args.command {
            Commands::Run {
                interval,
                max_concurrent,
                format,
            } => {
                assert_eq!(interval, Some(5));
                assert_eq!(max_concurrent, Some(4));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "service-availability",
            "check",
            "--format",
            "json",
            "-l",
            "debug",
            "-c",
            "endpoints.json",
        ])
        .unwrap();

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.config, Some(PathBuf::from("endpoints.json")));
        assert!(matches!(
            args.command,
            Commands::Check {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(ReportFormat::from(OutputFormat::Json), ReportFormat::Json);
        assert_eq!(ReportFormat::from(OutputFormat::Text), ReportFormat::Text);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
    }
}
