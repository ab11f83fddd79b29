//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{validate_config, Config, ConfigLoader, FileConfigLoader};
use crate::error::{ConfigError, Result};
use crate::health::{MonitorScheduler, NoDataStyle, ReportFormat, Reporter, StdoutSink};
use crate::logging::{parse_level, LogConfig, LoggingSystem};
use crate::shutdown::{setup_signal_handlers, shutdown_channel};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 示例配置模板
const SAMPLE_CONFIG: &str = include_str!("../../demos/config.toml");

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 执行CLI命令
pub async fn execute_command(args: &Args) -> Result<()> {
    match &args.command {
        Commands::Run { .. } => RunCommand.execute(args).await,
        Commands::Check { .. } => CheckCommand.execute(args).await,
        Commands::Validate { .. } => ValidateCommand.execute(args).await,
        Commands::Init { .. } => InitCommand.execute(args).await,
        Commands::Version { .. } => VersionCommand.execute(args).await,
    }
}

/// 初始化日志系统
///
/// 命令行指定的级别优先，其次是配置文件中的级别，默认 info。
pub fn init_logging(args: &Args, config_level: Option<&str>) -> anyhow::Result<LoggingSystem> {
    let level = args
        .log_level
        .clone()
        .map(log::LevelFilter::from)
        .or_else(|| config_level.and_then(parse_level))
        .unwrap_or(log::LevelFilter::Info);

    LoggingSystem::setup_logging(LogConfig {
        level,
        json_format: args.json_logs,
        ..Default::default()
    })
}

/// 加载配置文件并初始化日志
async fn load_config(args: &Args) -> Result<Config> {
    let config_path = args.get_config_path();
    let config = FileConfigLoader::new(true)
        .load_from_file(&config_path)
        .await?;

    init_logging(args, Some(&config.monitor.log_level))?;
    info!(
        "{} v{} 已加载配置: {}，端点数量: {}",
        crate::APP_NAME,
        crate::VERSION,
        config_path.display(),
        config.endpoints.len()
    );
    debug!("配置内容: {:?}", config);

    Ok(config)
}

/// 按配置和输出格式创建写到标准输出的报告器
fn stdout_reporter(config: &Config, format: OutputFormat) -> Reporter {
    Reporter::new(
        Arc::new(StdoutSink),
        ReportFormat::from(format),
        NoDataStyle::from_legacy_flag(config.monitor.legacy_no_data_format),
    )
}

/// 持续监控命令
pub struct RunCommand;

#[async_trait]
impl Command for RunCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Run {
            interval,
            max_concurrent,
            format,
        } = &args.command
        else {
            return Ok(());
        };

        let mut config = load_config(args).await?;
        apply_overrides(&mut config, *interval, *max_concurrent)?;

        let scheduler = MonitorScheduler::from_config(&config, stdout_reporter(&config, *format))?;

        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        setup_signal_handlers(shutdown_tx)?;

        scheduler.run(shutdown_rx).await;
        Ok(())
    }
}

/// 将命令行参数覆盖到配置并重新验证
pub fn apply_overrides(
    config: &mut Config,
    interval: Option<u64>,
    max_concurrent: Option<usize>,
) -> Result<()> {
    if let Some(interval) = interval {
        config.monitor.round_interval_seconds = interval;
    }
    if let Some(max_concurrent) = max_concurrent {
        config.monitor.max_concurrent_probes = max_concurrent;
    }

    validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
}

/// 单轮检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Check { format } = &args.command else {
            return Ok(());
        };

        let config = load_config(args).await?;
        let scheduler = MonitorScheduler::from_config(&config, stdout_reporter(&config, *format))?;
        scheduler.run_once().await;

        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            init_logging(args, None)?;
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let config = FileConfigLoader::new(true)
            .load_from_file(config_path)
            .await?;

        if verbose {
            let monitor = &config.monitor;
            println!("配置验证通过！");
            println!("监控参数:");
            println!("  轮询间隔: {}秒", monitor.round_interval_seconds);
            println!("  延迟阈值: {}毫秒", monitor.latency_threshold_ms);
            println!("  请求超时: {}毫秒", monitor.request_timeout_ms);
            println!("  最大并发: {}", monitor.max_concurrent_probes);
            println!(
                "  构建失败计入总数: {}",
                if monitor.count_build_failures { "是" } else { "否" }
            );

            println!("端点配置:");
            for (i, endpoint) in config.endpoints.iter().enumerate() {
                let method = if endpoint.method.is_empty() {
                    "(默认)"
                } else {
                    endpoint.method.as_str()
                };
                println!("  {}. {} {} ({})", i + 1, method, endpoint.url, endpoint.label());
                if !endpoint.headers.is_empty() {
                    println!("     请求头数量: {}", endpoint.headers.len());
                }
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个端点配置", config.endpoints.len());
        }

        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init { config_path, force } = &args.command {
            init_logging(args, None)?;
            self.create_config_file(config_path, *force).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(config_path, SAMPLE_CONFIG).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加需要监控的端点");

        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}
