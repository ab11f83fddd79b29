//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能。日志写到标准错误，标准输出留给可用性报告。

use log::LevelFilter;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<bool>> = OnceLock::new();

/// 订阅器已安装时 `try_init` 可能返回的错误信息
const ALREADY_INITIALIZED_MESSAGES: [&str; 2] = [
    "attempted to set a logger after the logging system was already initialized",
    "a global default trace dispatcher has already been set",
];

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            json_format: false,
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，重复调用返回新的句柄而不重复安装订阅器。
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex = GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(false));

        let mut initialized = state_mutex
            .lock()
            .map_err(|e| anyhow::anyhow!("日志状态锁异常: {}", e))?;

        if !*initialized {
            Self::init_log_tracer()?;
            Self::init_tracing_subscriber(&config)?;
            *initialized = true;
        }

        Ok(Self { config })
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_already_initialized(e) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("LogTracer初始化失败: {}", e)),
        }
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        let layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(false)
                .boxed()
        };

        match registry().with(env_filter).with(layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if is_already_initialized(&error_msg) {
                    // LogTracer 已由上一步安装
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("tracing subscriber初始化失败: {}", error_msg))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }

    /// 本句柄的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

fn is_already_initialized(error_msg: &str) -> bool {
    ALREADY_INITIALIZED_MESSAGES
        .iter()
        .any(|message| error_msg.contains(message))
}

/// 将配置文件中的级别名称转换为 `LevelFilter`
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        _ => None,
    }
}
