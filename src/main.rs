//! Service Availability 主程序入口
//!
//! HTTP端点可用性监控工具

use clap::Parser;
use service_availability::cli::{execute_command, init_logging, Args};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = execute_command(&args).await {
        // 配置加载失败时日志系统可能尚未初始化
        if init_logging(&args, None).is_err() {
            eprintln!("命令执行失败: {e}");
        } else {
            error!("命令执行失败: {}", e);
        }
        std::process::exit(1);
    }
}
