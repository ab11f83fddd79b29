//! 信号处理模块
//!
//! 将 SIGINT/SIGTERM（非Unix平台为 Ctrl+C）转换为广播关闭信号

use crate::error::Result;
use tokio::sync::broadcast;
use tracing::{error, info};

#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook_tokio::Signals;

/// 创建关闭信号通道
pub fn shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// 设置信号处理器，收到终止信号时向 `shutdown_tx` 发送一次关闭信号
pub fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    #[cfg(unix)]
    {
        setup_unix_signals(shutdown_tx)
    }
    #[cfg(not(unix))]
    {
        setup_ctrl_c(shutdown_tx);
        Ok(())
    }
}

/// Unix/Linux系统信号处理
#[cfg(unix)]
fn setup_unix_signals(shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    use futures::stream::StreamExt;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();

    tokio::spawn(async move {
        if let Some(signal) = signals.next().await {
            let name = if signal == SIGTERM { "SIGTERM" } else { "SIGINT" };
            info!("接收到 {} 信号，开始优雅关闭...", name);
            if let Err(e) = shutdown_tx.send(()) {
                error!("发送关闭信号失败: {e}");
            }
        }
        handle.close();
    });

    Ok(())
}

/// 非Unix平台的 Ctrl+C 处理
#[cfg(not(unix))]
fn setup_ctrl_c(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("接收到 Ctrl+C，开始优雅关闭...");
                if let Err(e) = shutdown_tx.send(()) {
                    error!("发送关闭信号失败: {e}");
                }
            }
            Err(e) => error!("监听中断信号失败: {e}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_signal_handlers() {
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        assert!(setup_signal_handlers(shutdown_tx).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_channel_delivers_to_all_receivers() {
        let (shutdown_tx, mut first) = shutdown_channel();
        let mut second = shutdown_tx.subscribe();

        shutdown_tx.send(()).unwrap();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }
}
