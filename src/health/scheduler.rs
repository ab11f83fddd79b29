//! 监控调度器模块
//!
//! 按固定间隔循环执行探测轮次：并发探测所有端点、汇总统计、输出报告、休眠

use crate::config::{Config, Endpoint, MonitorSettings};
use crate::error::Result;
use crate::health::domain::{extract_domain, DomainKey};
use crate::health::probe::{HealthProbe, HttpHealthProbe};
use crate::health::report::Reporter;
use crate::health::result::{ProbeResult, Verdict};
use crate::health::stats::StatsAggregator;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// 调度参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// 轮与轮之间的休眠时间
    pub round_interval: Duration,
    /// 每轮最大并发探测数，1 即顺序探测
    pub max_concurrent_probes: usize,
    /// 请求构建失败是否计入总次数
    pub count_build_failures: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings::from(&MonitorSettings::default())
    }
}

impl From<&MonitorSettings> for SchedulerSettings {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            round_interval: settings.round_interval(),
            max_concurrent_probes: settings.max_concurrent_probes,
            count_build_failures: settings.count_build_failures,
        }
    }
}

/// 带有预先解析域名键的端点
#[derive(Debug, Clone)]
pub struct MonitoredEndpoint {
    pub endpoint: Endpoint,
    pub domain: DomainKey,
}

/// 单轮探测汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    /// 轮次序号，从1开始
    pub round: u64,
    /// 判定成功的探测数
    pub succeeded: usize,
    /// 判定失败的探测数
    pub failed: usize,
    /// 请求无法构建的探测数
    pub not_built: usize,
    /// 本轮耗时
    pub duration: Duration,
}

impl RoundSummary {
    /// 实际发出请求的探测数
    pub fn probed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// 监控调度器
pub struct MonitorScheduler {
    /// 被监控端点（启动后不可变）
    targets: Vec<MonitoredEndpoint>,
    /// 健康探测器
    probe: Arc<dyn HealthProbe>,
    /// 统计聚合器
    stats: Arc<StatsAggregator>,
    /// 报告器
    reporter: Reporter,
    /// 调度参数
    settings: SchedulerSettings,
    /// 已开始的轮次数
    rounds: AtomicU64,
}

impl MonitorScheduler {
    /// 创建新的监控调度器
    ///
    /// 创建时为配置中出现的每个域名建立清零的统计记录，
    /// 使尚无数据的域名也会出现在报告里。
    pub fn new(
        endpoints: Vec<Endpoint>,
        probe: Arc<dyn HealthProbe>,
        stats: Arc<StatsAggregator>,
        reporter: Reporter,
        settings: SchedulerSettings,
    ) -> Self {
        let targets: Vec<MonitoredEndpoint> = endpoints
            .into_iter()
            .map(|endpoint| {
                let domain = extract_domain(&endpoint.url);
                stats.ensure(domain.as_str());
                MonitoredEndpoint { endpoint, domain }
            })
            .collect();

        info!(
            "监控调度器已创建，端点数量: {}，域名数量: {}",
            targets.len(),
            stats.len()
        );

        Self {
            targets,
            probe,
            stats,
            reporter,
            settings,
            rounds: AtomicU64::new(0),
        }
    }

    /// 按配置创建使用HTTP探测器的调度器
    pub fn from_config(config: &Config, reporter: Reporter) -> Result<Self> {
        let probe = HttpHealthProbe::new(
            config.monitor.request_timeout(),
            config.monitor.latency_threshold(),
        )?;

        Ok(Self::new(
            config.endpoints.clone(),
            Arc::new(probe),
            Arc::new(StatsAggregator::new()),
            reporter,
            SchedulerSettings::from(&config.monitor),
        ))
    }

    /// 被监控端点
    pub fn targets(&self) -> &[MonitoredEndpoint] {
        &self.targets
    }

    /// 统计聚合器
    pub fn stats(&self) -> &Arc<StatsAggregator> {
        &self.stats
    }

    /// 执行一轮探测（不输出报告）
    ///
    /// 所有端点通过大小为 `max_concurrent_probes` 的工作池并发探测，
    /// 结果按完成顺序计入统计。返回前本轮所有探测均已结束。
    pub async fn run_round(&self) -> RoundSummary {
        let round = self.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();
        let mut summary = RoundSummary {
            round,
            ..Default::default()
        };

        debug!("开始第 {} 轮探测", round);

        let probes: Vec<_> = self
            .targets
            .iter()
            .map(|target| self.probe_target(target))
            .collect();
        let mut outcomes =
            stream::iter(probes).buffer_unordered(self.settings.max_concurrent_probes.max(1));

        while let Some((target, outcome)) = outcomes.next().await {
            self.apply_outcome(target, outcome, &mut summary);
        }

        summary.duration = started.elapsed();
        info!(
            "第 {} 轮探测完成: 成功 {}，失败 {}，未发出 {}，耗时 {}ms",
            round,
            summary.succeeded,
            summary.failed,
            summary.not_built,
            summary.duration.as_millis()
        );

        summary
    }

    async fn probe_target<'a>(
        &self,
        target: &'a MonitoredEndpoint,
    ) -> (&'a MonitoredEndpoint, Result<ProbeResult>) {
        (target, self.probe.probe(&target.endpoint).await)
    }

    /// 将一次探测结果计入统计
    fn apply_outcome(
        &self,
        target: &MonitoredEndpoint,
        outcome: Result<ProbeResult>,
        summary: &mut RoundSummary,
    ) {
        let domain = target.domain.as_str();
        let label = target.endpoint.label();

        match outcome {
            Ok(result) => {
                self.stats.record_outcome(domain, result.is_success());

                match &result.verdict {
                    Verdict::Success => {
                        summary.succeeded += 1;
                        debug!(
                            "探测成功: {} ({}) {}ms",
                            label,
                            domain,
                            result.elapsed_ms()
                        );
                    }
                    Verdict::Failure(reason) => {
                        summary.failed += 1;
                        warn!(
                            "探测失败: {} ({}) {}ms, {}",
                            label,
                            domain,
                            result.elapsed_ms(),
                            reason
                        );
                    }
                }
            }
            Err(e) => {
                summary.not_built += 1;
                error!("无法构建探测请求: {} ({}), {}", label, domain, e);

                if self.settings.count_build_failures {
                    self.stats.record_outcome(domain, false);
                }
            }
        }
    }

    /// 输出当前统计快照
    pub fn report(&self) {
        let snapshot = self.stats.snapshot();
        if let Err(e) = self.reporter.report(&snapshot) {
            error!("输出可用性报告失败: {}", e);
        }
    }

    /// 执行一轮探测并输出报告
    pub async fn run_once(&self) -> RoundSummary {
        let summary = self.run_round().await;
        self.report();
        summary
    }

    /// 循环执行探测轮次，直到收到关闭信号
    ///
    /// 关闭信号在轮次进行中和轮间休眠时都会被检查。进行中的轮次被放弃时，
    /// 已计入的结果保留，尚未完成的探测被丢弃。
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "启动监控调度器，轮询间隔: {}秒，最大并发: {}",
            self.settings.round_interval.as_secs_f64(),
            self.settings.max_concurrent_probes
        );

        loop {
            tokio::select! {
                _ = self.run_round() => {}
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号，放弃进行中的探测轮次");
                    break;
                }
            }

            self.report();

            tokio::select! {
                _ = tokio::time::sleep(self.settings.round_interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号");
                    break;
                }
            }
        }

        info!("监控调度器已停止");
    }
}
