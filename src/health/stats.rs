//! 按域名聚合的可用性统计
//!
//! 计数从进程启动起累计，轮与轮之间不清零

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 单个域名的累计计数
///
/// 不变量：`success <= total`，两者单调不减。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainStats {
    /// 成功次数
    pub success: u64,
    /// 总次数
    pub total: u64,
}

impl DomainStats {
    /// 可用性百分比，保留两位小数
    ///
    /// 计算方式为 `round(10000 * success / total) / 100`，`total == 0` 时返回 `None`。
    pub fn availability(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((10000.0 * self.success as f64 / self.total as f64).round() / 100.0)
    }
}

/// 统计快照
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// 快照时间
    pub taken_at: DateTime<Utc>,
    /// 域名到计数的映射（按域名排序）
    pub domains: BTreeMap<String, DomainStats>,
}

impl StatsSnapshot {
    pub fn get(&self, domain: &str) -> Option<DomainStats> {
        self.domains.get(domain).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// 域名统计聚合器
///
/// 每个结果的两个计数在同一次加锁内更新，读者不会看到只加了一半的状态。
#[derive(Debug, Default)]
pub struct StatsAggregator {
    table: Mutex<HashMap<String, DomainStats>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // 计数更新不会在持锁期间panic，中毒后的数据仍然一致
    fn lock(&self) -> MutexGuard<'_, HashMap<String, DomainStats>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 确保域名存在一条清零的记录（幂等）
    pub fn ensure(&self, domain: &str) {
        self.lock().entry(domain.to_string()).or_default();
    }

    /// 记录一次探测结果：总次数总是加一，成功时成功次数加一
    pub fn record_outcome(&self, domain: &str, success: bool) {
        let mut table = self.lock();
        let stats = table.entry(domain.to_string()).or_default();
        stats.total += 1;
        if success {
            stats.success += 1;
        }
    }

    /// 读取单个域名的计数
    pub fn get(&self, domain: &str) -> Option<DomainStats> {
        self.lock().get(domain).copied()
    }

    /// 获取所有域名的一致快照
    pub fn snapshot(&self) -> StatsSnapshot {
        let domains = self
            .lock()
            .iter()
            .map(|(domain, stats)| (domain.clone(), *stats))
            .collect();

        StatsSnapshot {
            taken_at: Utc::now(),
            domains,
        }
    }

    /// 已知域名数量
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
