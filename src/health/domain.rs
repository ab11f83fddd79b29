//! 域名提取
//!
//! 将端点URL映射为统计聚合用的域名键

use serde::Serialize;
use std::fmt;
use tracing::warn;
use url::{Host, Url};

/// 统计聚合键
///
/// `Parsed` 为成功解析出的主机名；`Fallback` 为URL无法解析（或没有主机部分）时
/// 原样保留的输入字符串。同一输入总是得到同一个键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum DomainKey {
    /// 解析得到的主机名（不含协议、端口、路径）
    Parsed(String),
    /// 降级键：原始URL字符串
    Fallback(String),
}

impl DomainKey {
    /// 聚合键字符串
    pub fn as_str(&self) -> &str {
        match self {
            DomainKey::Parsed(host) => host,
            DomainKey::Fallback(raw) => raw,
        }
    }

    /// 是否为降级键
    pub fn is_fallback(&self) -> bool {
        matches!(self, DomainKey::Fallback(_))
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从URL中提取主机名
///
/// 解析失败不会中断调用方：记录警告并返回 [`DomainKey::Fallback`]。
/// IPv6 主机名不带方括号。
pub fn extract_domain(raw_url: &str) -> DomainKey {
    let parsed = match Url::parse(raw_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("解析URL失败: {:?} ({})，使用原始字符串作为统计键", raw_url, e);
            return DomainKey::Fallback(raw_url.to_string());
        }
    };

    match parsed.host() {
        Some(Host::Domain(domain)) => DomainKey::Parsed(domain.to_string()),
        Some(Host::Ipv4(addr)) => DomainKey::Parsed(addr.to_string()),
        Some(Host::Ipv6(addr)) => DomainKey::Parsed(addr.to_string()),
        None => {
            warn!("URL缺少主机部分: {:?}，使用原始字符串作为统计键", raw_url);
            DomainKey::Fallback(raw_url.to_string())
        }
    }
}
