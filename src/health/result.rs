//! 探测结果数据结构
//!
//! 定义单次探测的结果、判定以及成功判定规则

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::time::Duration;

/// 判定为成功的状态码范围 `[200, 300)`
pub const SUCCESS_STATUS_RANGE: Range<u16> = 200..300;

/// 默认延迟上限
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(500);

/// 失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// 网络层错误（DNS、连接被拒等）
    Transport { message: String },
    /// 超过探测网络超时
    Timeout,
    /// 状态码不在成功范围内
    Status { code: u16 },
    /// 2xx 响应但超过延迟上限
    Slow {
        #[serde(with = "millis")]
        elapsed: Duration,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Transport { message } => write!(f, "{message}"),
            FailureReason::Timeout => write!(f, "Request timeout"),
            FailureReason::Status { code } => write!(
                f,
                "HTTP {} {}",
                code,
                reqwest::StatusCode::from_u16(*code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown")
            ),
            FailureReason::Slow { elapsed } => {
                write!(f, "Too slow: {}ms", elapsed.as_millis())
            }
        }
    }
}

/// 单次探测的判定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Success,
    Failure(FailureReason),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

/// 对已返回响应的请求进行判定
///
/// 成功当且仅当状态码位于 `[200, 300)` 且耗时不超过 `latency_threshold`（含边界）。
/// 延迟是硬性门槛：超时到达的 2xx 也是失败。
pub fn classify(status_code: u16, elapsed: Duration, latency_threshold: Duration) -> Verdict {
    if !SUCCESS_STATUS_RANGE.contains(&status_code) {
        return Verdict::Failure(FailureReason::Status { code: status_code });
    }

    if elapsed > latency_threshold {
        return Verdict::Failure(FailureReason::Slow { elapsed });
    }

    Verdict::Success
}

/// 单次探测结果
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// 端点名称
    pub endpoint_name: String,
    /// 端点URL
    pub url: String,
    /// HTTP状态码（收到响应时）
    pub status_code: Option<u16>,
    /// 从发出请求到调用返回的耗时
    #[serde(with = "millis")]
    pub elapsed: Duration,
    /// 判定
    pub verdict: Verdict,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }

    /// 耗时（毫秒）
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Duration 按毫秒序列化
mod millis {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }
}
