//! HTTP健康探测器实现
//!
//! 对单个端点发起一次HTTP请求，并按状态码与延迟进行判定

use crate::config::Endpoint;
use crate::error::{ProbeError, Result};
use crate::health::result::{classify, FailureReason, ProbeResult, Verdict};
use async_trait::async_trait;
use reqwest::{Client, Method, Request};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// 健康探测器trait，定义探测接口
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// 对一个端点执行一次探测
    ///
    /// # 返回
    /// * `Ok(ProbeResult)` - 请求已发出（无论成功与否）
    /// * `Err(_)` - 请求无法构建，没有发生网络调用
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeResult>;
}

/// HTTP健康探测器实现
pub struct HttpHealthProbe {
    /// HTTP客户端
    client: Client,
    /// 单次探测的网络超时
    request_timeout: Duration,
    /// 判定成功的延迟上限
    latency_threshold: Duration,
}

impl HttpHealthProbe {
    /// 创建新的HTTP健康探测器
    ///
    /// # 参数
    /// * `request_timeout` - 单次探测的网络超时
    /// * `latency_threshold` - 判定成功的延迟上限（含边界）
    pub fn new(request_timeout: Duration, latency_threshold: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(ProbeError::ClientBuild)?;

        Ok(Self {
            client,
            request_timeout,
            latency_threshold,
        })
    }

    /// 解析HTTP方法
    ///
    /// 方法名原样传递（不做大小写转换）；空字符串交由客户端默认方法（GET）处理。
    fn parse_method(method: &str) -> Result<Method> {
        if method.is_empty() {
            return Ok(Method::default());
        }

        Method::from_bytes(method.as_bytes()).map_err(|_| {
            ProbeError::InvalidMethod {
                method: method.to_string(),
            }
            .into()
        })
    }

    /// 构建HTTP请求
    fn build_request(&self, endpoint: &Endpoint) -> Result<Request> {
        let method = Self::parse_method(&endpoint.method)?;

        let mut request = self.client.request(method, &endpoint.url);

        for (key, value) in &endpoint.headers {
            request = request.header(key, value);
        }

        let request = request
            .body(endpoint.body.clone())
            .build()
            .map_err(|source| ProbeError::RequestBuild {
                url: endpoint.url.clone(),
                source,
            })?;

        Ok(request)
    }

    /// 将网络层错误转换为失败原因
    fn transport_failure(error: &reqwest::Error) -> FailureReason {
        if error.is_timeout() {
            FailureReason::Timeout
        } else if error.is_connect() {
            FailureReason::Transport {
                message: format!("Connection failed: {error}"),
            }
        } else {
            FailureReason::Transport {
                message: format!("Request failed: {error}"),
            }
        }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeResult> {
        let request = self.build_request(endpoint)?;

        let start_time = Instant::now();
        let response_result = timeout(self.request_timeout, self.client.execute(request)).await;
        let elapsed = start_time.elapsed();

        let (status_code, verdict) = match response_result {
            Ok(Ok(response)) => {
                // 响应在本分支结束时释放，连接随之归还
                let status_code = response.status().as_u16();
                (
                    Some(status_code),
                    classify(status_code, elapsed, self.latency_threshold),
                )
            }
            Ok(Err(e)) => (None, Verdict::Failure(Self::transport_failure(&e))),
            Err(_) => (None, Verdict::Failure(FailureReason::Timeout)),
        };

        Ok(ProbeResult {
            endpoint_name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            status_code,
            elapsed,
            verdict,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceAvailabilityError;
    use std::collections::HashMap;

    fn create_test_endpoint(url: &str, method: &str) -> Endpoint {
        Endpoint {
            name: "Test Endpoint".to_string(),
            url: url.to_string(),
            method: method.to_string(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    fn create_probe() -> HttpHealthProbe {
        HttpHealthProbe::new(Duration::from_secs(2), Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(HttpHealthProbe::parse_method("").unwrap(), Method::GET);
        assert_eq!(HttpHealthProbe::parse_method("POST").unwrap(), Method::POST);
        assert_eq!(HttpHealthProbe::parse_method("get").unwrap().as_str(), "get");
        assert!(HttpHealthProbe::parse_method("BAD METHOD").is_err());
    }

    #[tokio::test]
    async fn test_successful_probe() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(204)
            .create_async()
            .await;

        let endpoint = create_test_endpoint(&format!("{}/health", server.url()), "GET");
        let result = create_probe().probe(&endpoint).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.status_code, Some(204));
        assert!(result.is_success());
        assert_eq!(result.endpoint_name, "Test Endpoint");
    }

    #[tokio::test]
    async fn test_non_2xx_is_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/broken")
            .with_status(500)
            .create_async()
            .await;

        let endpoint = create_test_endpoint(&format!("{}/broken", server.url()), "GET");
        let result = create_probe().probe(&endpoint).await.unwrap();

        assert_eq!(result.status_code, Some(500));
        assert_eq!(
            result.verdict,
            Verdict::Failure(FailureReason::Status { code: 500 })
        );
    }

    #[tokio::test]
    async fn test_headers_and_body_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_header("x-probe", "availability")
            .match_body(r#"{"user":"probe"}"#)
            .with_status(200)
            .create_async()
            .await;

        let mut endpoint = create_test_endpoint(&format!("{}/login", server.url()), "POST");
        endpoint
            .headers
            .insert("X-Probe".to_string(), "availability".to_string());
        endpoint.body = r#"{"user":"probe"}"#.to_string();

        let result = create_probe().probe(&endpoint).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_empty_method_uses_client_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/").with_status(200).create_async().await;

        let endpoint = create_test_endpoint(&format!("{}/", server.url()), "");
        let result = create_probe().probe(&endpoint).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_counted_failure() {
        // 绑定后立即释放端口，保证无人监听
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = create_test_endpoint(&format!("http://{addr}/"), "GET");
        let result = create_probe().probe(&endpoint).await.unwrap();

        assert!(result.status_code.is_none());
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // 接受连接但从不响应
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let probe =
            HttpHealthProbe::new(Duration::from_millis(200), Duration::from_millis(500)).unwrap();
        let endpoint = create_test_endpoint(&format!("http://{addr}/"), "GET");
        let result = probe.probe(&endpoint).await.unwrap();

        assert_eq!(result.verdict, Verdict::Failure(FailureReason::Timeout));
        assert!(result.elapsed >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_late_2xx_is_slow_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // 读取请求后延迟 700ms 才返回 200
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_millis(700)).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await;
            let _ = socket.shutdown().await;
        });

        let probe = HttpHealthProbe::new(Duration::from_secs(2), Duration::from_millis(500)).unwrap();
        let endpoint = create_test_endpoint(&format!("http://{addr}/"), "GET");
        let result = probe.probe(&endpoint).await.unwrap();

        assert_eq!(result.status_code, Some(200));
        assert!(result.elapsed >= Duration::from_millis(700));
        assert!(matches!(
            result.verdict,
            Verdict::Failure(FailureReason::Slow { elapsed }) if elapsed >= Duration::from_millis(700)
        ));
    }

    #[tokio::test]
    async fn test_invalid_method_is_build_error() {
        let endpoint = create_test_endpoint("http://127.0.0.1/", "NOT VALID");
        let result = create_probe().probe(&endpoint).await;

        assert!(matches!(
            result,
            Err(ServiceAvailabilityError::Probe(ProbeError::InvalidMethod { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_url_is_build_error() {
        let endpoint = create_test_endpoint("not a url \t", "GET");
        let result = create_probe().probe(&endpoint).await;

        assert!(matches!(
            result,
            Err(ServiceAvailabilityError::Probe(ProbeError::RequestBuild { .. }))
        ));
    }
}
