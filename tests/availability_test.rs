//! 可用性监控端到端测试
//!
//! 使用本地HTTP服务验证探测、按域名聚合和报告输出的完整流程

use service_availability::config::{Config, Endpoint, MonitorSettings};
use service_availability::health::{
    CollectingSink, MonitorScheduler, NoDataStyle, ReportFormat, Reporter,
};
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

fn endpoint(name: &str, url: String, method: &str) -> Endpoint {
    Endpoint {
        name: name.to_string(),
        url,
        method: method.to_string(),
        headers: HashMap::new(),
        body: String::new(),
    }
}

fn config_with(endpoints: Vec<Endpoint>) -> Config {
    Config {
        monitor: MonitorSettings {
            request_timeout_ms: 300,
            ..Default::default()
        },
        endpoints,
    }
}

fn scheduler_for(config: &Config) -> (MonitorScheduler, CollectingSink) {
    let sink = CollectingSink::new();
    let reporter = Reporter::new(
        Arc::new(sink.clone()),
        ReportFormat::Text,
        NoDataStyle::from_legacy_flag(config.monitor.legacy_no_data_format),
    );
    let scheduler = MonitorScheduler::from_config(config, reporter).unwrap();
    (scheduler, sink)
}

/// 接受连接但从不响应的服务，返回其地址
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_same_domain_success_and_failure() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/ok").with_status(200).create_async().await;
    server
        .mock("GET", "/error")
        .with_status(500)
        .create_async()
        .await;

    let config = config_with(vec![
        endpoint("ok", format!("{}/ok", server.url()), "GET"),
        endpoint("error", format!("{}/error", server.url()), "GET"),
    ]);
    let (scheduler, sink) = scheduler_for(&config);

    let summary = scheduler.run_once().await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    let stats = scheduler.stats().get("127.0.0.1").unwrap();
    assert_eq!((stats.success, stats.total), (1, 2));
    assert_eq!(sink.lines(), vec!["127.0.0.1 has 50.00% availability"]);
}

#[tokio::test]
async fn test_unresponsive_domain_reports_zero_availability() {
    let base = silent_server().await;
    let config = config_with(vec![endpoint("silent", format!("{base}/health"), "GET")]);
    let (scheduler, sink) = scheduler_for(&config);

    let rounds = 3;
    for _ in 0..rounds {
        let summary = scheduler.run_once().await;
        assert_eq!(summary.failed, 1);
        assert!(summary.duration < Duration::from_secs(2));
    }

    let stats = scheduler.stats().get("127.0.0.1").unwrap();
    assert_eq!((stats.success, stats.total), (0, rounds));
    assert_eq!(
        sink.take().last().map(String::as_str),
        Some("127.0.0.1 has 0.00% availability")
    );
}

#[tokio::test]
async fn test_slow_endpoint_does_not_stall_other_probes() {
    let base = silent_server().await;
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(200).create_async().await;

    let mut endpoints: Vec<Endpoint> = (0..4)
        .map(|i| endpoint(&format!("silent-{i}"), format!("{base}/{i}"), "GET"))
        .collect();
    endpoints.push(endpoint("fast", format!("{}/", server.url()), "GET"));
    let (scheduler, _sink) = scheduler_for(&config_with(endpoints));

    let summary = scheduler.run_round().await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 4);
    // 四个超时探测并发执行，不会累加成 4 倍超时
    assert!(summary.duration < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_report_covers_every_configured_domain() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(200).create_async().await;

    let mut config = config_with(vec![
        endpoint("local", format!("{}/", server.url()), "GET"),
        endpoint("broken", "http://broken.invalid/".to_string(), "BAD METHOD"),
    ]);
    config.monitor.legacy_no_data_format = true;
    let (scheduler, sink) = scheduler_for(&config);

    let summary = scheduler.run_once().await;
    assert_eq!(summary.not_built, 1);

    let lines: HashSet<String> = sink.lines().into_iter().collect();
    let expected: HashSet<String> = [
        "127.0.0.1 has 100.00% availability",
        "No data is availablebroken.invalid",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn test_build_failures_counted_when_configured() {
    let mut config = config_with(vec![endpoint(
        "broken",
        "http://broken.invalid/".to_string(),
        "BAD METHOD",
    )]);
    config.monitor.count_build_failures = true;
    let (scheduler, sink) = scheduler_for(&config);

    scheduler.run_once().await;

    let stats = scheduler.stats().get("broken.invalid").unwrap();
    assert_eq!((stats.success, stats.total), (0, 1));
    assert_eq!(sink.lines(), vec!["broken.invalid has 0.00% availability"]);
}

#[tokio::test]
async fn test_malformed_url_keeps_stable_fallback_key() {
    let raw = "not a url \t";
    let config = config_with(vec![endpoint("bad", raw.to_string(), "GET")]);
    let (scheduler, sink) = scheduler_for(&config);

    assert!(scheduler.targets()[0].domain.is_fallback());

    scheduler.run_once().await;
    scheduler.run_once().await;

    assert_eq!(scheduler.stats().len(), 1);
    assert_eq!(scheduler.stats().get(raw).unwrap().total, 0);
    assert_eq!(
        sink.lines(),
        vec![
            format!("No data is available for {raw}"),
            format!("No data is available for {raw}"),
        ]
    );
}

#[tokio::test]
async fn test_run_loop_reports_each_round_until_shutdown() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(200).create_async().await;

    let mut config = config_with(vec![endpoint("local", format!("{}/", server.url()), "GET")]);
    config.monitor.round_interval_seconds = 1;
    let (scheduler, sink) = scheduler_for(&config);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let _ = shutdown_tx.send(());
    });

    tokio::time::timeout(Duration::from_secs(5), scheduler.run(shutdown_rx))
        .await
        .expect("调度器未能及时停止");

    let stats = scheduler.stats().get("127.0.0.1").unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.success, 2);
    assert_eq!(
        sink.lines(),
        vec![
            "127.0.0.1 has 100.00% availability",
            "127.0.0.1 has 100.00% availability"
        ]
    );
}
