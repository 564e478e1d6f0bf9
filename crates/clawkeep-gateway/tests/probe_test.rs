use std::fs;
use std::time::{Duration, Instant, SystemTime};

use clawkeep_gateway::{
    ActivityMonitor, ActivitySettings, GatewayStatus, Liveness, ProbeTarget, StatusMonitor, probe,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Pick a port that nothing is listening on.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind to random port");
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn open_port_is_reachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();

    let result = probe("127.0.0.1", port, Duration::from_secs(1)).await;
    assert_eq!(result, Liveness::Reachable);
}

#[tokio::test]
async fn probe_sends_no_data() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut socket, &mut buf)
            .await
            .expect("read");
        buf
    });

    assert_eq!(
        probe("127.0.0.1", port, Duration::from_secs(1)).await,
        Liveness::Reachable
    );
    let received = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("probe should close its connection")
        .expect("server task");
    assert!(received.is_empty());
}

#[tokio::test]
async fn refused_port_is_unreachable_within_timeout() {
    let port = closed_port();
    let timeout = Duration::from_millis(500);

    let start = Instant::now();
    let result = probe("127.0.0.1", port, timeout).await;

    assert_eq!(result, Liveness::Unreachable);
    assert!(start.elapsed() < timeout + Duration::from_secs(1));
}

#[tokio::test]
async fn unroutable_host_never_exceeds_timeout() {
    let timeout = Duration::from_millis(200);

    let start = Instant::now();
    let result = probe("10.255.255.1", 9, timeout).await;

    assert_eq!(result, Liveness::Unreachable);
    assert!(start.elapsed() < timeout + Duration::from_secs(1));
}

#[tokio::test]
async fn unresolvable_host_is_unreachable() {
    let result = probe("no-such-host.invalid", 80, Duration::from_millis(500)).await;
    assert_eq!(result, Liveness::Unreachable);
}

#[tokio::test]
async fn spawned_probes_run_concurrently() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let open = listener.local_addr().unwrap().port();
    let closed = closed_port();

    let a = ProbeTarget::new("127.0.0.1", open).spawn();
    let b = ProbeTarget::new("127.0.0.1", closed).spawn();
    let c = ProbeTarget::new("127.0.0.1", open).spawn();

    assert_eq!(a.await, Liveness::Reachable);
    assert_eq!(b.await, Liveness::Unreachable);
    assert_eq!(c.await, Liveness::Reachable);
}

#[tokio::test]
async fn aborted_probe_resolves_unreachable() {
    let target =
        ProbeTarget::new("10.255.255.1", 9).with_timeout(Duration::from_secs(30));
    let handle = target.spawn();
    handle.abort();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("aborted probe should finish promptly");
    assert_eq!(result, Liveness::Unreachable);
}

#[tokio::test]
async fn status_monitor_reports_stopped_idle_and_active() {
    let logs = TempDir::new().unwrap();
    let settings = ActivitySettings {
        log_dir: logs.path().to_path_buf(),
        ..ActivitySettings::default()
    };

    let mut monitor = StatusMonitor::new(
        ProbeTarget::new("127.0.0.1", closed_port()).with_timeout(Duration::from_millis(300)),
        ActivityMonitor::new(settings),
    );
    let mut rx = monitor.subscribe();
    assert_eq!(monitor.refresh().await, GatewayStatus::Stopped);
    assert!(!rx.has_changed().unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    monitor.set_target(ProbeTarget::new("127.0.0.1", port));

    assert_eq!(monitor.refresh().await, GatewayStatus::Idle);
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), GatewayStatus::Idle);

    let log = logs.path().join("openclaw-2026-10-17.log");
    fs::write(&log, "started\n").unwrap();
    fs::File::options()
        .write(true)
        .open(&log)
        .unwrap()
        .set_modified(SystemTime::now())
        .unwrap();

    assert_eq!(monitor.refresh().await, GatewayStatus::Active);
    assert_eq!(*rx.borrow_and_update(), GatewayStatus::Active);
    assert_eq!(monitor.current(), GatewayStatus::Active);
}

#[tokio::test]
async fn spawned_monitor_publishes_changes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().unwrap().port();
    let logs = TempDir::new().unwrap();

    let monitor = StatusMonitor::new(
        ProbeTarget::new("127.0.0.1", port),
        ActivityMonitor::new(ActivitySettings {
            log_dir: logs.path().to_path_buf(),
            ..ActivitySettings::default()
        }),
    );
    let mut rx = monitor.subscribe();
    let task = monitor.spawn(Duration::from_millis(50));

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("status should change")
        .expect("sender alive");
    assert_eq!(*rx.borrow(), GatewayStatus::Idle);

    task.abort();
}
