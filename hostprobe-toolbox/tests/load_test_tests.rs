//! Load generator tests against a local HTTP responder.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hostprobe_toolbox::{
    DispatchMode, LoadGenerator, LoadTestPhase, LoadTestSettings, Target, ToolboxError,
    ToolboxService,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============ Test responder ============

struct Responder {
    port: u16,
    /// Highest number of requests observed in flight at once.
    peak_in_flight: Arc<AtomicUsize>,
}

/// Serve `status` after `delay` on every connection, closing it afterwards.
async fn spawn_responder(status: &'static str, delay: Duration) -> Responder {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak_in_flight = Arc::new(AtomicUsize::new(0));

    let peak = Arc::clone(&peak_in_flight);
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            tokio::spawn(handle(socket, status, delay, in_flight, peak));
        }
    });

    Responder {
        port,
        peak_in_flight,
    }
}

async fn handle(
    mut socket: TcpStream,
    status: &'static str,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(delay).await;
    // Released before the response goes out so the next request cannot overlap
    in_flight.fetch_sub(1, Ordering::SeqCst);

    let response =
        format!("HTTP/1.1 {status}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn local_target(port: u16) -> Target {
    Target::new("127.0.0.1", Some(port))
}

fn assert_counts_add_up(report: &hostprobe_toolbox::LoadTestReport) {
    assert_eq!(
        report.total_requests,
        report.successful_requests + report.failed_requests
    );
}

// ============ Rounds mode ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_nominal() {
    let responder = spawn_responder("200 OK", Duration::from_millis(50)).await;
    let generator = LoadGenerator::new(LoadTestSettings::default()).unwrap();

    let report = generator
        .run(&local_target(responder.port), 5, Duration::from_secs(5))
        .await;

    assert_counts_add_up(&report);
    assert!(report.successful_requests > 0);
    assert_eq!(report.failed_requests, 0);
    assert!(report.errors.is_empty());
    assert!(
        report.min_response_time_ms >= 45.0,
        "min latency {} below responder delay",
        report.min_response_time_ms
    );
    assert!(
        report.max_response_time_ms < 500.0,
        "max latency {} far above responder delay",
        report.max_response_time_ms
    );
    assert!(report.average_response_time_ms >= report.min_response_time_ms);
    assert!(report.average_response_time_ms <= report.max_response_time_ms);
    assert!(report.requests_per_second > 0.0);
    assert_eq!(report.concurrency, 5);
    // Elapsed time covers the drain, so it is at least the nominal duration
    assert!(report.duration_secs >= 5.0);
    assert_eq!(generator.phase(), LoadTestPhase::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_unreachable_target() {
    let port = closed_port().await;
    let generator = LoadGenerator::new(LoadTestSettings::default()).unwrap();

    let report = generator
        .run(&local_target(port), 2, Duration::from_secs(5))
        .await;

    assert_counts_add_up(&report);
    assert!(report.total_requests > 0);
    assert_eq!(report.total_requests, report.failed_requests);
    assert_eq!(report.successful_requests, 0);
    assert!(report.average_response_time_ms.abs() < f64::EPSILON);
    assert!(report.min_response_time_ms.abs() < f64::EPSILON);
    assert!(report.min_response_time_ms.is_finite());
    assert_eq!(report.errors.len() as u64, report.failed_requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_error_status_counts_as_failure() {
    let responder = spawn_responder("503 Service Unavailable", Duration::ZERO).await;
    let generator = LoadGenerator::new(LoadTestSettings::default()).unwrap();

    let report = generator
        .run(&local_target(responder.port), 1, Duration::from_secs(1))
        .await;

    assert_counts_add_up(&report);
    assert_eq!(report.successful_requests, 0);
    assert!(report.failed_requests > 0);
    assert!(report
        .errors
        .iter()
        .all(|e| e == "Request failed with status code 503"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_drains_slow_requests() {
    // Requests outlive the round interval, so rounds overlap and must be drained
    let responder = spawn_responder("200 OK", Duration::from_millis(400)).await;
    let generator = LoadGenerator::new(LoadTestSettings::default()).unwrap();

    let report = generator
        .run(&local_target(responder.port), 3, Duration::from_secs(1))
        .await;

    assert_counts_add_up(&report);
    assert_eq!(report.failed_requests, 0);
    assert!(report.successful_requests >= 3);
    assert!(report.duration_secs >= 1.0);
    assert!(responder.peak_in_flight.load(Ordering::SeqCst) > 3);
}

// ============ Worker pool mode ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_worker_pool_bounds_in_flight() {
    let responder = spawn_responder("200 OK", Duration::from_millis(150)).await;
    let settings = LoadTestSettings {
        dispatch: DispatchMode::WorkerPool,
        ..LoadTestSettings::default()
    };
    let generator = LoadGenerator::new(settings).unwrap();

    let report = generator
        .run(&local_target(responder.port), 3, Duration::from_secs(1))
        .await;

    assert_counts_add_up(&report);
    assert!(report.successful_requests > 0);
    assert_eq!(report.failed_requests, 0);
    assert!(responder.peak_in_flight.load(Ordering::SeqCst) <= 3);
}

// ============ Lifecycle ============

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_cancellation_stops_launches() {
    let responder = spawn_responder("200 OK", Duration::from_millis(20)).await;
    let generator = LoadGenerator::new(LoadTestSettings::default()).unwrap();
    let token = generator.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        token.cancel();
    });

    let started = Instant::now();
    let report = generator
        .run(&local_target(responder.port), 2, Duration::from_secs(60))
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_counts_add_up(&report);
    assert!(report.total_requests > 0);
    assert_eq!(generator.phase(), LoadTestPhase::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_test_phase_transitions() {
    let responder = spawn_responder("200 OK", Duration::ZERO).await;
    let generator = Arc::new(LoadGenerator::new(LoadTestSettings::default()).unwrap());
    let mut phases = generator.subscribe();
    assert_eq!(*phases.borrow(), LoadTestPhase::Idle);

    let runner = Arc::clone(&generator);
    let handle = tokio::spawn(async move {
        runner
            .run(&local_target(responder.port), 1, Duration::from_secs(1))
            .await
    });

    phases.changed().await.unwrap();
    assert_eq!(*phases.borrow_and_update(), LoadTestPhase::Running);

    let report = handle.await.unwrap();
    assert_counts_add_up(&report);
    assert_eq!(*phases.borrow(), LoadTestPhase::Completed);
}

// ============ Façade validation ============

#[tokio::test]
async fn test_load_test_facade_rejects_bad_parameters() {
    for (concurrency, duration) in [(0, 10), (101, 10), (10, 4), (10, 301)] {
        let result = ToolboxService::load_test("example.com", None, concurrency, duration).await;
        assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
    }
}

#[tokio::test]
async fn test_load_test_facade_rejects_bad_host() {
    let result = ToolboxService::load_test("not a host", None, 5, 10).await;
    assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
}
