/*!
 * Logger Integration Tests
 *
 * Drives the logger subsystem from a foreign thread through bounded
 * invocations, the way the check batch does.
 */

use crossthread_harness::logger::{MemorySink, FLUSH_SUCCESS, WRITE_SUCCESS};
use crossthread_harness::{invoke, logger_checks, CheckSuite, Logger, LoggerConfig, Signal};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn memory_logger(name: &str) -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let config = LoggerConfig::new()
        .with_thread_name(name)
        .with_flush_delay(Duration::from_millis(20));
    let logger = Logger::start(config, sink.clone()).unwrap();
    (logger, sink)
}

#[test]
fn test_flush_time_notifies_subscriber_until_unsubscribed() {
    let (logger, _sink) = memory_logger("logger-subscribe");
    let notifications = Arc::new(AtomicU64::new(0));
    let signal = Arc::new(Signal::new());

    let registry = logger.flush_time().clone();
    let (count, raised) = (notifications.clone(), signal.clone());
    let id = invoke(logger.thread(), Duration::from_millis(100), move || {
        registry.subscribe(move |_duration: &Duration| {
            count.fetch_add(1, Ordering::SeqCst);
            raised.raise();
        })
    })
    .unwrap();

    let data = logger.data();
    let flushed = invoke(logger.thread(), Duration::from_millis(100), move || {
        let mut data = data.lock();
        data.write("subscribed line");
        data.flush()
    });
    assert_eq!(flushed, Some(true));
    assert!(signal.wait_for(Duration::from_millis(500)));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    let registry = logger.flush_time().clone();
    let removed = invoke(logger.thread(), Duration::from_millis(100), move || {
        registry.unsubscribe(id)
    });
    assert_eq!(removed, Some(true));

    let data = logger.data();
    invoke(logger.thread(), Duration::from_millis(100), move || {
        let mut data = data.lock();
        data.write("unobserved line");
        data.flush()
    })
    .unwrap();
    assert!(!signal.wait_for(Duration::from_millis(50)));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);

    logger.shutdown().unwrap();
}

#[test]
fn test_bounded_flush_reports_duration() {
    let (logger, sink) = memory_logger("logger-flush");
    let duration = Arc::new(Mutex::new(None));

    let registry = logger.flush_time().clone();
    let slot = duration.clone();
    invoke(logger.thread(), Duration::from_millis(100), move || {
        registry.subscribe(move |d: &Duration| *slot.lock() = Some(*d))
    })
    .unwrap();

    let data = logger.data();
    let flushed = invoke(logger.thread(), Duration::from_millis(100), move || {
        let mut data = data.lock();
        for i in 0..100 {
            data.write(format!("line {i}"));
        }
        data.flush()
    });

    assert_eq!(flushed, Some(true));
    let measured = duration.lock().unwrap();
    assert!(measured <= Duration::from_millis(10));
    assert_eq!(sink.lines().len(), 100);
    logger.shutdown().unwrap();
}

#[test]
fn test_write_status_then_deferred_flush() {
    let (logger, sink) = memory_logger("logger-status");
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let flushed = Arc::new(Signal::new());

    let (log, raised) = (statuses.clone(), flushed.clone());
    logger.set_status_callback(move |status| {
        log.lock().push(status.to_string());
        if status == FLUSH_SUCCESS {
            raised.raise();
        }
    });

    logger.write("deferred").unwrap();
    assert!(flushed.wait_for(Duration::from_millis(500)));
    assert_eq!(*statuses.lock(), vec![WRITE_SUCCESS.to_string(), FLUSH_SUCCESS.to_string()]);
    assert_eq!(sink.lines(), vec!["deferred".to_string()]);

    logger.clear_status_callback();
    logger.shutdown().unwrap();
}

#[test]
fn test_file_sink_receives_lines_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harness.log");
    let config = LoggerConfig::new()
        .with_thread_name("logger-file")
        .with_flush_delay(Duration::from_secs(10))
        .with_path(&path);

    let logger = Logger::open(config).unwrap();
    logger.write("first").unwrap();
    logger.write("second").unwrap();
    // The deferred flush is far away; shutdown flushes what is buffered
    logger.shutdown().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().collect::<Vec<_>>(), vec!["first", "second"]);
}

#[test]
fn test_logger_checks_pass_against_live_logger() {
    let (logger, _sink) = memory_logger("logger-checks");
    let mut batch = logger_checks(&logger);

    let status = thread::spawn(move || batch.run_all()).join().unwrap();
    assert_eq!(status, 0);
    logger.shutdown().unwrap();
}
