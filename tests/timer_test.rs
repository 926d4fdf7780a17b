/*!
 * One-Shot Timer Integration Tests
 */

use crossthread_harness::{OneShotTimer, OwnedThread, TimerError, TimerState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_fires_once_on_target_after_delay() {
    let target = OwnedThread::spawn("timer-target").unwrap();
    let timer = OneShotTimer::new("single", &target);

    let fired_at = Arc::new(Mutex::new(Vec::new()));
    let log = fired_at.clone();
    let target_clone = target.clone();
    timer.set_callback(move || {
        log.lock().push((Instant::now(), target_clone.is_current()));
    });

    let armed = Instant::now();
    timer.start(Duration::from_millis(40)).unwrap();
    thread::sleep(Duration::from_millis(200));

    let fired = fired_at.lock();
    assert_eq!(fired.len(), 1);
    let (when, on_target) = fired[0];
    assert!(when.duration_since(armed) >= Duration::from_millis(40));
    assert!(on_target);
    assert_eq!(timer.state(), TimerState::Fired);
    assert_eq!(timer.fire_count(), 1);
}

#[test]
fn test_stop_before_expiry_prevents_callback() {
    let target = OwnedThread::spawn("timer-stop").unwrap();
    let timer = OneShotTimer::new("stopped", &target);
    let fires = Arc::new(AtomicU64::new(0));

    let counter = fires.clone();
    timer.set_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    timer.start(Duration::from_millis(60)).unwrap();
    assert!(timer.is_armed());
    assert!(timer.remaining().is_some());
    timer.stop();

    thread::sleep(Duration::from_millis(150));
    assert_eq!(fires.load(Ordering::SeqCst), 0);
    assert_eq!(timer.state(), TimerState::Idle);
    assert_eq!(timer.remaining(), None);
}

#[test]
fn test_restart_replaces_deadline() {
    let target = OwnedThread::spawn("timer-restart").unwrap();
    let timer = OneShotTimer::new("restart", &target);
    let fires = Arc::new(AtomicU64::new(0));

    let counter = fires.clone();
    timer.set_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    timer.start(Duration::from_millis(30)).unwrap();
    timer.start(Duration::from_millis(120)).unwrap();

    thread::sleep(Duration::from_millis(70));
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    thread::sleep(Duration::from_millis(150));
    assert_eq!(fires.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cleared_callback_fires_nothing() {
    let target = OwnedThread::spawn("timer-cleared").unwrap();
    let timer = OneShotTimer::new("cleared", &target);
    let fires = Arc::new(AtomicU64::new(0));

    let counter = fires.clone();
    timer.set_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    timer.clear_callback();
    assert!(!timer.has_callback());

    timer.start(Duration::from_millis(10)).unwrap();
    thread::sleep(Duration::from_millis(80));
    assert_eq!(fires.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dropped_timer_never_fires() {
    let target = OwnedThread::spawn("timer-dropped").unwrap();
    let fires = Arc::new(AtomicU64::new(0));

    {
        let timer = OneShotTimer::new("dropped", &target);
        let counter = fires.clone();
        timer.set_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.start(Duration::from_millis(30)).unwrap();
    }

    thread::sleep(Duration::from_millis(100));
    assert_eq!(fires.load(Ordering::SeqCst), 0);
}

#[test]
fn test_start_requires_running_target() {
    let target = OwnedThread::new("timer-cold");
    let timer = OneShotTimer::new("cold", &target);
    assert!(matches!(
        timer.start(Duration::from_millis(10)),
        Err(TimerError::TargetUnavailable(_))
    ));
    assert_eq!(timer.state(), TimerState::Idle);
}

#[test]
fn test_stop_after_expiry_cancels_queued_fire() {
    let target = OwnedThread::spawn("timer-busy").unwrap();
    let timer = OneShotTimer::new("late-stop", &target);
    let fires = Arc::new(AtomicU64::new(0));

    let counter = fires.clone();
    timer.set_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Keep the target busy past the deadline
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    target
        .post(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(2));
        })
        .unwrap();
    started_rx.recv_timeout(Duration::from_secs(1)).unwrap();

    timer.start(Duration::from_millis(10)).unwrap();

    // Expired: the fire job sits in the target's queue
    let deadline = Instant::now() + Duration::from_secs(1);
    while target.pending() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(target.pending(), 1);

    timer.stop();
    release_tx.send(()).unwrap();
    target.shutdown().unwrap();

    assert_eq!(fires.load(Ordering::SeqCst), 0);
    assert_eq!(timer.fire_count(), 0);
    assert_eq!(timer.state(), TimerState::Idle);
}
