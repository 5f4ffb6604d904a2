// tests/lifecycle.rs

use std::error::Error;
use std::thread;
use std::time::Duration;

use hivewatch::{ChangeFilter, KeyMonitor, MonitorError, MonitorState, WatchTarget};

mod common;

type TestResult = Result<(), Box<dyn Error>>;

#[cfg(target_os = "linux")]
fn os_thread_count() -> usize {
    std::fs::read_dir("/proc/self/task")
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[test]
fn start_twice_keeps_a_single_watch_thread() -> TestResult {
    common::init_tracing();
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test\\Path")?;
    hive.create_key(&target)?;

    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Test\\Path")?;
    monitor.start()?;
    thread::sleep(Duration::from_millis(300));
    assert_eq!(monitor.state(), MonitorState::Watching);

    #[cfg(target_os = "linux")]
    let before = os_thread_count();

    // Second start must be a no-op, not a second loop.
    monitor.start()?;
    thread::sleep(Duration::from_millis(300));
    assert_eq!(monitor.state(), MonitorState::Watching);

    #[cfg(target_os = "linux")]
    assert_eq!(os_thread_count(), before);

    monitor.stop()?;
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(!monitor.is_watching());

    Ok(())
}

#[test]
fn dispose_twice_is_a_noop() -> TestResult {
    common::init_tracing();
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test\\Path")?;
    hive.create_key(&target)?;

    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Test\\Path")?;
    monitor.start()?;

    monitor.dispose();
    assert_eq!(monitor.state(), MonitorState::Disposed);

    monitor.dispose();
    assert_eq!(monitor.state(), MonitorState::Disposed);

    assert!(matches!(monitor.start(), Err(MonitorError::AlreadyDisposed)));
    assert!(matches!(monitor.stop(), Err(MonitorError::AlreadyDisposed)));

    Ok(())
}

#[test]
fn dispose_without_start_is_safe() -> TestResult {
    let (_tmp, hive) = common::test_hive();
    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Whatever")?;

    monitor.dispose();
    assert_eq!(monitor.state(), MonitorState::Disposed);

    Ok(())
}

#[test]
fn stop_while_idle_is_a_noop() -> TestResult {
    let (_tmp, hive) = common::test_hive();
    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Whatever")?;

    monitor.stop()?;
    assert_eq!(monitor.state(), MonitorState::Idle);

    Ok(())
}

#[test]
fn filter_mutation_is_rejected_while_watching() -> TestResult {
    common::init_tracing();
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test\\Path")?;
    hive.create_key(&target)?;

    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Test\\Path")?;
    assert_eq!(monitor.filter(), ChangeFilter::all());

    // Idle: allowed.
    monitor.set_filter(ChangeFilter::VALUE)?;
    assert_eq!(monitor.filter(), ChangeFilter::VALUE);

    monitor.start()?;
    match monitor.set_filter(ChangeFilter::KEY) {
        Err(MonitorError::InvalidOperation(_)) => {}
        other => panic!("expected InvalidOperation, got {other:?}"),
    }
    // Rejected mutation must not have taken effect.
    assert_eq!(monitor.filter(), ChangeFilter::VALUE);

    monitor.stop()?;
    monitor.set_filter(ChangeFilter::KEY | ChangeFilter::SECURITY)?;
    assert_eq!(monitor.filter(), ChangeFilter::KEY | ChangeFilter::SECURITY);

    Ok(())
}

#[test]
fn bogus_alias_fails_before_any_thread_is_spawned() {
    let (_tmp, hive) = common::test_hive();

    #[cfg(target_os = "linux")]
    let before = os_thread_count();

    match KeyMonitor::from_path(hive, "BOGUS\\Foo") {
        Err(MonitorError::InvalidAddress { token }) => assert_eq!(token, "BOGUS"),
        other => panic!("expected InvalidAddress, got {other:?}"),
    }

    #[cfg(target_os = "linux")]
    assert_eq!(os_thread_count(), before);
}

#[test]
fn start_stop_cycles_can_repeat() -> TestResult {
    common::init_tracing();
    let (_tmp, hive) = common::test_hive();
    let target = WatchTarget::parse("HKCU\\SOFTWARE\\Test\\Path")?;
    hive.create_key(&target)?;

    let monitor = KeyMonitor::from_path(hive, "HKCU\\SOFTWARE\\Test\\Path")?;
    for _ in 0..3 {
        monitor.start()?;
        assert_eq!(monitor.state(), MonitorState::Watching);
        monitor.stop()?;
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    Ok(())
}
