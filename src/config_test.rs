use std::sync::{Mutex, MutexGuard};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that touch the process environment.
fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// # Safety
/// Caller must hold [`env_lock`].
unsafe fn clear_env() {
    unsafe {
        std::env::remove_var("ATTACKFLOW_API_BASE_URL");
        std::env::remove_var("ATTACKFLOW_STREAM_PATH");
        std::env::remove_var("ATTACKFLOW_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("ATTACKFLOW_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("ATTACKFLOW_LAYOUT_DIRECTION");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = env_lock();
    unsafe { clear_env() };

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.stream_path, DEFAULT_STREAM_PATH);
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.layout, LayoutConfig::default());
    assert_eq!(cfg.stream_url(), "http://127.0.0.1:3001/api/ai/stream");
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_lock();
    unsafe {
        clear_env();
        std::env::set_var("ATTACKFLOW_API_BASE_URL", "https://flows.example.test/");
        std::env::set_var("ATTACKFLOW_STREAM_PATH", "v2/stream");
        std::env::set_var("ATTACKFLOW_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("ATTACKFLOW_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("ATTACKFLOW_LAYOUT_DIRECTION", "lr");
    }

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.api_base_url, "https://flows.example.test");
    assert_eq!(cfg.stream_url(), "https://flows.example.test/v2/stream");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.layout.direction, Direction::LeftRight);

    unsafe { clear_env() };
}

#[test]
fn invalid_timeout_falls_back_to_default() {
    let _guard = env_lock();
    unsafe {
        clear_env();
        std::env::set_var("ATTACKFLOW_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_env() };
}

#[test]
fn unknown_direction_errors() {
    let _guard = env_lock();
    unsafe {
        clear_env();
        std::env::set_var("ATTACKFLOW_LAYOUT_DIRECTION", "diagonal");
    }

    let err = AppConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::UnknownDirection("diagonal".into()));

    unsafe { clear_env() };
}
