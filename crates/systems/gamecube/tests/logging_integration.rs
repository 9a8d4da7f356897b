//! Integration test for SI diagnostics routed through `emu_core` logging
//!
//! Verifies that device traces and reports reach a log file configured on
//! a `LogConfig`, and that a config with logging off produces nothing.

use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use emu_gamecube::buffer::swizzle;
use emu_gamecube::pad::IdlePadInput;
use emu_gamecube::{create_device, Collaborators, DeviceKind, LogSink, CMD_ORIGIN};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn temp_log(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "emu_gamecube_{}_{}.log",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

/// Wait for the background writer to flush `needle` into `path`
fn read_until(path: &PathBuf, needle: &str) -> String {
    let mut contents = String::new();
    for _ in 0..50 {
        contents = std::fs::read_to_string(path).unwrap_or_default();
        if contents.contains(needle) {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    contents
}

#[test]
fn test_logging_si_buffer_trace_and_reports() {
    let path = temp_log("trace");
    let config = Arc::new(LogConfig::new());
    config.set_level(LogCategory::SerialInterface, LogLevel::Debug);
    config.set_level(LogCategory::Stubs, LogLevel::Warn);
    config.set_log_file(path.clone()).expect("open log file");

    let collaborators = Collaborators::new(
        Arc::new(IdlePadInput),
        Arc::new(LogSink::new(config.clone())),
    );
    let mut pad = create_device(DeviceKind::StandardController, 1, &collaborators);

    let mut buf = [0u8; 12];
    buf[swizzle(0)] = CMD_ORIGIN;
    pad.run_buffer(&mut buf);

    let mut unknown = [0u8; 4];
    unknown[swizzle(0)] = 0x77;
    pad.run_buffer(&mut unknown);

    config.clear_log_file();
    let contents = read_until(&path, "unknown command");

    assert!(contents.contains("SI1: Send Data Device(1) - Length(12)"));
    assert!(contents.contains("SI1: 0x41 0x00 0x00 0x00 0x00 0x00 0x00 0x00"));
    assert!(contents.contains("SI1: Get Origin"));
    assert!(contents.contains("SI1: SI: unknown command (0x77)"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_logging_off_writes_nothing() {
    let path = temp_log("off");
    let config = Arc::new(LogConfig::new());
    config.set_log_file(path.clone()).expect("open log file");

    let collaborators = Collaborators::new(
        Arc::new(IdlePadInput),
        Arc::new(LogSink::new(config.clone())),
    );
    let mut pad = create_device(DeviceKind::StandardController, 0, &collaborators);

    let mut unknown = [0u8; 4];
    unknown[swizzle(0)] = 0x77;
    pad.run_buffer(&mut unknown);
    pad.get_data();
    pad.send_command(0x0040_0001);

    config.clear_log_file();
    std::thread::sleep(Duration::from_millis(100));
    let contents = std::fs::read_to_string(&path).unwrap_or_default();
    assert!(contents.is_empty());
    let _ = std::fs::remove_file(&path);
}
