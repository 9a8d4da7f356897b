//! Logging configuration shared by the emulator crates.
//!
//! Unlike a process-wide logger, a [`LogConfig`] is an ordinary value: the
//! embedder builds one, tunes its levels, and hands it (usually behind an
//! `Arc`) to whatever needs to emit diagnostics. Two configs never interfere
//! with each other, which keeps tests and multi-instance embeddings isolated.
//!
//! # Architecture
//!
//! - **LogConfig**: per-instance configuration using atomic operations
//! - **LogLevel**: Hierarchical log levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: Logging categories (SerialInterface, Input, Actuator, Stubs)
//! - **LogConfig::log()**: Common logging entry point with async file I/O
//!
//! # Performance
//!
//! Logging is designed to be non-blocking:
//! - Messages are sent to a background thread via a channel when a log file is set
//! - Console output goes straight to stderr
//! - Zero overhead when logging is disabled (the message closure never runs)
//!
//! # Usage
//!
//! ```rust
//! use emu_core::logging::{LogCategory, LogConfig, LogLevel};
//!
//! let config = LogConfig::new();
//! config.set_level(LogCategory::SerialInterface, LogLevel::Debug);
//! config.log(LogCategory::SerialInterface, LogLevel::Debug, || {
//!     format!("SI: command 0x{:02x} on port {}", 0x41, 0)
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const CATEGORY_COUNT: usize = 4;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for different emulator components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Serial interface traffic (command buffers, device responses)
    SerialInterface,
    /// Pad input sampling
    Input,
    /// Rumble motors and other actuators
    Actuator,
    /// Unimplemented or unrecognized commands
    Stubs,
}

impl LogCategory {
    /// All categories, in index order
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::SerialInterface,
        LogCategory::Input,
        LogCategory::Actuator,
        LogCategory::Stubs,
    ];

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "si" | "serial" | "serialinterface" | "serial_interface" => {
                Some(LogCategory::SerialInterface)
            }
            "input" | "pad" => Some(LogCategory::Input),
            "actuator" | "rumble" => Some(LogCategory::Actuator),
            "stubs" | "stub" => Some(LogCategory::Stubs),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            LogCategory::SerialInterface => 0,
            LogCategory::Input => 1,
            LogCategory::Actuator => 2,
            LogCategory::Stubs => 3,
        }
    }
}

/// Rate limiter for controlling log output frequency per category
///
/// Uses a sliding window algorithm to track log timestamps and enforce
/// a maximum rate of logs per second.
struct RateLimiter {
    /// Maximum logs allowed per second (atomic for dynamic updates)
    max_logs_per_second: AtomicUsize,
    /// Sliding window duration (1 second)
    window_duration: Duration,
    /// Timestamps of recent logs (one queue per category)
    timestamps: Mutex<[VecDeque<Instant>; CATEGORY_COUNT]>,
    /// Counter for dropped messages per category
    dropped_counts: Mutex<[usize; CATEGORY_COUNT]>,
    /// Last time we reported dropped messages per category
    last_drop_report: Mutex<[Option<Instant>; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            timestamps: Mutex::new(Default::default()),
            dropped_counts: Mutex::new([0; CATEGORY_COUNT]),
            last_drop_report: Mutex::new([None; CATEGORY_COUNT]),
        }
    }

    fn set_max_logs_per_second(&self, max: usize) {
        self.max_logs_per_second.store(max, Ordering::Relaxed);
    }

    fn get_max_logs_per_second(&self) -> usize {
        self.max_logs_per_second.load(Ordering::Relaxed)
    }

    /// Check if a log should be allowed based on rate limits
    /// Returns (allowed, dropped_count) where dropped_count is Some(n) if we should report drops
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let idx = category.index();

        let mut timestamps = lock(&self.timestamps);
        let mut dropped_counts = lock(&self.dropped_counts);
        let mut last_drop_report = lock(&self.last_drop_report);

        // Remove timestamps outside the sliding window
        let window = &mut timestamps[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        let max_logs = self.max_logs_per_second.load(Ordering::Relaxed);
        if window.len() < max_logs {
            window.push_back(now);

            let dropped = dropped_counts[idx];
            if dropped > 0 {
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                return (true, Some(dropped));
            }

            (true, None)
        } else {
            dropped_counts[idx] += 1;

            // Report dropped messages once per second
            let should_report = match last_drop_report[idx] {
                None => true,
                Some(last) => now.duration_since(last) >= Duration::from_secs(1),
            };

            if should_report {
                let dropped = dropped_counts[idx];
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                (false, Some(dropped))
            } else {
                (false, None)
            }
        }
    }
}

/// Lock a mutex, recovering the data if a writer panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Logging configuration for one emulator instance
pub struct LogConfig {
    /// Global log level (applies to all categories unless overridden)
    global_level: AtomicU8,
    /// Per-category levels, indexed by `LogCategory::index`
    category_levels: [AtomicU8; CATEGORY_COUNT],
    /// Channel for sending log messages to background thread
    log_sender: Mutex<Option<Sender<String>>>,
    /// Background writer, joined when the file is closed
    log_writer: Mutex<Option<JoinHandle<()>>>,
    /// Flag indicating if logging to file is enabled
    file_logging_enabled: AtomicBool,
    /// Rate limiter for controlling log output frequency
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// Create a new LogConfig with all logging disabled and default rate limit (60 logs/second)
    pub fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: Default::default(),
            log_sender: Mutex::new(None),
            log_writer: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Set the global log level (applies to all categories unless overridden)
    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level.to_u8(), Ordering::Relaxed);
    }

    /// Get the global log level
    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    /// Set log level for a specific category
    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level.to_u8(), Ordering::Relaxed);
    }

    /// Get log level for a specific category
    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// Check if a message should be logged for the given category and level
    ///
    /// Returns true if:
    /// 1. The category-specific level is set and >= the message level, OR
    /// 2. The category-specific level is Off AND the global level >= the message level
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Set the maximum logs per second per category (rate limit)
    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .set_max_logs_per_second(max_logs_per_second);
    }

    /// Get the current rate limit (maximum logs per second per category)
    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.get_max_logs_per_second()
    }

    /// Set the log file path
    ///
    /// Starts a background thread for async file I/O so device code never
    /// waits on the disk. Replaces any previously configured file.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        self.clear_log_file();
        let (sender, receiver) = channel::<String>();

        let writer = thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    // Logging must never take the emulator down with it
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
                let _ = file.flush();
            })?;

        *lock(&self.log_sender) = Some(sender);
        *lock(&self.log_writer) = Some(writer);
        self.file_logging_enabled.store(true, Ordering::Relaxed);

        Ok(())
    }

    /// Close the log file and go back to stderr.
    ///
    /// Blocks until every message logged so far has been written.
    pub fn clear_log_file(&self) {
        self.file_logging_enabled.store(false, Ordering::Relaxed);
        // Dropping the sender ends the writer loop once the queue is drained
        let sender = lock(&self.log_sender).take();
        drop(sender);
        let writer = lock(&self.log_writer).take();
        if let Some(writer) = writer {
            let _ = writer.join();
        }
    }

    fn write_message(&self, message: &str) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            let log_sender = lock(&self.log_sender);
            match log_sender.as_ref() {
                Some(sender) => {
                    if sender.send(message.to_string()).is_err() {
                        eprintln!("{}", message);
                    }
                }
                None => eprintln!("{}", message),
            }
        } else {
            eprintln!("{}", message);
        }
    }

    /// Log a message with the specified category and level
    ///
    /// The message is lazily evaluated via a closure, so formatting only
    /// happens when logging is enabled for the category and level.
    ///
    /// # Rate Limiting
    ///
    /// At most [`get_rate_limit`](Self::get_rate_limit) messages per second
    /// are written per category. Excess messages are dropped and a summary
    /// line is emitted once the category is allowed to log again.
    pub fn log<F>(&self, category: LogCategory, level: LogLevel, message_fn: F)
    where
        F: FnOnce() -> String,
    {
        if !self.should_log(category, level) {
            return;
        }

        let (allowed, dropped_count) = self.rate_limiter.should_allow(category);

        if let Some(count) = dropped_count {
            if count > 0 {
                let warning = format!(
                    "[{:?}] WARNING: Rate limit exceeded, {} log message(s) dropped in the last second",
                    category, count
                );
                self.write_message(&warning);
            }
        }

        if allowed {
            let message = message_fn();
            self.write_message(&message);
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogConfig {
    fn drop(&mut self) {
        self.clear_log_file();
    }
}
