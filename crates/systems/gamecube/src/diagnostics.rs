//! Where devices send trace output and non-fatal errors.
//!
//! Each device receives a sink at construction. Nothing here is global:
//! two devices with different sinks never see each other's output.

use crate::error::SiError;
use crate::pad::Port;
use emu_core::logging::{LogCategory, LogConfig, LogLevel};
use std::sync::{Arc, Mutex, MutexGuard};

/// Part of the device a trace line comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSource {
    /// Command buffers and their responses
    Buffer,
    /// Polling data sampled from the pad
    Input,
    /// Rumble and other direct commands
    Actuator,
}

/// Receiver for device diagnostics.
///
/// Implementations must not block: devices call into the sink from the
/// middle of a bus transfer.
pub trait DiagnosticsSink: Send + Sync {
    /// Whether trace lines for `source` are wanted. Devices skip all trace
    /// formatting when this returns false.
    fn trace_enabled(&self, _source: TraceSource) -> bool {
        false
    }

    fn trace(&self, _port: Port, _source: TraceSource, _line: &str) {}

    /// Called exactly once for every error condition a device hits.
    fn report(&self, port: Port, error: &SiError);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn report(&self, _port: Port, _error: &SiError) {}
}

/// Routes diagnostics into an [`emu_core`] logging configuration.
///
/// Buffer traces go to [`LogCategory::SerialInterface`] at `Debug`, input
/// samples to [`LogCategory::Input`] at `Trace`, actuator traces to
/// [`LogCategory::Actuator`] at `Debug`. Reports go to
/// [`LogCategory::Stubs`] at `Warn`.
pub struct LogSink {
    config: Arc<LogConfig>,
}

impl LogSink {
    pub fn new(config: Arc<LogConfig>) -> Self {
        Self { config }
    }

    fn target(source: TraceSource) -> (LogCategory, LogLevel) {
        match source {
            TraceSource::Buffer => (LogCategory::SerialInterface, LogLevel::Debug),
            TraceSource::Input => (LogCategory::Input, LogLevel::Trace),
            TraceSource::Actuator => (LogCategory::Actuator, LogLevel::Debug),
        }
    }
}

impl DiagnosticsSink for LogSink {
    fn trace_enabled(&self, source: TraceSource) -> bool {
        let (category, level) = Self::target(source);
        self.config.should_log(category, level)
    }

    fn trace(&self, port: Port, source: TraceSource, line: &str) {
        let (category, level) = Self::target(source);
        self.config
            .log(category, level, || format!("SI{}: {}", port, line));
    }

    fn report(&self, port: Port, error: &SiError) {
        self.config.log(LogCategory::Stubs, LogLevel::Warn, || {
            format!("SI{}: {}", port, error)
        });
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Trace {
        port: Port,
        source: TraceSource,
        line: String,
    },
    Report {
        port: Port,
        error: SiError,
    },
}

/// Records diagnostics in memory, optionally passing them on to another sink.
///
/// Embedders use it to inspect what a device reported during a call;
/// tracing is only recorded when `capture_traces` is set.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
    capture_traces: bool,
    forward: Option<Arc<dyn DiagnosticsSink>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record trace lines
    pub fn with_traces(mut self) -> Self {
        self.capture_traces = true;
        self
    }

    /// Pass every diagnostic on to `sink` after recording it
    pub fn forwarding_to(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.forward = Some(sink);
        self
    }

    fn events(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events())
    }

    /// Errors recorded so far, in order
    pub fn reports(&self) -> Vec<(Port, SiError)> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                Diagnostic::Report { port, error } => Some((*port, error.clone())),
                Diagnostic::Trace { .. } => None,
            })
            .collect()
    }

    /// Trace lines recorded so far, in order
    pub fn trace_lines(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                Diagnostic::Trace { line, .. } => Some(line.clone()),
                Diagnostic::Report { .. } => None,
            })
            .collect()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn trace_enabled(&self, source: TraceSource) -> bool {
        self.capture_traces
            || self
                .forward
                .as_ref()
                .is_some_and(|sink| sink.trace_enabled(source))
    }

    fn trace(&self, port: Port, source: TraceSource, line: &str) {
        if self.capture_traces {
            self.events().push(Diagnostic::Trace {
                port,
                source,
                line: line.to_string(),
            });
        }
        if let Some(sink) = &self.forward {
            if sink.trace_enabled(source) {
                sink.trace(port, source, line);
            }
        }
    }

    fn report(&self, port: Port, error: &SiError) {
        self.events().push(Diagnostic::Report {
            port,
            error: error.clone(),
        });
        if let Some(sink) = &self.forward {
            sink.report(port, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_never_traces() {
        let sink = NullSink;
        assert!(!sink.trace_enabled(TraceSource::Buffer));
        assert!(!sink.trace_enabled(TraceSource::Input));
    }

    #[test]
    fn test_log_sink_follows_config_levels() {
        let config = Arc::new(LogConfig::new());
        let sink = LogSink::new(config.clone());
        assert!(!sink.trace_enabled(TraceSource::Buffer));

        config.set_level(LogCategory::SerialInterface, LogLevel::Debug);
        assert!(sink.trace_enabled(TraceSource::Buffer));
        assert!(!sink.trace_enabled(TraceSource::Input));

        config.set_level(LogCategory::Input, LogLevel::Trace);
        assert!(sink.trace_enabled(TraceSource::Input));
    }

    #[test]
    fn test_collecting_sink_records_reports() {
        let sink = CollectingSink::new();
        sink.report(2, &SiError::UnrecognizedBufferCommand(0x77));
        sink.trace(2, TraceSource::Buffer, "ignored");

        assert_eq!(
            sink.reports(),
            vec![(2, SiError::UnrecognizedBufferCommand(0x77))]
        );
        assert!(sink.trace_lines().is_empty());
        assert_eq!(sink.take().len(), 1);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_collecting_sink_forwards() {
        let inner = Arc::new(CollectingSink::new().with_traces());
        let outer = CollectingSink::new().forwarding_to(inner.clone());

        assert!(outer.trace_enabled(TraceSource::Actuator));
        outer.trace(0, TraceSource::Actuator, "rumble");
        outer.report(0, &SiError::UnrecognizedDirectCommand(0x0012_0000));

        assert!(outer.trace_lines().is_empty());
        assert_eq!(inner.trace_lines(), vec!["rumble".to_string()]);
        assert_eq!(inner.reports().len(), 1);
    }
}
