//! The capability set shared by every serial interface device.

use crate::buffer;
use crate::controller::StandardController;
use crate::diagnostics::{DiagnosticsSink, NullSink, TraceSource};
use crate::dummy::DummyDevice;
use crate::pad::{IdlePadInput, MicrophoneLink, NoMicrophone, PadInput, Port, RumbleActuator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// GameCube device family
pub const SI_TYPE_GC: u32 = 0x0800_0000;
/// Standard controller
pub const SI_GC_STANDARD: u32 = 0x0100_0000;
/// Controller without rumble motor
pub const SI_GC_NOMOTOR: u32 = 0x2000_0000;
pub const SI_GC_KEYBOARD: u32 = SI_TYPE_GC | 0x0020_0000;
/// Identifier a standard controller with motor answers a reset with
pub const SI_GC_CONTROLLER: u32 = SI_TYPE_GC | SI_GC_STANDARD;
/// Identifier of an empty port
pub const SI_NO_DEVICE: u32 = 0x0000_0000;

/// The two polling registers produced by [`SiDevice::get_data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PollWords {
    pub hi: u32,
    pub low: u32,
}

impl fmt::Display for PollWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hi={:08x} low={:08x}", self.hi, self.low)
    }
}

/// Device variants that can be plugged into a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    StandardController,
    /// Nothing plugged in
    #[default]
    Dummy,
}

/// A peripheral attached to one SI port.
///
/// The bus controller owns one `Box<dyn SiDevice>` per port and talks to it
/// only through this trait.
pub trait SiDevice: Send {
    /// Port this device was created for
    fn port(&self) -> Port;

    fn kind(&self) -> DeviceKind;

    /// Run the command in `buffer`, overwriting it with the response.
    /// Returns the number of bytes consumed.
    fn run_buffer(&mut self, buffer: &mut [u8]) -> usize;

    /// Sample the device into the polling registers.
    /// `None` means there is no new data.
    fn get_data(&mut self) -> Option<PollWords>;

    /// Handle a command sent outside the buffer protocol.
    fn send_command(&mut self, command: u32);

    /// Device state for debugging and save states
    fn save_state(&self) -> serde_json::Value {
        serde_json::json!({
            "version": SAVE_STATE_VERSION,
            "kind": self.kind(),
            "port": self.port(),
        })
    }

    /// Restore state produced by [`save_state`](Self::save_state)
    fn load_state(&mut self, v: &serde_json::Value) -> Result<(), serde_json::Error> {
        check_state_header(v, self.kind())
    }
}

/// Save state format written by [`SiDevice::save_state`]
pub const SAVE_STATE_VERSION: u64 = 1;

/// Reject a save state with another format version or taken from another
/// kind of device.
pub fn check_state_header(
    v: &serde_json::Value,
    kind: DeviceKind,
) -> Result<(), serde_json::Error> {
    use serde::de::Error;

    let version = v
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| Error::missing_field("version"))?;
    if version != SAVE_STATE_VERSION {
        let message = format!("unsupported save state version {}", version);
        return Err(Error::custom(message));
    }

    let saved: DeviceKind = match v.get("kind") {
        Some(value) => serde_json::from_value(value.clone())?,
        None => return Err(Error::missing_field("kind")),
    };
    if saved != kind {
        let message = format!("save state is for {:?}, device is {:?}", saved, kind);
        return Err(Error::custom(message));
    }
    Ok(())
}

/// Emit the debug trace of an incoming buffer: a header line and the
/// bytes in device order, eight per line. Does nothing unless the sink
/// wants buffer traces.
pub fn trace_buffer(sink: &dyn DiagnosticsSink, port: Port, buffer: &[u8]) {
    if !sink.trace_enabled(TraceSource::Buffer) {
        return;
    }
    sink.trace(
        port,
        TraceSource::Buffer,
        &format!("Send Data Device({}) - Length({})", port, buffer.len()),
    );
    for line in buffer::trace_lines(buffer) {
        sink.trace(port, TraceSource::Buffer, &line);
    }
}

/// External services shared by the devices of all ports
#[derive(Clone)]
pub struct Collaborators {
    pub input: Arc<dyn PadInput>,
    /// `None` when the host has no rumble support
    pub rumble: Option<Arc<dyn RumbleActuator>>,
    pub microphone: Arc<dyn MicrophoneLink>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Collaborators {
    pub fn new(input: Arc<dyn PadInput>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            input,
            rumble: None,
            microphone: Arc::new(NoMicrophone),
            diagnostics,
        }
    }

    pub fn with_rumble(mut self, rumble: Arc<dyn RumbleActuator>) -> Self {
        self.rumble = Some(rumble);
        self
    }

    pub fn with_microphone(mut self, microphone: Arc<dyn MicrophoneLink>) -> Self {
        self.microphone = microphone;
        self
    }
}

impl Default for Collaborators {
    /// Idle pads, no rumble, no microphone, diagnostics discarded
    fn default() -> Self {
        Self::new(Arc::new(IdlePadInput), Arc::new(NullSink))
    }
}

/// Build the device for `kind` on `port`.
pub fn create_device(
    kind: DeviceKind,
    port: Port,
    collaborators: &Collaborators,
) -> Box<dyn SiDevice> {
    match kind {
        DeviceKind::StandardController => {
            Box::new(StandardController::new(port, collaborators.clone()))
        }
        DeviceKind::Dummy => Box::new(DummyDevice::new(port)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    #[test]
    fn test_controller_identifier() {
        assert_eq!(SI_GC_CONTROLLER, 0x0900_0000);
        assert_eq!(SI_GC_CONTROLLER & SI_GC_NOMOTOR, 0);
        assert_eq!(SI_GC_KEYBOARD, 0x0820_0000);
    }

    #[test]
    fn test_create_device_kinds() {
        let collaborators = Collaborators::default();
        for port in 0..4 {
            let pad = create_device(DeviceKind::StandardController, port, &collaborators);
            assert_eq!(pad.kind(), DeviceKind::StandardController);
            assert_eq!(pad.port(), port);

            let empty = create_device(DeviceKind::Dummy, port, &collaborators);
            assert_eq!(empty.kind(), DeviceKind::Dummy);
            assert_eq!(empty.port(), port);
        }
    }

    #[test]
    fn test_device_kind_serde_names() {
        let kind: DeviceKind = serde_json::from_str("\"standard_controller\"").unwrap();
        assert_eq!(kind, DeviceKind::StandardController);
        assert_eq!(serde_json::to_string(&DeviceKind::Dummy).unwrap(), "\"dummy\"");
        assert_eq!(DeviceKind::default(), DeviceKind::Dummy);
    }

    #[test]
    fn test_trace_buffer_format() {
        let sink = CollectingSink::new().with_traces();
        let buf: Vec<u8> = vec![0x00, 0x00, 0x00, 0x41, 0, 0, 0, 0, 0, 0, 0, 0];
        trace_buffer(&sink, 1, &buf);

        let lines = sink.trace_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Send Data Device(1) - Length(12)");
        assert_eq!(lines[1], "0x41 0x00 0x00 0x00 0x00 0x00 0x00 0x00");
        assert_eq!(lines[2], "0x00 0x00 0x00 0x00");
    }

    #[test]
    fn test_state_header_checked() {
        let state = serde_json::json!({ "version": 1, "kind": "dummy", "port": 0 });
        assert!(check_state_header(&state, DeviceKind::Dummy).is_ok());
        assert!(check_state_header(&state, DeviceKind::StandardController).is_err());

        let newer = serde_json::json!({ "version": 2, "kind": "dummy" });
        assert!(check_state_header(&newer, DeviceKind::Dummy).is_err());

        let unversioned = serde_json::json!({ "kind": "dummy" });
        assert!(check_state_header(&unversioned, DeviceKind::Dummy).is_err());
        let untyped = serde_json::json!({ "version": 1 });
        assert!(check_state_header(&untyped, DeviceKind::Dummy).is_err());
    }

    #[test]
    fn test_trace_buffer_disabled_is_silent() {
        let sink = CollectingSink::new();
        trace_buffer(&sink, 0, &[0u8; 8]);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_poll_words_display() {
        let words = PollWords {
            hi: 0x0080_8080,
            low: 0x8080_0000,
        };
        assert_eq!(words.to_string(), "hi=00808080 low=80800000");
    }
}
