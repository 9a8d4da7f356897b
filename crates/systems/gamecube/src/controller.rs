//! Standard GameCube controller
//!
//! # Buffer commands
//!
//! The first byte of the buffer selects the command:
//! - **0x00 Reset**: answer with the device identifier word
//! - **0x41 Origin**: answer with the 12-byte origin (calibration) record
//! - **0x42 Recalibrate**: same answer as Origin, the record is not resampled
//! - **0xCE**: sent by Wii software, not answered
//!
//! A single call handles exactly one command; the rest of the buffer is the
//! response area and counts as consumed.
//!
//! # Polling data
//!
//! ```text
//! hi:  [31..16] buttons  [15..8] stick X   [7..0] stick Y      (bit 23 forced)
//! low: [31..24] C-stick X [23..16] C-stick Y [15..8] L analog [7..0] R analog
//! ```
//!
//! # Direct commands
//!
//! `[23..16]` command, `[15..8]` parameter 2, `[7..0]` parameter 1.
//! Command 0x40 drives the rumble motor: parameter 1 is the mode,
//! parameter 2 the strength.

use crate::buffer::{self, MAX_TRANSFER_LENGTH};
use crate::device::{
    self, Collaborators, DeviceKind, PollWords, SiDevice, SAVE_STATE_VERSION, SI_GC_CONTROLLER,
};
use crate::diagnostics::TraceSource;
use crate::error::SiError;
use crate::pad::{PadStatus, Port, RumbleMode, PAD_USE_ORIGIN};
use serde::{Deserialize, Serialize};

pub const CMD_RESET: u8 = 0x00;
pub const CMD_ORIGIN: u8 = 0x41;
pub const CMD_RECALIBRATE: u8 = 0x42;
/// Wii-only command with no GameCube counterpart
pub const CMD_WII_UNKNOWN: u8 = 0xCE;

/// Direct command some homebrew sends as a keep-alive
pub const CMD_DIRECT_NOP: u8 = 0x00;
pub const CMD_RUMBLE: u8 = 0x40;

/// Size of the origin record on the wire
pub const ORIGIN_RECORD_LEN: usize = 12;

/// Polling flag telling the console to combine the sample with the origin
const POLL_USE_ORIGIN: u32 = (PAD_USE_ORIGIN as u32) << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferCommand {
    Reset,
    Origin,
    Recalibrate,
    WiiUnknown,
    Unknown(u8),
}

impl From<u8> for BufferCommand {
    fn from(value: u8) -> Self {
        match value {
            CMD_RESET => BufferCommand::Reset,
            CMD_ORIGIN => BufferCommand::Origin,
            CMD_RECALIBRATE => BufferCommand::Recalibrate,
            CMD_WII_UNKNOWN => BufferCommand::WiiUnknown,
            other => BufferCommand::Unknown(other),
        }
    }
}

/// Direct command word split into its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectCommand {
    pub command: u8,
    pub parameter1: u8,
    pub parameter2: u8,
}

impl From<u32> for DirectCommand {
    fn from(value: u32) -> Self {
        Self {
            command: (value >> 16) as u8,
            parameter1: value as u8,
            parameter2: (value >> 8) as u8,
        }
    }
}

/// Neutral stick and trigger positions reported by the Origin command.
///
/// Field order is the wire order; see [`to_bytes`](Self::to_bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRecord {
    /// Echo of the Origin command byte
    pub command: u8,
    pub stick_x: u8,
    pub stick_y: u8,
    pub substick_x: u8,
    pub substick_y: u8,
    pub trigger_left: u8,
    pub trigger_right: u8,
}

impl Default for OriginRecord {
    fn default() -> Self {
        Self {
            command: CMD_ORIGIN,
            stick_x: 0x80,
            stick_y: 0x80,
            substick_x: 0x80,
            substick_y: 0x80,
            trigger_left: 0x1F,
            trigger_right: 0x1F,
        }
    }
}

impl OriginRecord {
    /// Wire layout. Byte 1 and bytes 8..12 are reserved and always zero.
    pub fn to_bytes(&self) -> [u8; ORIGIN_RECORD_LEN] {
        [
            self.command,
            0,
            self.stick_x,
            self.stick_y,
            self.substick_x,
            self.substick_y,
            self.trigger_left,
            self.trigger_right,
            0,
            0,
            0,
            0,
        ]
    }
}

/// Pack a pad sample into the two polling registers.
pub fn encode_poll_words(status: &PadStatus) -> PollWords {
    let hi = status.stick_y as u32
        | (status.stick_x as u32) << 8
        | (status.button as u32) << 16
        | POLL_USE_ORIGIN;

    let low = status.trigger_right as u32
        | (status.trigger_left as u32) << 8
        | (status.substick_y as u32) << 16
        | (status.substick_x as u32) << 24;

    PollWords { hi, low }
}

/// A standard controller with rumble motor
pub struct StandardController {
    port: Port,
    origin: OriginRecord,
    collaborators: Collaborators,
}

impl StandardController {
    pub fn new(port: Port, collaborators: Collaborators) -> Self {
        Self {
            port,
            origin: OriginRecord::default(),
            collaborators,
        }
    }

    pub fn origin(&self) -> &OriginRecord {
        &self.origin
    }

    fn trace(&self, source: TraceSource, message: impl FnOnce() -> String) {
        let sink = &self.collaborators.diagnostics;
        if sink.trace_enabled(source) {
            sink.trace(self.port, source, &message());
        }
    }

    fn report(&self, error: SiError) {
        self.collaborators.diagnostics.report(self.port, &error);
    }

    fn execute(&self, buffer: &mut [u8]) -> Result<(), SiError> {
        let command = buffer::read_byte(buffer, 0)?;

        match BufferCommand::from(command) {
            BufferCommand::Reset => buffer::write_word(buffer, SI_GC_CONTROLLER),
            BufferCommand::Origin => {
                self.trace(TraceSource::Buffer, || "Get Origin".to_string());
                buffer::write_bytes(buffer, &self.origin.to_bytes())
            }
            BufferCommand::Recalibrate => {
                // The neutral positions are kept, not resampled from the pad
                self.trace(TraceSource::Buffer, || "Recalibrate".to_string());
                buffer::write_bytes(buffer, &self.origin.to_bytes())
            }
            BufferCommand::WiiUnknown => {
                self.trace(TraceSource::Buffer, || {
                    format!("unhandled command (0x{:02x}), not answered", command)
                });
                Ok(())
            }
            BufferCommand::Unknown(code) => Err(SiError::UnrecognizedBufferCommand(code)),
        }
    }

    fn rumble(&self, mode: RumbleMode, strength: u8) {
        match &self.collaborators.rumble {
            Some(actuator) => {
                self.trace(TraceSource::Actuator, || {
                    format!("rumble {:?} strength {}", mode, strength)
                });
                actuator.rumble(self.port, mode, strength);
            }
            None => self.trace(TraceSource::Actuator, || {
                format!("rumble {:?} ignored, no actuator", mode)
            }),
        }
    }
}

impl SiDevice for StandardController {
    fn port(&self) -> Port {
        self.port
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::StandardController
    }

    fn run_buffer(&mut self, buffer: &mut [u8]) -> usize {
        device::trace_buffer(self.collaborators.diagnostics.as_ref(), self.port, buffer);

        if buffer.len() > MAX_TRANSFER_LENGTH {
            self.report(SiError::OversizedBuffer(buffer.len()));
        }
        if let Err(error) = self.execute(buffer) {
            self.report(error);
        }

        buffer.len()
    }

    fn get_data(&mut self) -> Option<PollWords> {
        let status = self.collaborators.input.pad_status(self.port);
        let words = encode_poll_words(&status);

        self.collaborators
            .microphone
            .set_mic_button(self.port, status.mic_button);
        self.trace(TraceSource::Input, || words.to_string());

        Some(words)
    }

    fn send_command(&mut self, command: u32) {
        let decoded = DirectCommand::from(command);
        match decoded.command {
            CMD_DIRECT_NOP => {}
            CMD_RUMBLE => self.rumble(RumbleMode::from(decoded.parameter1), decoded.parameter2),
            _ => self.report(SiError::UnrecognizedDirectCommand(command)),
        }
    }

    fn save_state(&self) -> serde_json::Value {
        serde_json::json!({
            "version": SAVE_STATE_VERSION,
            "kind": self.kind(),
            "port": self.port,
            "origin": self.origin,
        })
    }

    fn load_state(&mut self, v: &serde_json::Value) -> Result<(), serde_json::Error> {
        use serde::de::Error;

        device::check_state_header(v, self.kind())?;
        let origin = v
            .get("origin")
            .ok_or_else(|| serde_json::Error::missing_field("origin"))?;
        self.origin = serde_json::from_value(origin.clone())?;
        Ok(())
    }
}
