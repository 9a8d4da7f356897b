//! Pad state and the collaborators a controller talks to.
//!
//! The serial interface device never reads host input itself. It asks a
//! [`PadInput`] backend for the latest sample of its port, forwards rumble
//! requests to an optional [`RumbleActuator`], and passes the microphone
//! button through a [`MicrophoneLink`].
//!
//! ## Button State Convention
//!
//! GameCube pads use **active-high logic**: 1 = pressed, 0 = released.
//!
//! Button layout in the 16-bit mask:
//! - Bits 0-3: D-Left, D-Right, D-Down, D-Up
//! - Bits 4-6: Z, R, L
//! - Bit 7: use-origin flag (set by the controller, not a button)
//! - Bits 8-12: A, B, X, Y, Start
//!
//! Analog axes are unsigned 8-bit with 0x80 at rest.

use serde::{Deserialize, Serialize};

pub type Port = usize;

pub const PAD_BUTTON_LEFT: u16 = 0x0001;
pub const PAD_BUTTON_RIGHT: u16 = 0x0002;
pub const PAD_BUTTON_DOWN: u16 = 0x0004;
pub const PAD_BUTTON_UP: u16 = 0x0008;
pub const PAD_TRIGGER_Z: u16 = 0x0010;
pub const PAD_TRIGGER_R: u16 = 0x0020;
pub const PAD_TRIGGER_L: u16 = 0x0040;
pub const PAD_USE_ORIGIN: u16 = 0x0080;
pub const PAD_BUTTON_A: u16 = 0x0100;
pub const PAD_BUTTON_B: u16 = 0x0200;
pub const PAD_BUTTON_X: u16 = 0x0400;
pub const PAD_BUTTON_Y: u16 = 0x0800;
pub const PAD_BUTTON_START: u16 = 0x1000;

/// Digital buttons of a standard controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PadButtons {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub start: bool,
    pub z: bool,
    pub l: bool,
    pub r: bool,
    pub d_up: bool,
    pub d_down: bool,
    pub d_left: bool,
    pub d_right: bool,
}

impl PadButtons {
    /// Pack into the 16-bit button mask used on the wire
    pub fn to_u16(&self) -> u16 {
        let mut value = 0u16;

        let bits = [
            (self.d_left, PAD_BUTTON_LEFT),
            (self.d_right, PAD_BUTTON_RIGHT),
            (self.d_down, PAD_BUTTON_DOWN),
            (self.d_up, PAD_BUTTON_UP),
            (self.z, PAD_TRIGGER_Z),
            (self.r, PAD_TRIGGER_R),
            (self.l, PAD_TRIGGER_L),
            (self.a, PAD_BUTTON_A),
            (self.b, PAD_BUTTON_B),
            (self.x, PAD_BUTTON_X),
            (self.y, PAD_BUTTON_Y),
            (self.start, PAD_BUTTON_START),
        ];
        for (pressed, bit) in bits {
            if pressed {
                value |= bit;
            }
        }

        value
    }
}

/// A single sample from the input backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadStatus {
    /// Button mask, see the `PAD_*` constants
    pub button: u16,
    pub stick_x: u8,
    pub stick_y: u8,
    /// C-stick
    pub substick_x: u8,
    pub substick_y: u8,
    pub trigger_left: u8,
    pub trigger_right: u8,
    pub mic_button: bool,
}

impl Default for PadStatus {
    /// Nothing pressed, sticks centered, triggers released
    fn default() -> Self {
        Self {
            button: 0,
            stick_x: 0x80,
            stick_y: 0x80,
            substick_x: 0x80,
            substick_y: 0x80,
            trigger_left: 0,
            trigger_right: 0,
            mic_button: false,
        }
    }
}

impl PadStatus {
    pub fn with_buttons(mut self, buttons: PadButtons) -> Self {
        self.button = buttons.to_u16();
        self
    }
}

/// Source of live pad samples, addressed by port.
pub trait PadInput: Send + Sync {
    /// Most recent sample for `port`. Must not consume or queue anything.
    fn pad_status(&self, port: Port) -> PadStatus;
}

/// Motor state requested by a rumble command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RumbleMode {
    Stop,
    Rumble,
    StopHard,
    /// A mode value the pad protocol does not define, passed through as-is
    Unknown(u8),
}

impl From<u8> for RumbleMode {
    fn from(value: u8) -> Self {
        match value {
            0 => RumbleMode::Stop,
            1 => RumbleMode::Rumble,
            2 => RumbleMode::StopHard,
            other => RumbleMode::Unknown(other),
        }
    }
}

/// Rumble motor of a port. Optional: devices work without one.
pub trait RumbleActuator: Send + Sync {
    fn rumble(&self, port: Port, mode: RumbleMode, strength: u8);
}

/// Side channel carrying the microphone button to whoever emulates the mic.
pub trait MicrophoneLink: Send + Sync {
    fn set_mic_button(&self, port: Port, pressed: bool);
}

/// Input backend that always reports an idle pad.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePadInput;

impl PadInput for IdlePadInput {
    fn pad_status(&self, _port: Port) -> PadStatus {
        PadStatus::default()
    }
}

/// Microphone link for setups without a microphone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMicrophone;

impl MicrophoneLink for NoMicrophone {
    fn set_mic_button(&self, _port: Port, _pressed: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_packing() {
        let mut buttons = PadButtons::default();
        assert_eq!(buttons.to_u16(), 0);

        buttons.a = true;
        assert_eq!(buttons.to_u16(), 0x0100);

        buttons.start = true;
        assert_eq!(buttons.to_u16(), 0x1100);

        buttons.d_left = true;
        assert_eq!(buttons.to_u16(), 0x1101);
    }

    #[test]
    fn test_button_groups() {
        let buttons = PadButtons {
            d_up: true,
            d_down: true,
            d_left: true,
            d_right: true,
            ..Default::default()
        };
        assert_eq!(buttons.to_u16(), 0x000F);

        let triggers = PadButtons {
            z: true,
            l: true,
            r: true,
            ..Default::default()
        };
        assert_eq!(triggers.to_u16(), 0x0070);

        let face = PadButtons {
            a: true,
            b: true,
            x: true,
            y: true,
            start: true,
            ..Default::default()
        };
        assert_eq!(face.to_u16(), 0x1F00);
    }

    #[test]
    fn test_buttons_never_set_use_origin() {
        let all = PadButtons {
            a: true,
            b: true,
            x: true,
            y: true,
            start: true,
            z: true,
            l: true,
            r: true,
            d_up: true,
            d_down: true,
            d_left: true,
            d_right: true,
        };
        assert_eq!(all.to_u16() & PAD_USE_ORIGIN, 0);
    }

    #[test]
    fn test_rumble_mode_decoding() {
        assert_eq!(RumbleMode::from(0), RumbleMode::Stop);
        assert_eq!(RumbleMode::from(1), RumbleMode::Rumble);
        assert_eq!(RumbleMode::from(2), RumbleMode::StopHard);
        assert_eq!(RumbleMode::from(7), RumbleMode::Unknown(7));
    }

    #[test]
    fn test_pad_status_partial_json() {
        let status: PadStatus =
            serde_json::from_str(r#"{"stick_x": 255, "mic_button": true}"#).unwrap();
        assert_eq!(status.stick_x, 0xFF);
        assert_eq!(status.stick_y, 0x80);
        assert!(status.mic_button);
        assert_eq!(status.button, 0);
    }
}
