//! GameCube Serial Interface (SI) devices.
//!
//! The SI bus connects the console to its four controller ports. For every
//! port the bus controller owns one device and drives it through
//! [`SiDevice`]:
//!
//! - **Buffer commands**: the console sends a command byte in a shared
//!   buffer and the device overwrites it with the response (device type,
//!   origin/calibration data)
//! - **Polling**: the device packs the current pad sample into two 32-bit
//!   registers
//! - **Direct commands**: rumble motor control outside the buffer protocol
//!
//! Devices are big-endian while command buffers are stored as little-endian
//! words, so every buffer access goes through [`buffer::swizzle`].
//!
//! Host input, rumble and logging are supplied by the embedder through the
//! traits in [`pad`] and [`diagnostics`], bundled as [`Collaborators`].

pub mod buffer;
mod controller;
mod device;
pub mod diagnostics;
mod dummy;
mod error;
pub mod pad;

pub use controller::{
    encode_poll_words, DirectCommand, OriginRecord, StandardController, CMD_DIRECT_NOP,
    CMD_ORIGIN, CMD_RECALIBRATE, CMD_RESET, CMD_RUMBLE, CMD_WII_UNKNOWN, ORIGIN_RECORD_LEN,
};
pub use device::{
    check_state_header, create_device, trace_buffer, Collaborators, DeviceKind, PollWords,
    SiDevice, SAVE_STATE_VERSION, SI_GC_CONTROLLER, SI_GC_KEYBOARD, SI_GC_NOMOTOR,
    SI_GC_STANDARD, SI_NO_DEVICE, SI_TYPE_GC,
};
pub use diagnostics::{CollectingSink, DiagnosticsSink, LogSink, NullSink};
pub use dummy::DummyDevice;
pub use error::SiError;
pub use pad::{PadButtons, PadInput, PadStatus, Port, RumbleActuator, RumbleMode};

/// Number of controller ports on the console
pub const PORT_COUNT: usize = 4;
