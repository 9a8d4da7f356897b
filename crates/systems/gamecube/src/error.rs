use thiserror::Error;

/// Conditions a serial interface device reports while handling a request.
///
/// None of these abort the emulator. The device finishes the call it was
/// handling and hands the error to its [`DiagnosticsSink`](crate::DiagnosticsSink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiError {
    #[error("SI: unknown command (0x{0:02x})")]
    UnrecognizedBufferCommand(u8),
    #[error("SI: unknown direct command (0x{0:08x})")]
    UnrecognizedDirectCommand(u32),
    #[error("SI: buffer of {len} byte(s) too short, {needed} needed")]
    ShortBuffer { needed: usize, len: usize },
    #[error("SI: buffer of {0} bytes exceeds the 128 byte transfer limit")]
    OversizedBuffer(usize),
}
