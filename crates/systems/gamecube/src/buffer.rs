//! Byte access to SI command buffers.
//!
//! Devices on the serial interface are big-endian, but the buffer handed to
//! them is stored as little-endian 32-bit words. Byte `i` of the device's
//! view therefore lives at `i ^ 3` in the slice. Every read and write the
//! command interpreter performs goes through [`swizzle`] so that the
//! convention lives in exactly one place.
//!
//! Accesses are bounds-checked: a response that does not fit the caller's
//! slice is rejected with [`SiError::ShortBuffer`] before anything is
//! written.

use crate::error::SiError;

/// Largest transfer the SI controller performs in either direction
pub const MAX_TRANSFER_LENGTH: usize = 128;

/// Values rendered per debug trace line
const TRACE_VALUES_PER_LINE: usize = 8;

/// Map a device-order byte index to its position in the buffer.
#[inline]
pub const fn swizzle(index: usize) -> usize {
    index ^ 3
}

/// Slice length required to hold device-order bytes `0..count`.
///
/// Swizzling only permutes bytes within a 4-byte word, so any partial word
/// still needs the whole word to be present.
#[inline]
pub const fn required_len(count: usize) -> usize {
    (count + 3) & !3
}

fn ensure_span(buffer: &[u8], count: usize) -> Result<(), SiError> {
    let needed = required_len(count);
    if buffer.len() < needed {
        return Err(SiError::ShortBuffer {
            needed,
            len: buffer.len(),
        });
    }
    Ok(())
}

/// Read device-order byte `index`.
pub fn read_byte(buffer: &[u8], index: usize) -> Result<u8, SiError> {
    buffer
        .get(swizzle(index))
        .copied()
        .ok_or(SiError::ShortBuffer {
            needed: required_len(index + 1),
            len: buffer.len(),
        })
}

/// Write `bytes` as device-order bytes `0..bytes.len()`.
pub fn write_bytes(buffer: &mut [u8], bytes: &[u8]) -> Result<(), SiError> {
    ensure_span(buffer, bytes.len())?;
    for (i, &byte) in bytes.iter().enumerate() {
        buffer[swizzle(i)] = byte;
    }
    Ok(())
}

/// Write a 32-bit word at the start of the buffer, most significant byte first
/// in device order.
pub fn write_word(buffer: &mut [u8], value: u32) -> Result<(), SiError> {
    write_bytes(buffer, &value.to_be_bytes())
}

/// Read the 32-bit word at the start of the buffer in device order.
pub fn read_word(buffer: &[u8]) -> Result<u32, SiError> {
    Ok(u32::from_be_bytes([
        read_byte(buffer, 0)?,
        read_byte(buffer, 1)?,
        read_byte(buffer, 2)?,
        read_byte(buffer, 3)?,
    ]))
}

/// Render a buffer for the debug trace: `0x%02x` values in device order,
/// eight per line. Bytes whose swizzled position falls outside the slice
/// show as `0x??`.
pub fn trace_lines(buffer: &[u8]) -> Vec<String> {
    let values: Vec<String> = (0..buffer.len())
        .map(|i| match buffer.get(swizzle(i)) {
            Some(byte) => format!("0x{:02x}", byte),
            None => "0x??".to_string(),
        })
        .collect();

    values
        .chunks(TRACE_VALUES_PER_LINE)
        .map(|chunk| chunk.join(" "))
        .collect()
}
