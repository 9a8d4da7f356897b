use crate::device::{DeviceKind, PollWords, SiDevice, SI_NO_DEVICE};
use crate::pad::Port;

/// An empty port. Answers every buffer with the "no device" identifier.
#[derive(Debug, Clone, Copy)]
pub struct DummyDevice {
    port: Port,
}

impl DummyDevice {
    pub fn new(port: Port) -> Self {
        Self { port }
    }
}

impl SiDevice for DummyDevice {
    fn port(&self) -> Port {
        self.port
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Dummy
    }

    /// Always reports 4 bytes consumed, whatever the buffer length.
    fn run_buffer(&mut self, buffer: &mut [u8]) -> usize {
        // The identifier is zero, so byte order does not matter here
        let len = buffer.len().min(4);
        buffer[..len].copy_from_slice(&SI_NO_DEVICE.to_le_bytes()[..len]);
        4
    }

    fn get_data(&mut self) -> Option<PollWords> {
        None
    }

    fn send_command(&mut self, _command: u32) {}
}
