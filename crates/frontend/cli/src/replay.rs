//! Runs a script against a set of ports, standing in for the SI bus
//! controller.

use crate::config::Config;
use crate::script::{parse_hex_bytes, Action, Script, Step};
use anyhow::{bail, Result};
use emu_gamecube::buffer::{required_len, swizzle, MAX_TRANSFER_LENGTH};
use emu_gamecube::diagnostics::Diagnostic;
use emu_gamecube::pad::MicrophoneLink;
use emu_gamecube::{
    create_device, CollectingSink, Collaborators, DiagnosticsSink, PadInput, PadStatus,
    PollWords, Port, RumbleActuator, RumbleMode, SiDevice, PORT_COUNT,
};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Input backend fed by `poll` steps
struct ScriptedInput {
    pads: Mutex<[PadStatus; PORT_COUNT]>,
}

impl PadInput for ScriptedInput {
    fn pad_status(&self, port: Port) -> PadStatus {
        lock(&self.pads)[port]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RumbleEvent {
    pub mode: RumbleMode,
    pub strength: u8,
}

/// Records what the devices asked of the host during a step
#[derive(Default)]
struct HostRecorder {
    rumble: Mutex<Vec<RumbleEvent>>,
    mic: Mutex<Option<bool>>,
}

impl RumbleActuator for HostRecorder {
    fn rumble(&self, _port: Port, mode: RumbleMode, strength: u8) {
        lock(&self.rumble).push(RumbleEvent { mode, strength });
    }
}

impl MicrophoneLink for HostRecorder {
    fn set_mic_button(&self, _port: Port, pressed: bool) {
        *lock(&self.mic) = Some(pressed);
    }
}

/// Outcome of one script step
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepResult {
    pub step: usize,
    pub port: Port,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed: Option<usize>,
    /// Buffer after the call, device order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollWords>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mic: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rumble: Vec<RumbleEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} port {} {}", self.step, self.port, self.action)?;
        if let Some(consumed) = self.consumed {
            write!(f, " consumed={}", consumed)?;
        }
        if let Some(response) = &self.response {
            write!(f, " [{}]", response)?;
        }
        match (self.new_data, self.poll) {
            (Some(true), Some(words)) => write!(f, " {}", words)?,
            (Some(false), _) => write!(f, " no data")?,
            _ => {}
        }
        if let Some(mic) = self.mic {
            write!(f, " mic={}", mic)?;
        }
        for event in &self.rumble {
            write!(f, " rumble={:?}/{}", event.mode, event.strength)?;
        }
        for message in &self.diagnostics {
            write!(f, "\n    ! {}", message)?;
        }
        Ok(())
    }
}

/// Render the buffer in device order. Bytes outside the slice show as `??`.
pub fn device_order_hex(buffer: &[u8]) -> String {
    (0..buffer.len())
        .map(|i| match buffer.get(swizzle(i)) {
            Some(byte) => format!("{:02x}", byte),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the stored buffer for a buffer step
fn build_buffer(data: &[u8], length: Option<usize>) -> Result<Vec<u8>> {
    let len = length.unwrap_or_else(|| required_len(data.len()));
    if len > MAX_TRANSFER_LENGTH {
        bail!("buffer length {} exceeds {}", len, MAX_TRANSFER_LENGTH);
    }
    let mut buffer = vec![0u8; len];
    for (i, &byte) in data.iter().enumerate() {
        match buffer.get_mut(swizzle(i)) {
            Some(slot) => *slot = byte,
            None => bail!("{} data byte(s) do not fit a {} byte buffer", data.len(), len),
        }
    }
    Ok(buffer)
}

/// The ports of one console plus the host side the devices talk to
pub struct Replay {
    ports: Vec<Box<dyn SiDevice>>,
    input: Arc<ScriptedInput>,
    host: Arc<HostRecorder>,
    sink: Arc<CollectingSink>,
}

impl Replay {
    pub fn new(config: &Config, log: Arc<dyn DiagnosticsSink>) -> Self {
        let input = Arc::new(ScriptedInput {
            pads: Mutex::new([PadStatus::default(); PORT_COUNT]),
        });
        let host = Arc::new(HostRecorder::default());
        let sink = Arc::new(CollectingSink::new().forwarding_to(log));

        let mut collaborators =
            Collaborators::new(input.clone(), sink.clone()).with_microphone(host.clone());
        if config.rumble {
            collaborators = collaborators.with_rumble(host.clone());
        }

        let ports = config
            .ports
            .iter()
            .enumerate()
            .map(|(port, &kind)| create_device(kind, port, &collaborators))
            .collect();

        Self {
            ports,
            input,
            host,
            sink,
        }
    }

    pub fn run(&mut self, script: &Script) -> Result<Vec<StepResult>> {
        script
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    pub fn run_step(&mut self, index: usize, step: &Step) -> Result<StepResult> {
        if step.port >= self.ports.len() {
            bail!("step {}: port {} does not exist", index, step.port);
        }
        let mut result = StepResult {
            step: index,
            port: step.port,
            ..Default::default()
        };

        match &step.action {
            Action::Buffer(hex) => {
                let data = parse_hex_bytes(hex)?;
                let mut buffer = build_buffer(&data, step.length)?;
                result.action = "buffer";
                result.consumed = Some(self.ports[step.port].run_buffer(&mut buffer));
                result.response = Some(device_order_hex(&buffer));
            }
            Action::Poll(status) => {
                lock(&self.input.pads)[step.port] = *status;
                result.action = "poll";
                let words = self.ports[step.port].get_data();
                result.new_data = Some(words.is_some());
                result.poll = words;
            }
            Action::Direct(word) => {
                result.action = "direct";
                self.ports[step.port].send_command(word.value()?);
            }
        }

        result.mic = lock(&self.host.mic).take();
        result.rumble = std::mem::take(&mut *lock(&self.host.rumble));
        result.diagnostics = self
            .sink
            .take()
            .into_iter()
            .filter_map(|event| match event {
                Diagnostic::Report { error, .. } => Some(error.to_string()),
                Diagnostic::Trace { .. } => None,
            })
            .collect();

        Ok(result)
    }

    /// Save states of every port
    pub fn save_state(&self) -> serde_json::Value {
        serde_json::json!({
            "version": 1,
            "ports": self.ports.iter().map(|d| d.save_state()).collect::<Vec<_>>(),
        })
    }
}
