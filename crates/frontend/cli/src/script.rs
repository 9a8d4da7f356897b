//! Recorded SI command scripts.
//!
//! ```json
//! { "steps": [
//!     { "port": 0, "buffer": "00" },
//!     { "port": 0, "buffer": "41", "length": 12 },
//!     { "port": 0, "poll": { "button": 256, "stick_x": 200 } },
//!     { "port": 0, "direct": "0x00400001" }
//! ] }
//! ```
//!
//! Buffer bytes are written in device order, the order the console sends
//! them and the debug trace prints them.

use anyhow::{bail, Context, Result};
use emu_gamecube::{PadStatus, Port};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub port: Port,
    /// Transfer length for buffer steps; defaults to the data rounded up
    /// to whole words
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Hex bytes, device order
    Buffer(String),
    /// Pad sample the input backend returns, then poll
    Poll(PadStatus),
    /// Direct command word
    Direct(CommandWord),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandWord {
    Number(u32),
    Text(String),
}

impl CommandWord {
    pub fn value(&self) -> Result<u32> {
        match self {
            CommandWord::Number(n) => Ok(*n),
            CommandWord::Text(s) => {
                let s = s.trim();
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => s.parse(),
                };
                parsed.with_context(|| format!("invalid command word '{}'", s))
            }
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing script {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Parse space-separated hex bytes; `0x` prefixes are optional.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>> {
    text.split_whitespace()
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            if digits.is_empty() || digits.len() > 2 {
                bail!("invalid hex byte '{}'", token);
            }
            u8::from_str_radix(digits, 16).with_context(|| format!("invalid hex byte '{}'", token))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("41 0x00 ff").unwrap(), vec![0x41, 0x00, 0xFF]);
        assert!(parse_hex_bytes("").unwrap().is_empty());
        assert!(parse_hex_bytes("123").is_err());
        assert!(parse_hex_bytes("zz").is_err());
        assert!(parse_hex_bytes("0x").is_err());
    }

    #[test]
    fn test_command_word_forms() {
        assert_eq!(CommandWord::Number(0x0040_0001).value().unwrap(), 0x0040_0001);
        assert_eq!(
            CommandWord::Text("0x00400002".to_string()).value().unwrap(),
            0x0040_0002
        );
        assert_eq!(CommandWord::Text("64".to_string()).value().unwrap(), 64);
        assert!(CommandWord::Text("0xZZ".to_string()).value().is_err());
    }

    #[test]
    fn test_parse_script() {
        let script = Script::parse(
            r#"{ "steps": [
                { "port": 0, "buffer": "00" },
                { "port": 1, "buffer": "41", "length": 12 },
                { "port": 0, "poll": { "stick_x": 200 } },
                { "port": 2, "direct": 4194305 }
            ] }"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 4);
        assert!(matches!(script.steps[0].action, Action::Buffer(ref s) if s == "00"));
        assert_eq!(script.steps[1].length, Some(12));
        match &script.steps[2].action {
            Action::Poll(status) => {
                assert_eq!(status.stick_x, 200);
                assert_eq!(status.stick_y, 0x80);
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert!(matches!(
            script.steps[3].action,
            Action::Direct(CommandWord::Number(0x0040_0001))
        ));
    }

    #[test]
    fn test_step_without_action_rejected() {
        assert!(Script::parse(r#"{ "steps": [ { "port": 0 } ] }"#).is_err());
    }
}
