//! Core emulator primitives shared by the system and frontend crates.

pub mod logging;
