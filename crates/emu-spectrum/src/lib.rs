//! ZX Spectrum 48K machine.
//!
//! Hosts the Z80 core with the pieces it needs to run Spectrum software:
//! 64K of memory with a read-only ROM bank, the port map (ULA keyboard
//! and border, AY and Kempston stubs), the keyboard matrix and snapshot
//! loading. Video, audio and tape are not emulated.

mod bus;
mod config;
mod error;
mod keyboard;
mod memory;
mod ports;
mod snapshot;
mod spectrum;

pub use bus::SpectrumBus;
pub use config::SpectrumConfig;
pub use error::{Result, SpectrumError};
pub use keyboard::{KeyboardState, SpectrumKey};
pub use memory::{BANK_SIZE, Memory48K, ROM_SIZE};
pub use ports::{PortEntry, PortMap, SpectrumPort};
pub use snapshot::SnapshotFormat;
pub use spectrum::Spectrum;
