//! Spectrum machine configuration.

use emu_core::MasterClock;

/// CPU clock of a stock 48K machine.
pub const DEFAULT_CLOCK_HZ: u64 = 3_500_000;

/// Configuration for creating a Spectrum instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpectrumConfig {
    /// CPU clock in Hz. The maskable interrupt fires 50 times per second
    /// of this clock.
    pub clock_hz: u64,
    /// ROM data. Must be exactly 16,384 bytes.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub rom: Vec<u8>,
}

impl SpectrumConfig {
    /// Stock clock with the given ROM.
    #[must_use]
    pub fn with_rom(rom: Vec<u8>) -> Self {
        Self { rom, ..Self::default() }
    }

    #[must_use]
    pub fn clock(&self) -> MasterClock {
        MasterClock::new(self.clock_hz)
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            rom: Vec::new(),
        }
    }
}
