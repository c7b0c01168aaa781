//! Processor clock configuration.

/// The maskable interrupt fires once per video frame, 50 times a second.
pub const FRAMES_PER_SECOND: u64 = 50;

/// Clock configuration for a CPU.
///
/// A single frequency decides how many cycles elapse between two
/// interrupt opportunities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MasterClock {
    /// Processor frequency in Hz (e.g. `3_500_000` for a 48K Spectrum).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Cycles per frame at the given frame rate, rounded to nearest.
    #[must_use]
    pub const fn cycles_per_frame(&self, frames_per_second: u64) -> u64 {
        (self.frequency_hz + frames_per_second / 2) / frames_per_second
    }

    /// Cycles between two maskable interrupt opportunities.
    #[must_use]
    pub const fn cycles_per_interrupt(&self) -> u64 {
        self.cycles_per_frame(FRAMES_PER_SECOND)
    }
}

impl Default for MasterClock {
    fn default() -> Self {
        Self::new(3_500_000)
    }
}
