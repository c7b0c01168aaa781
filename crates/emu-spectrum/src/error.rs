use format_sna::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpectrumError {
    #[error("48K ROM must be exactly 16384 bytes, got {0}")]
    RomSize(usize),
    #[error("a {0} Hz clock is too slow to pace 50 Hz interrupts")]
    ClockTooSlow(u64),
    #[error("unrecognised snapshot file {0:?}")]
    UnknownSnapshotFormat(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("reading snapshot: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
