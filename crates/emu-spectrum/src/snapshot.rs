//! Snapshot file formats.

use std::path::Path;

use format_sna::Snapshot;

/// Supported snapshot layouts, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Fixed 27-byte header, PC on the stack.
    Sna,
    /// Variable header, optional run-length encoding.
    Z80,
}

impl SnapshotFormat {
    /// Format for a file extension, case-insensitively.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.eq_ignore_ascii_case("sna") {
            Some(Self::Sna)
        } else if extension.eq_ignore_ascii_case("z80") {
            Some(Self::Z80)
        } else {
            None
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Decode `data` in this format.
    pub fn parse(self, data: &[u8]) -> format_sna::Result<Snapshot> {
        match self {
            Self::Sna => format_sna::parse(data),
            Self::Z80 => format_z80::parse(data),
        }
    }
}
