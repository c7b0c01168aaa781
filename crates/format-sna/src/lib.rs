//! ZX Spectrum 48K SNA snapshot parser.
//!
//! SNA is a 27-byte register header followed by the 48K RAM image
//! ($4000-$FFFF), 49,179 bytes in all. PC isn't in the header: it sits on
//! the stack inside the RAM image and is popped on load.
//!
//! This crate also owns the machine-neutral [`Snapshot`] and
//! [`SnapshotError`] types that the other snapshot formats produce.

use thiserror::Error;
use tracing::debug;

/// First address covered by the RAM image.
pub const RAM_START: u16 = 0x4000;
/// RAM image size (48K from $4000-$FFFF).
pub const RAM_SIZE: usize = 0xC000;
/// Header size in bytes.
pub const HEADER_SIZE: usize = 27;
/// Exact size of a 48K SNA file.
pub const SNA_SIZE: usize = HEADER_SIZE + RAM_SIZE;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot must be {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },
    #[error("snapshot truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("stack pointer ${0:04X} points into ROM, cannot pop PC")]
    StackInRom(u16),
    #[error("unsupported extended header length {0}")]
    UnknownHeaderLength(u16),
    #[error("hardware mode {mode} in a version {version} snapshot is not a 48K machine")]
    UnsupportedHardware { version: u8, mode: u8 },
    #[error("compressed block for ${address:04X} is corrupt: {reason}")]
    CorruptBlock { address: u16, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Register state captured by a snapshot.
///
/// Pairs are stored as 16-bit values with the high register in the high
/// byte (A in `af`, B in `bc`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuState {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: bool,
    pub iff2: bool,
    /// Interrupt mode, 0-2.
    pub im: u8,
}

/// A decoded 48K machine snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cpu: CpuState,
    /// Border colour, 0-7.
    pub border: u8,
    /// RAM image for $4000-$FFFF, always [`RAM_SIZE`] bytes.
    pub ram: Vec<u8>,
}

impl Snapshot {
    /// Read a byte of RAM by CPU address. ROM addresses read as 0xFF.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        address
            .checked_sub(RAM_START)
            .and_then(|offset| self.ram.get(offset as usize))
            .copied()
            .unwrap_or(0xFF)
    }
}

fn word(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Parse a 48K SNA snapshot.
///
/// # Errors
///
/// Returns an error if the data isn't exactly [`SNA_SIZE`] bytes, or the
/// stack pointer doesn't leave room to pop PC from RAM.
///
/// SP = $FFFF is rejected along with SP < $4000: the high byte of PC would
/// come from $0000, which is ROM and not part of the file. SP = $FFFE pops
/// the last two bytes of RAM and leaves SP at $0000.
pub fn parse(data: &[u8]) -> Result<Snapshot> {
    if data.len() != SNA_SIZE {
        return Err(SnapshotError::WrongSize {
            expected: SNA_SIZE,
            actual: data.len(),
        });
    }

    let iff = data[19] & 0x04 != 0;
    let mut cpu = CpuState {
        i: data[0],
        hl_alt: word(data, 1),
        de_alt: word(data, 3),
        bc_alt: word(data, 5),
        af_alt: word(data, 7),
        hl: word(data, 9),
        de: word(data, 11),
        bc: word(data, 13),
        iy: word(data, 15),
        ix: word(data, 17),
        iff1: iff,
        iff2: iff,
        r: data[20],
        af: word(data, 21),
        sp: word(data, 23),
        im: data[25].min(2),
        pc: 0,
    };
    let border = data[26] & 0x07;

    let snapshot_ram = data[HEADER_SIZE..].to_vec();

    // PC lives in the two bytes at SP.
    if cpu.sp < RAM_START || cpu.sp == 0xFFFF {
        return Err(SnapshotError::StackInRom(cpu.sp));
    }
    let offset = usize::from(cpu.sp - RAM_START);
    cpu.pc = u16::from_le_bytes([snapshot_ram[offset], snapshot_ram[offset + 1]]);
    cpu.sp = cpu.sp.wrapping_add(2);

    debug!(pc = cpu.pc, sp = cpu.sp, border, "parsed SNA snapshot");

    Ok(Snapshot {
        cpu,
        border,
        ram: snapshot_ram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a SNA with a recognisable register set and PC 0x8123 on the
    /// stack at 0xFF00.
    fn make_sna() -> Vec<u8> {
        let mut data = vec![0u8; SNA_SIZE];
        data[0] = 0x3F; // I
        data[1..9].copy_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
        data[9..15].copy_from_slice(&[0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB]);
        data[15..17].copy_from_slice(&[0x00, 0x5C]); // IY
        data[17..19].copy_from_slice(&[0x34, 0x12]); // IX
        data[19] = 0x04; // IFF2
        data[20] = 0x42; // R
        data[21] = 0x45; // F
        data[22] = 0xAA; // A
        data[23..25].copy_from_slice(&[0x00, 0xFF]); // SP
        data[25] = 1; // IM
        data[26] = 0x02; // border

        let stack = HEADER_SIZE + 0xFF00 - 0x4000;
        data[stack] = 0x23;
        data[stack + 1] = 0x81;
        data[HEADER_SIZE] = 0x99; // $4000
        data
    }

    #[test]
    fn parse_registers() {
        let snap = parse(&make_sna()).expect("valid SNA");
        let cpu = snap.cpu;

        assert_eq!(cpu.i, 0x3F);
        assert_eq!(cpu.hl_alt, 0x2211);
        assert_eq!(cpu.de_alt, 0x4433);
        assert_eq!(cpu.bc_alt, 0x6655);
        assert_eq!(cpu.af_alt, 0x8877);
        assert_eq!(cpu.hl, 0x5678);
        assert_eq!(cpu.de, 0x1234);
        assert_eq!(cpu.bc, 0xABCD);
        assert_eq!(cpu.iy, 0x5C00);
        assert_eq!(cpu.ix, 0x1234);
        assert!(cpu.iff1);
        assert!(cpu.iff2);
        assert_eq!(cpu.r, 0x42);
        assert_eq!(cpu.af, 0xAA45);
        assert_eq!(cpu.im, 1);
        assert_eq!(snap.border, 2);
    }

    #[test]
    fn pops_pc_from_stack() {
        let snap = parse(&make_sna()).expect("valid SNA");
        assert_eq!(snap.cpu.pc, 0x8123);
        assert_eq!(snap.cpu.sp, 0xFF02);
    }

    #[test]
    fn pops_pc_at_top_of_stack() {
        let mut data = make_sna();
        data[23..25].copy_from_slice(&[0xFE, 0xFF]);
        data[SNA_SIZE - 2] = 0x00;
        data[SNA_SIZE - 1] = 0x90;
        let snap = parse(&data).expect("valid SNA");
        assert_eq!(snap.cpu.pc, 0x9000);
        assert_eq!(snap.cpu.sp, 0x0000);
    }

    #[test]
    fn ram_image_starts_at_4000() {
        let snap = parse(&make_sna()).expect("valid SNA");
        assert_eq!(snap.ram.len(), RAM_SIZE);
        assert_eq!(snap.peek(0x4000), 0x99);
        assert_eq!(snap.peek(0x0000), 0xFF);
    }

    #[test]
    fn interrupts_disabled_when_bit_2_clear() {
        let mut data = make_sna();
        data[19] = 0xFB;
        let snap = parse(&data).expect("valid SNA");
        assert!(!snap.cpu.iff1);
        assert!(!snap.cpu.iff2);
    }

    #[test]
    fn out_of_range_mode_is_mode_2() {
        let mut data = make_sna();
        data[25] = 3;
        assert_eq!(parse(&data).expect("valid SNA").cpu.im, 2);
    }

    #[test]
    fn reject_wrong_size() {
        assert_eq!(
            parse(&[0; 100]),
            Err(SnapshotError::WrongSize { expected: SNA_SIZE, actual: 100 })
        );
        assert!(parse(&vec![0; SNA_SIZE + 1]).is_err());
    }

    #[test]
    fn reject_stack_in_rom() {
        let mut data = make_sna();
        data[23..25].copy_from_slice(&[0x00, 0x30]);
        assert_eq!(parse(&data), Err(SnapshotError::StackInRom(0x3000)));
    }

    #[test]
    fn reject_stack_at_top_of_memory() {
        let mut data = make_sna();
        data[23..25].copy_from_slice(&[0xFF, 0xFF]);
        assert_eq!(parse(&data), Err(SnapshotError::StackInRom(0xFFFF)));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SnapshotError::StackInRom(0x1234).to_string(),
            "stack pointer $1234 points into ROM, cannot pop PC"
        );
    }
}
