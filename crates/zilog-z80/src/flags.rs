//! Flag register layout and the decomposed flag state.

/// Carry.
pub const CF: u8 = 0x01;
/// Add/subtract.
pub const NF: u8 = 0x02;
/// Parity/overflow.
pub const PF: u8 = 0x04;
/// Undocumented bit 3 (copy of result bit 3).
pub const XF: u8 = 0x08;
/// Half-carry.
pub const HF: u8 = 0x10;
/// Undocumented bit 5 (copy of result bit 5).
pub const YF: u8 = 0x20;
/// Zero.
pub const ZF: u8 = 0x40;
/// Sign.
pub const SF: u8 = 0x80;

/// Even-parity lookup: entry `i` is true when `i` has an even number of
/// set bits.
pub static PARITY: [bool; 256] = build_parity_table();

const fn build_parity_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() % 2 == 0;
        i += 1;
    }
    table
}

/// True if `value` has even parity.
#[inline]
#[must_use]
pub fn parity(value: u8) -> bool {
    PARITY[value as usize]
}

/// The F register held as individual booleans.
///
/// This is the only copy of the flags while the CPU runs. The packed byte
/// is produced on demand by [`Flags::bits`] and consumed by
/// [`Flags::from_bits`], so the two views cannot disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub s: bool,
    pub z: bool,
    /// Bit 5.
    pub y: bool,
    pub h: bool,
    /// Bit 3.
    pub x: bool,
    pub pv: bool,
    pub n: bool,
    pub c: bool,
}

impl Flags {
    /// Decompose a packed flag byte.
    #[must_use]
    pub const fn from_bits(f: u8) -> Self {
        Self {
            s: f & SF != 0,
            z: f & ZF != 0,
            y: f & YF != 0,
            h: f & HF != 0,
            x: f & XF != 0,
            pv: f & PF != 0,
            n: f & NF != 0,
            c: f & CF != 0,
        }
    }

    /// Pack into the F register byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        (if self.s { SF } else { 0 })
            | (if self.z { ZF } else { 0 })
            | (if self.y { YF } else { 0 })
            | (if self.h { HF } else { 0 })
            | (if self.x { XF } else { 0 })
            | (if self.pv { PF } else { 0 })
            | (if self.n { NF } else { 0 })
            | (if self.c { CF } else { 0 })
    }

    /// Copy result bits 3 and 5 into the undocumented flags.
    #[inline]
    pub fn set_xy(&mut self, value: u8) {
        self.x = value & XF != 0;
        self.y = value & YF != 0;
    }

    /// Sign, zero and bits 3/5 from an 8-bit result.
    #[inline]
    pub fn set_sz53(&mut self, value: u8) {
        self.s = value & 0x80 != 0;
        self.z = value == 0;
        self.set_xy(value);
    }

    /// Sign, zero, bits 3/5 and parity from an 8-bit result.
    #[inline]
    pub fn set_sz53p(&mut self, value: u8) {
        self.set_sz53(value);
        self.pv = parity(value);
    }
}
