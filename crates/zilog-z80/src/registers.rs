//! Z80 register file.

use emu_core::Bus;

use crate::flags::Flags;

/// An 8-bit register operand.
///
/// `IndexHigh`/`IndexLow` name the halves of whichever index register is
/// active for the current DD/FD instruction, and fall back to H/L when no
/// index register is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
    IndexHigh,
    IndexLow,
}

impl Reg8 {
    /// Register from the 3-bit opcode field. Code 6 is `(HL)` and has no
    /// register.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & 7 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            7 => Some(Reg8::A),
            _ => None,
        }
    }

    /// H and L become the active index register's halves.
    #[must_use]
    pub const fn indexed(self) -> Self {
        match self {
            Reg8::H => Reg8::IndexHigh,
            Reg8::L => Reg8::IndexLow,
            other => other,
        }
    }
}

/// A 16-bit register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    BC,
    DE,
    HL,
    SP,
    AF,
    /// The active index register (IX or IY).
    Index,
}

impl Reg16 {
    /// Pair from the 2-bit `p` field used by LD/INC/DEC/ADD (`SP` table).
    #[must_use]
    pub const fn from_code_sp(code: u8) -> Self {
        match code & 3 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::SP,
        }
    }

    /// Pair from the 2-bit `p` field used by PUSH/POP (`AF` table).
    #[must_use]
    pub const fn from_code_af(code: u8) -> Self {
        match code & 3 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::AF,
        }
    }

    /// HL becomes the active index register.
    #[must_use]
    pub const fn indexed(self) -> Self {
        match self {
            Reg16::HL => Reg16::Index,
            other => other,
        }
    }
}

/// IX or IY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexReg {
    IX,
    IY,
}

/// Maskable interrupt response mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterruptMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
}

impl InterruptMode {
    /// Mode from the two low bits stored by snapshot formats. 3 is not a
    /// real mode and is read as mode 2.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => InterruptMode::Mode0,
            1 => InterruptMode::Mode1,
            _ => InterruptMode::Mode2,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            InterruptMode::Mode0 => 0,
            InterruptMode::Mode1 => 1,
            InterruptMode::Mode2 => 2,
        }
    }

    /// Assembler name of the mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            InterruptMode::Mode0 => "IM0",
            InterruptMode::Mode1 => "IM1",
            InterruptMode::Mode2 => "IM2",
        }
    }
}

/// All architectural Z80 state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    pub a: u8,
    pub flags: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Shadow set. F' is kept packed: ordinary opcodes never see it.
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,

    active_index: Option<IndexReg>,
}

impl RegisterFile {
    /// Power-on state: everything zero, interrupts off, mode 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Packed F register.
    #[must_use]
    pub const fn f(&self) -> u8 {
        self.flags.bits()
    }

    pub fn set_f(&mut self, value: u8) {
        self.flags = Flags::from_bits(value);
    }

    #[must_use]
    pub const fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.flags.bits()])
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.set_f(f);
    }

    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        u16::from_be_bytes([self.a_alt, self.f_alt])
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        u16::from_be_bytes([self.b_alt, self.c_alt])
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        u16::from_be_bytes([self.d_alt, self.e_alt])
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        u16::from_be_bytes([self.h_alt, self.l_alt])
    }

    pub fn set_af_alt(&mut self, value: u16) {
        [self.a_alt, self.f_alt] = value.to_be_bytes();
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        [self.b_alt, self.c_alt] = value.to_be_bytes();
    }

    pub fn set_de_alt(&mut self, value: u16) {
        [self.d_alt, self.e_alt] = value.to_be_bytes();
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        [self.h_alt, self.l_alt] = value.to_be_bytes();
    }

    // =========================================================================
    // Index register selection
    // =========================================================================

    /// Make IX or IY the target of `Reg8::IndexHigh`/`IndexLow`/`Reg16::Index`.
    pub fn select_index(&mut self, index: IndexReg) {
        self.active_index = Some(index);
    }

    pub fn deselect_index(&mut self) {
        self.active_index = None;
    }

    #[must_use]
    pub const fn active_index(&self) -> Option<IndexReg> {
        self.active_index
    }

    /// Value of the active index register, or HL outside DD/FD.
    #[must_use]
    pub const fn index(&self) -> u16 {
        match self.active_index {
            Some(IndexReg::IX) => self.ix,
            Some(IndexReg::IY) => self.iy,
            None => self.hl(),
        }
    }

    pub fn set_index(&mut self, value: u16) {
        match self.active_index {
            Some(IndexReg::IX) => self.ix = value,
            Some(IndexReg::IY) => self.iy = value,
            None => self.set_hl(value),
        }
    }

    // =========================================================================
    // Operand access
    // =========================================================================

    #[must_use]
    pub const fn reg8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
            Reg8::A => self.a,
            Reg8::IndexHigh => self.index().to_be_bytes()[0],
            Reg8::IndexLow => self.index().to_be_bytes()[1],
        }
    }

    pub fn set_reg8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => self.h = value,
            Reg8::L => self.l = value,
            Reg8::A => self.a = value,
            Reg8::IndexHigh => {
                let lo = self.index() as u8;
                self.set_index(u16::from_be_bytes([value, lo]));
            }
            Reg8::IndexLow => {
                let hi = (self.index() >> 8) as u8;
                self.set_index(u16::from_be_bytes([hi, value]));
            }
        }
    }

    #[must_use]
    pub const fn reg16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::BC => self.bc(),
            Reg16::DE => self.de(),
            Reg16::HL => self.hl(),
            Reg16::SP => self.sp,
            Reg16::AF => self.af(),
            Reg16::Index => self.index(),
        }
    }

    pub fn set_reg16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::BC => self.set_bc(value),
            Reg16::DE => self.set_de(value),
            Reg16::HL => self.set_hl(value),
            Reg16::SP => self.sp = value,
            Reg16::AF => self.set_af(value),
            Reg16::Index => self.set_index(value),
        }
    }

    // =========================================================================
    // Exchanges
    // =========================================================================

    /// EXX: swap BC, DE, HL with their shadows.
    pub fn exx(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// EX AF,AF'. The live flags are packed into F' and the old F' is
    /// decomposed in one step.
    pub fn ex_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        let live = self.flags.bits();
        self.flags = Flags::from_bits(self.f_alt);
        self.f_alt = live;
    }

    /// EX DE,HL. Never affected by a DD/FD prefix.
    pub fn ex_de_hl(&mut self) {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
    }

    // =========================================================================
    // Stack and refresh
    // =========================================================================

    /// Push a word: SP is decremented by two (wrapping) and the value
    /// stored little-endian at the new SP.
    pub fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.sp = self.sp.wrapping_sub(2);
        bus.write_word(self.sp, value);
    }

    /// Pop a word stored little-endian at SP, then advance SP by two.
    pub fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.read_word(self.sp);
        self.sp = self.sp.wrapping_add(2);
        value
    }

    /// Advance the low 7 bits of R by `steps`; bit 7 is left alone.
    pub fn inc_r(&mut self, steps: u32) {
        let low = (u32::from(self.r & 0x7F) + steps) & 0x7F;
        self.r = (self.r & 0x80) | low as u8;
    }
}
