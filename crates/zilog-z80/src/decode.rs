//! Opcode tables and the prefix state machine.
//!
//! Each table maps one opcode byte to an [`Instruction`] plus its base
//! cycle cost. Register choice is carried by operand selectors inside the
//! instruction, so one handler serves every register variant. The tables
//! are computed at compile time from the x/y/z/p/q fields of the opcode.

use crate::alu::{AluOp, ShiftOp};
use crate::registers::{IndexReg, InterruptMode, Reg8, Reg16};

/// Where an 8-bit operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg8),
    /// `(HL)`
    Indirect,
    /// `(IX+d)` / `(IY+d)`; the displacement byte follows the opcode.
    Indexed,
    /// `n`, the byte after the opcode.
    Immediate,
}

impl Operand {
    /// Operand for a 3-bit register field where 6 means `(HL)`.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match Reg8::from_code(code) {
            Some(reg) => Operand::Reg(reg),
            None => Operand::Indirect,
        }
    }

    const fn is_memory(self) -> bool {
        matches!(self, Operand::Indirect | Operand::Indexed)
    }
}

/// Branch condition (`cc` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NonZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Positive,
    Minus,
}

impl Condition {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & 7 {
            0 => Condition::NonZero,
            1 => Condition::Zero,
            2 => Condition::NoCarry,
            3 => Condition::Carry,
            4 => Condition::ParityOdd,
            5 => Condition::ParityEven,
            6 => Condition::Positive,
            _ => Condition::Minus,
        }
    }
}

/// CB-group operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    Shift(ShiftOp),
    Bit(u8),
    Res(u8),
    Set(u8),
}

impl BitOp {
    const fn from_opcode(opcode: u8) -> Self {
        let y = (opcode >> 3) & 7;
        match opcode >> 6 {
            0 => BitOp::Shift(ShiftOp::from_code(y)),
            1 => BitOp::Bit(y),
            2 => BitOp::Res(y),
            _ => BitOp::Set(y),
        }
    }
}

/// Single-step primitive behind a block instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Load,
    Compare,
    In,
    Out,
}

/// A block instruction: LDI/LDIR, CPD/CPDR, INI/INIR, OUTD/OTDR, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub increment: bool,
    pub repeat: bool,
}

/// A prefix byte and the context it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// 0xCB
    Bits,
    /// 0xED
    Extended,
    /// 0xDD / 0xFD
    Index(IndexReg),
}

/// A decoded instruction with its operand selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Prefix(Prefix),
    Nop,
    Halt,

    // Loads
    Ld8 { dst: Operand, src: Operand },
    Ld16Imm(Reg16),
    /// LD (nn),rr
    StoreWord(Reg16),
    /// LD rr,(nn)
    LoadWord(Reg16),
    /// LD (rr),A for BC/DE.
    StoreA(Reg16),
    /// LD A,(rr) for BC/DE.
    LoadA(Reg16),
    /// LD (nn),A
    StoreAAbsolute,
    /// LD A,(nn)
    LoadAAbsolute,
    /// LD SP,HL / LD SP,IX
    LdSp(Reg16),
    LdIA,
    LdRA,
    LdAI,
    LdAR,

    // Arithmetic
    Alu(AluOp, Operand),
    Inc8(Operand),
    Dec8(Operand),
    Inc16(Reg16),
    Dec16(Reg16),
    Add16 { dst: Reg16, src: Reg16 },
    Adc16(Reg16),
    Sbc16(Reg16),
    RotateA(ShiftOp),
    Daa,
    Cpl,
    Scf,
    Ccf,
    Neg,
    Rrd,
    Rld,

    // Exchanges
    ExAf,
    Exx,
    ExDeHl,
    /// EX (SP),HL / EX (SP),IX
    ExSp(Reg16),

    // Flow
    Djnz,
    Jr(Option<Condition>),
    Jp(Option<Condition>),
    /// JP (HL) / JP (IX)
    JpReg(Reg16),
    Call(Option<Condition>),
    Ret(Option<Condition>),
    Retn,
    Reti,
    Rst(u8),
    Push(Reg16),
    Pop(Reg16),

    // Interrupts
    Di,
    Ei,
    Im(InterruptMode),

    // I/O
    /// OUT (n),A
    OutImm,
    /// IN A,(n)
    InImm,
    /// IN r,(C); `None` only sets flags.
    InC(Option<Reg8>),
    /// OUT (C),r; `None` outputs zero.
    OutC(Option<Reg8>),

    Block(Block),

    /// CB-group operation on a register or `(HL)`.
    BitOp(BitOp, Operand),
    /// DDCB/FDCB operation on `(IX+d)`. Everything but BIT also copies the
    /// result into `copy`.
    IndexedBitOp { op: BitOp, copy: Option<Reg8> },

    /// Undefined ED opcode.
    EdNop,
}

/// One table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub instruction: Instruction,
    /// Cost in T-states, prefix bytes included. Conditional branches add
    /// their taken penalty at execution time.
    pub cycles: u8,
}

impl Entry {
    const fn new(instruction: Instruction, cycles: u8) -> Self {
        Self { instruction, cycles }
    }
}

/// Decode context: which table the next opcode byte is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeContext {
    Main,
    Bits,
    Extended,
    Indexed(IndexReg),
    /// Displacement byte first, then the opcode byte.
    IndexedBits(IndexReg),
}

impl DecodeContext {
    /// The context a prefix byte moves to from this one.
    ///
    /// DD/FD followed by ED drops the index prefix. The decoder never asks
    /// for DD/FD after DD/FD: that first prefix ends as a NOP.
    #[must_use]
    pub const fn after_prefix(self, prefix: Prefix) -> Self {
        match (self, prefix) {
            (DecodeContext::Indexed(index), Prefix::Bits) => DecodeContext::IndexedBits(index),
            (_, Prefix::Bits) => DecodeContext::Bits,
            (_, Prefix::Extended) => DecodeContext::Extended,
            (_, Prefix::Index(index)) => DecodeContext::Indexed(index),
        }
    }

    /// The table that resolves the final opcode byte in this context.
    #[must_use]
    pub fn table(self) -> &'static [Entry; 256] {
        match self {
            DecodeContext::Main => &MAIN,
            DecodeContext::Bits => &BITS,
            DecodeContext::Extended => &EXTENDED,
            DecodeContext::Indexed(_) => &INDEXED,
            DecodeContext::IndexedBits(_) => &INDEXED_BITS,
        }
    }
}

macro_rules! build_table {
    ($decode:ident) => {{
        let mut table = [Entry::new(Instruction::Nop, 4); 256];
        let mut i = 0;
        while i < 256 {
            table[i] = $decode(i as u8);
            i += 1;
        }
        table
    }};
}

/// Unprefixed opcodes.
pub static MAIN: [Entry; 256] = build_table!(main_entry);
/// CB-prefixed opcodes.
pub static BITS: [Entry; 256] = build_table!(bits_entry);
/// ED-prefixed opcodes.
pub static EXTENDED: [Entry; 256] = build_table!(extended_entry);
/// DD/FD-prefixed opcodes; the active index register picks IX or IY.
pub static INDEXED: [Entry; 256] = build_table!(indexed_entry);
/// DDCB/FDCB opcodes, keyed by the byte after the displacement.
pub static INDEXED_BITS: [Entry; 256] = build_table!(indexed_bits_entry);

const fn main_entry(opcode: u8) -> Entry {
    use Instruction as I;

    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1 == 1;

    match x {
        0 => match z {
            0 => match y {
                0 => Entry::new(I::Nop, 4),
                1 => Entry::new(I::ExAf, 4),
                2 => Entry::new(I::Djnz, 8),
                3 => Entry::new(I::Jr(None), 12),
                _ => Entry::new(I::Jr(Some(Condition::from_code(y - 4))), 7),
            },
            1 if q => Entry::new(
                I::Add16 { dst: Reg16::HL, src: Reg16::from_code_sp(p) },
                11,
            ),
            1 => Entry::new(I::Ld16Imm(Reg16::from_code_sp(p)), 10),
            2 => match (p, q) {
                (0, false) => Entry::new(I::StoreA(Reg16::BC), 7),
                (1, false) => Entry::new(I::StoreA(Reg16::DE), 7),
                (2, false) => Entry::new(I::StoreWord(Reg16::HL), 16),
                (_, false) => Entry::new(I::StoreAAbsolute, 13),
                (0, true) => Entry::new(I::LoadA(Reg16::BC), 7),
                (1, true) => Entry::new(I::LoadA(Reg16::DE), 7),
                (2, true) => Entry::new(I::LoadWord(Reg16::HL), 16),
                (_, true) => Entry::new(I::LoadAAbsolute, 13),
            },
            3 if q => Entry::new(I::Dec16(Reg16::from_code_sp(p)), 6),
            3 => Entry::new(I::Inc16(Reg16::from_code_sp(p)), 6),
            4 | 5 => {
                let target = Operand::from_code(y);
                let cycles = if target.is_memory() { 11 } else { 4 };
                if z == 4 {
                    Entry::new(I::Inc8(target), cycles)
                } else {
                    Entry::new(I::Dec8(target), cycles)
                }
            }
            6 => {
                let dst = Operand::from_code(y);
                let cycles = if dst.is_memory() { 10 } else { 7 };
                Entry::new(I::Ld8 { dst, src: Operand::Immediate }, cycles)
            }
            _ => match y {
                0..=3 => Entry::new(I::RotateA(ShiftOp::from_code(y)), 4),
                4 => Entry::new(I::Daa, 4),
                5 => Entry::new(I::Cpl, 4),
                6 => Entry::new(I::Scf, 4),
                _ => Entry::new(I::Ccf, 4),
            },
        },
        1 => {
            if y == 6 && z == 6 {
                return Entry::new(I::Halt, 4);
            }
            let dst = Operand::from_code(y);
            let src = Operand::from_code(z);
            let cycles = if dst.is_memory() || src.is_memory() { 7 } else { 4 };
            Entry::new(I::Ld8 { dst, src }, cycles)
        }
        2 => {
            let src = Operand::from_code(z);
            let cycles = if src.is_memory() { 7 } else { 4 };
            Entry::new(I::Alu(AluOp::from_code(y), src), cycles)
        }
        _ => match z {
            0 => Entry::new(I::Ret(Some(Condition::from_code(y))), 5),
            1 => match (q, p) {
                (false, _) => Entry::new(I::Pop(Reg16::from_code_af(p)), 10),
                (true, 0) => Entry::new(I::Ret(None), 10),
                (true, 1) => Entry::new(I::Exx, 4),
                (true, 2) => Entry::new(I::JpReg(Reg16::HL), 4),
                (true, _) => Entry::new(I::LdSp(Reg16::HL), 6),
            },
            2 => Entry::new(I::Jp(Some(Condition::from_code(y))), 10),
            3 => match y {
                0 => Entry::new(I::Jp(None), 10),
                1 => Entry::new(I::Prefix(Prefix::Bits), 0),
                2 => Entry::new(I::OutImm, 11),
                3 => Entry::new(I::InImm, 11),
                4 => Entry::new(I::ExSp(Reg16::HL), 19),
                5 => Entry::new(I::ExDeHl, 4),
                6 => Entry::new(I::Di, 4),
                _ => Entry::new(I::Ei, 4),
            },
            4 => Entry::new(I::Call(Some(Condition::from_code(y))), 10),
            5 => match (q, p) {
                (false, _) => Entry::new(I::Push(Reg16::from_code_af(p)), 11),
                (true, 0) => Entry::new(I::Call(None), 17),
                (true, 1) => Entry::new(I::Prefix(Prefix::Index(IndexReg::IX)), 0),
                (true, 2) => Entry::new(I::Prefix(Prefix::Extended), 0),
                (true, _) => Entry::new(I::Prefix(Prefix::Index(IndexReg::IY)), 0),
            },
            6 => Entry::new(I::Alu(AluOp::from_code(y), Operand::Immediate), 7),
            _ => Entry::new(I::Rst(y * 8), 11),
        },
    }
}

const fn bits_entry(opcode: u8) -> Entry {
    let op = BitOp::from_opcode(opcode);
    let target = Operand::from_code(opcode);
    let cycles = match (op, target) {
        (_, Operand::Reg(_)) => 8,
        (BitOp::Bit(_), _) => 12,
        _ => 15,
    };
    Entry::new(Instruction::BitOp(op, target), cycles)
}

const fn extended_entry(opcode: u8) -> Entry {
    use Instruction as I;

    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1 == 1;

    match x {
        1 => match z {
            0 => Entry::new(I::InC(Reg8::from_code(y)), 12),
            1 => Entry::new(I::OutC(Reg8::from_code(y)), 12),
            2 if q => Entry::new(I::Adc16(Reg16::from_code_sp(p)), 15),
            2 => Entry::new(I::Sbc16(Reg16::from_code_sp(p)), 15),
            3 if q => Entry::new(I::LoadWord(Reg16::from_code_sp(p)), 20),
            3 => Entry::new(I::StoreWord(Reg16::from_code_sp(p)), 20),
            4 => Entry::new(I::Neg, 8),
            5 if y == 1 => Entry::new(I::Reti, 14),
            5 => Entry::new(I::Retn, 14),
            6 => {
                let mode = match y & 3 {
                    0 | 1 => InterruptMode::Mode0,
                    2 => InterruptMode::Mode1,
                    _ => InterruptMode::Mode2,
                };
                Entry::new(I::Im(mode), 8)
            }
            _ => match y {
                0 => Entry::new(I::LdIA, 9),
                1 => Entry::new(I::LdRA, 9),
                2 => Entry::new(I::LdAI, 9),
                3 => Entry::new(I::LdAR, 9),
                4 => Entry::new(I::Rrd, 18),
                5 => Entry::new(I::Rld, 18),
                _ => Entry::new(I::EdNop, 8),
            },
        },
        2 if y >= 4 && z <= 3 => {
            let kind = match z {
                0 => BlockKind::Load,
                1 => BlockKind::Compare,
                2 => BlockKind::In,
                _ => BlockKind::Out,
            };
            let block = Block {
                kind,
                increment: y & 1 == 0,
                repeat: y >= 6,
            };
            Entry::new(I::Block(block), 16)
        }
        _ => Entry::new(I::EdNop, 8),
    }
}

/// DD/FD opcodes are the main opcodes with HL, H and L swapped for the
/// index register, and `(HL)` swapped for `(IX+d)`. Opcodes that touch
/// none of those run unchanged, four cycles later.
const fn indexed_entry(opcode: u8) -> Entry {
    use Instruction as I;

    let main = main_entry(opcode);
    let slow = main.cycles + 4;

    match main.instruction {
        I::Prefix(_) => main,
        I::Ld8 { dst, src } => {
            if dst.is_memory() || src.is_memory() {
                // LD H,(IX+d) and LD (IX+d),L use the real H and L.
                Entry::new(
                    I::Ld8 { dst: to_indexed_memory(dst), src: to_indexed_memory(src) },
                    19,
                )
            } else {
                Entry::new(
                    I::Ld8 { dst: to_index_half(dst), src: to_index_half(src) },
                    slow,
                )
            }
        }
        I::Alu(op, Operand::Indirect) => Entry::new(I::Alu(op, Operand::Indexed), 19),
        I::Alu(op, src) => Entry::new(I::Alu(op, to_index_half(src)), slow),
        I::Inc8(Operand::Indirect) => Entry::new(I::Inc8(Operand::Indexed), 23),
        I::Inc8(target) => Entry::new(I::Inc8(to_index_half(target)), slow),
        I::Dec8(Operand::Indirect) => Entry::new(I::Dec8(Operand::Indexed), 23),
        I::Dec8(target) => Entry::new(I::Dec8(to_index_half(target)), slow),
        I::Ld16Imm(rr) => Entry::new(I::Ld16Imm(rr.indexed()), slow),
        I::StoreWord(rr) => Entry::new(I::StoreWord(rr.indexed()), slow),
        I::LoadWord(rr) => Entry::new(I::LoadWord(rr.indexed()), slow),
        I::Inc16(rr) => Entry::new(I::Inc16(rr.indexed()), slow),
        I::Dec16(rr) => Entry::new(I::Dec16(rr.indexed()), slow),
        I::Add16 { dst, src } => Entry::new(
            I::Add16 { dst: dst.indexed(), src: src.indexed() },
            slow,
        ),
        I::Push(rr) => Entry::new(I::Push(rr.indexed()), slow),
        I::Pop(rr) => Entry::new(I::Pop(rr.indexed()), slow),
        I::JpReg(rr) => Entry::new(I::JpReg(rr.indexed()), slow),
        I::LdSp(rr) => Entry::new(I::LdSp(rr.indexed()), slow),
        I::ExSp(rr) => Entry::new(I::ExSp(rr.indexed()), slow),
        other => Entry::new(other, slow),
    }
}

const fn to_indexed_memory(operand: Operand) -> Operand {
    match operand {
        Operand::Indirect => Operand::Indexed,
        other => other,
    }
}

const fn to_index_half(operand: Operand) -> Operand {
    match operand {
        Operand::Reg(reg) => Operand::Reg(reg.indexed()),
        other => other,
    }
}

const fn indexed_bits_entry(opcode: u8) -> Entry {
    let op = BitOp::from_opcode(opcode);
    match op {
        BitOp::Bit(_) => Entry::new(Instruction::IndexedBitOp { op, copy: None }, 20),
        _ => Entry::new(
            Instruction::IndexedBitOp { op, copy: Reg8::from_code(opcode) },
            23,
        ),
    }
}
