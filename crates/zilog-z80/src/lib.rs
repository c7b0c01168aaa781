//! Instruction-level Zilog Z80 CPU emulator.
//!
//! Each call to [`Cpu::step`](emu_core::Cpu::step) runs one instruction
//! and returns its cost in T-states. A signed cycle budget paces the
//! periodic maskable interrupt (one per 1/50 s of processor clock).

mod alu;
mod cpu;
mod decode;
mod flags;
mod registers;

pub use alu::{AluOp, ShiftOp};
pub use cpu::Z80;
pub use decode::{
    BITS, BitOp, Block, BlockKind, Condition, DecodeContext, EXTENDED, Entry, INDEXED,
    INDEXED_BITS, Instruction, MAIN, Operand, Prefix,
};
pub use flags::{CF, Flags, HF, NF, PARITY, PF, SF, XF, YF, ZF, parity};
pub use registers::{IndexReg, InterruptMode, Reg8, Reg16, RegisterFile};
