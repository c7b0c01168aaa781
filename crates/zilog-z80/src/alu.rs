//! Arithmetic and logic primitives.
//!
//! Every function is pure apart from the flags it is handed: it returns
//! the numeric result and writes the flag outcome into `f`.

#![allow(clippy::verbose_bit_mask)] // Nibble masks read better spelled out.

use crate::flags::{Flags, parity};

/// Shift/rotate selector for the CB group and the accumulator rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented shift left that sets bit 0 (a.k.a. SLL).
    Sls,
    Srl,
}

impl ShiftOp {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & 7 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Sls,
            _ => ShiftOp::Srl,
        }
    }
}

/// 8-bit accumulator operation selector (the `ALU[y]` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & 7 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Apply `op` to the accumulator and an operand. Returns the new
/// accumulator (unchanged for CP).
pub fn accumulate(f: &mut Flags, op: AluOp, a: u8, value: u8) -> u8 {
    match op {
        AluOp::Add => add8(f, a, value, false),
        AluOp::Adc => {
            let carry = f.c;
            add8(f, a, value, carry)
        }
        AluOp::Sub => sub8(f, a, value, false),
        AluOp::Sbc => {
            let carry = f.c;
            sub8(f, a, value, carry)
        }
        AluOp::And => and8(f, a, value),
        AluOp::Xor => xor8(f, a, value),
        AluOp::Or => or8(f, a, value),
        AluOp::Cp => {
            cp8(f, a, value);
            a
        }
    }
}

// =========================================================================
// 8-bit arithmetic
// =========================================================================

pub fn add8(f: &mut Flags, a: u8, b: u8, carry: bool) -> u8 {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let result = wide as u8;

    f.set_sz53(result);
    f.h = (a & 0x0F) + (b & 0x0F) + c > 0x0F;
    f.pv = (a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0;
    f.n = false;
    f.c = wide > 0xFF;
    result
}

pub fn sub8(f: &mut Flags, a: u8, b: u8, borrow: bool) -> u8 {
    let c = u8::from(borrow);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    f.set_sz53(result);
    f.h = (a & 0x0F) < (b & 0x0F) + c;
    f.pv = (a ^ b) & 0x80 != 0 && (b ^ result) & 0x80 == 0;
    f.n = true;
    f.c = u16::from(a) < u16::from(b) + u16::from(c);
    result
}

/// Compare: subtract for flags only.
pub fn cp8(f: &mut Flags, a: u8, b: u8) {
    sub8(f, a, b, false);
}

/// INC r. Carry is preserved.
pub fn inc8(f: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    f.set_sz53(result);
    f.h = result & 0x0F == 0;
    f.pv = result == 0x80;
    f.n = false;
    result
}

/// DEC r. Carry is preserved.
pub fn dec8(f: &mut Flags, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    f.set_sz53(result);
    f.h = value & 0x0F == 0;
    f.pv = result == 0x7F;
    f.n = true;
    result
}

/// NEG: A = 0 - A.
pub fn neg(f: &mut Flags, a: u8) -> u8 {
    let result = sub8(f, 0, a, false);
    f.pv = a == 0x80;
    f.c = a != 0;
    result
}

// =========================================================================
// Logic
// =========================================================================

pub fn and8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a & b;
    f.set_sz53p(result);
    f.h = true;
    f.n = false;
    f.c = false;
    result
}

pub fn or8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a | b;
    f.set_sz53p(result);
    f.h = false;
    f.n = false;
    f.c = false;
    result
}

pub fn xor8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let result = a ^ b;
    f.set_sz53p(result);
    f.h = false;
    f.n = false;
    f.c = false;
    result
}

pub fn cpl(f: &mut Flags, a: u8) -> u8 {
    let result = !a;
    f.set_xy(result);
    f.h = true;
    f.n = true;
    result
}

pub fn scf(f: &mut Flags, a: u8) {
    f.set_xy(a);
    f.h = false;
    f.n = false;
    f.c = true;
}

/// CCF: half-carry takes the old carry.
pub fn ccf(f: &mut Flags, a: u8) {
    f.set_xy(a);
    f.h = f.c;
    f.n = false;
    f.c = !f.c;
}

/// Decimal-adjust the accumulator after a BCD add or subtract.
pub fn daa(f: &mut Flags, a: u8) -> u8 {
    let mut correction = 0u8;
    let mut carry = f.c;

    if f.h || a & 0x0F > 0x09 {
        correction |= 0x06;
    }
    if carry || a > 0x9F || (a > 0x8F && a & 0x0F > 0x09) {
        correction |= 0x60;
    }
    if a > 0x99 {
        carry = true;
    }

    let result = if f.n {
        sub8(f, a, correction, false)
    } else {
        add8(f, a, correction, false)
    };
    f.c = carry;
    f.pv = parity(result);
    result
}

// =========================================================================
// Shifts, rotates and bit tests
// =========================================================================

/// CB-group shift or rotate with full flag update.
pub fn shift(f: &mut Flags, op: ShiftOp, value: u8) -> u8 {
    let (result, carry) = shift_raw(op, value, f.c);
    f.set_sz53p(result);
    f.h = false;
    f.n = false;
    f.c = carry;
    result
}

/// RLCA/RRCA/RLA/RRA: S, Z and P/V are left alone.
pub fn rotate_accumulator(f: &mut Flags, op: ShiftOp, a: u8) -> u8 {
    let (result, carry) = shift_raw(op, a, f.c);
    f.set_xy(result);
    f.h = false;
    f.n = false;
    f.c = carry;
    result
}

const fn shift_raw(op: ShiftOp, value: u8, carry_in: bool) -> (u8, bool) {
    let top = value & 0x80 != 0;
    let bottom = value & 0x01 != 0;
    match op {
        ShiftOp::Rlc => (value.rotate_left(1), top),
        ShiftOp::Rrc => (value.rotate_right(1), bottom),
        ShiftOp::Rl => ((value << 1) | carry_in as u8, top),
        ShiftOp::Rr => ((value >> 1) | ((carry_in as u8) << 7), bottom),
        ShiftOp::Sla => (value << 1, top),
        ShiftOp::Sra => ((value >> 1) | (value & 0x80), bottom),
        ShiftOp::Sls => ((value << 1) | 0x01, top),
        ShiftOp::Srl => (value >> 1, bottom),
    }
}

/// BIT n. Bits 3/5 come from the tested value; carry is untouched.
pub fn bit(f: &mut Flags, n: u8, value: u8) {
    let set = value & (1 << n) != 0;
    f.s = n == 7 && set;
    f.z = !set;
    f.pv = !set;
    f.set_xy(value);
    f.h = true;
    f.n = false;
}

// =========================================================================
// 16-bit arithmetic
// =========================================================================

/// ADD HL,rr: only H, N, C and bits 3/5 (from the high byte) change.
pub fn add16(f: &mut Flags, a: u16, b: u16) -> u16 {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;
    f.set_xy((result >> 8) as u8);
    f.h = (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF;
    f.n = false;
    f.c = wide > 0xFFFF;
    result
}

pub fn adc16(f: &mut Flags, a: u16, b: u16) -> u16 {
    let c = u16::from(f.c);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let result = wide as u16;
    f.s = result & 0x8000 != 0;
    f.z = result == 0;
    f.set_xy((result >> 8) as u8);
    f.h = (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF;
    f.pv = (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0;
    f.n = false;
    f.c = wide > 0xFFFF;
    result
}

pub fn sbc16(f: &mut Flags, a: u16, b: u16) -> u16 {
    let c = u16::from(f.c);
    let result = a.wrapping_sub(b).wrapping_sub(c);
    f.s = result & 0x8000 != 0;
    f.z = result == 0;
    f.set_xy((result >> 8) as u8);
    f.h = (a & 0x0FFF) < (b & 0x0FFF) + c;
    f.pv = (a ^ b) & 0x8000 != 0 && (b ^ result) & 0x8000 == 0;
    f.n = true;
    f.c = u32::from(a) < u32::from(b) + u32::from(c);
    result
}
