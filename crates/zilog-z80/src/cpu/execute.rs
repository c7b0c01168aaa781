//! Instruction handlers.
//!
//! One handler per instruction shape; register choice arrives through the
//! operand selectors in the decoded entry.

use emu_core::{Bus, IoBus};
use tracing::trace;

use crate::alu::{self, AluOp};
use crate::decode::{BitOp, Condition, Instruction, Operand};
use crate::registers::Reg8;

use super::{Decoded, Z80};

/// Cost of an unprefixed HALT fetch.
const HALT_CYCLES: u32 = 4;
/// Extra cost of a taken JR cc / DJNZ.
const JR_TAKEN: u32 = 5;
/// Extra cost of a taken RET cc.
const RET_TAKEN: u32 = 6;
/// Extra cost of a taken CALL cc.
const CALL_TAKEN: u32 = 7;

/// A resolved 8-bit operand.
#[derive(Debug, Clone, Copy)]
enum Location {
    Reg(Reg8),
    Memory(u16),
    /// An immediate byte already fetched.
    Value(u8),
}

impl Z80 {
    /// Resolve an operand, fetching any displacement or immediate byte.
    fn locate<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> Location {
        match operand {
            Operand::Reg(reg) => Location::Reg(reg),
            Operand::Indirect => Location::Memory(self.regs.hl()),
            Operand::Indexed => {
                let d = self.fetch_displacement(bus);
                Location::Memory(self.regs.index().wrapping_add_signed(i16::from(d)))
            }
            Operand::Immediate => Location::Value(self.fetch_byte(bus)),
        }
    }

    fn load<B: Bus>(&mut self, bus: &mut B, location: Location) -> u8 {
        match location {
            Location::Reg(reg) => self.regs.reg8(reg),
            Location::Memory(address) => bus.read(address),
            Location::Value(value) => value,
        }
    }

    fn store<B: Bus>(&mut self, bus: &mut B, location: Location, value: u8) {
        match location {
            Location::Reg(reg) => self.regs.set_reg8(reg, value),
            Location::Memory(address) => bus.write(address, value),
            Location::Value(_) => {}
        }
    }

    fn condition(&self, condition: Condition) -> bool {
        let f = self.regs.flags;
        match condition {
            Condition::NonZero => !f.z,
            Condition::Zero => f.z,
            Condition::NoCarry => !f.c,
            Condition::Carry => f.c,
            Condition::ParityOdd => !f.pv,
            Condition::ParityEven => f.pv,
            Condition::Positive => !f.s,
            Condition::Minus => f.s,
        }
    }

    /// `None` is unconditional.
    fn holds(&self, condition: Option<Condition>) -> bool {
        condition.is_none_or(|cc| self.condition(cc))
    }

    /// Apply a CB-group operation to `value`. Returns the value to write
    /// back, or `None` for BIT.
    fn bit_op(&mut self, op: BitOp, value: u8) -> Option<u8> {
        match op {
            BitOp::Shift(shift) => Some(alu::shift(&mut self.regs.flags, shift, value)),
            BitOp::Bit(n) => {
                alu::bit(&mut self.regs.flags, n, value);
                None
            }
            BitOp::Res(n) => Some(value & !(1 << n)),
            BitOp::Set(n) => Some(value | (1 << n)),
        }
    }

    /// Execute one decoded instruction. Returns its cycle cost.
    pub(super) fn execute<B: IoBus>(&mut self, bus: &mut B, decoded: Decoded) -> u32 {
        let cycles = u32::from(decoded.entry.cycles);

        match decoded.entry.instruction {
            Instruction::Prefix(_) | Instruction::Nop => {}

            Instruction::Halt => {
                // DD 76 / FD 76: the index prefix fetch comes before the spin.
                self.charge(cycles.saturating_sub(HALT_CYCLES));
                self.halted = true;
                self.halt_until_interrupt(true);
                // HALT's own fetch is inside the cycles charged above.
                return 0;
            }

            // =================================================================
            // Loads
            // =================================================================
            Instruction::Ld8 { dst, src } => {
                let dst = self.locate(bus, dst);
                let src = self.locate(bus, src);
                let value = self.load(bus, src);
                self.store(bus, dst, value);
            }
            Instruction::Ld16Imm(rr) => {
                let value = self.fetch_word(bus);
                self.regs.set_reg16(rr, value);
            }
            Instruction::StoreWord(rr) => {
                let address = self.fetch_word(bus);
                bus.write_word(address, self.regs.reg16(rr));
            }
            Instruction::LoadWord(rr) => {
                let address = self.fetch_word(bus);
                let value = bus.read_word(address);
                self.regs.set_reg16(rr, value);
            }
            Instruction::StoreA(rr) => bus.write(self.regs.reg16(rr), self.regs.a),
            Instruction::LoadA(rr) => self.regs.a = bus.read(self.regs.reg16(rr)),
            Instruction::StoreAAbsolute => {
                let address = self.fetch_word(bus);
                bus.write(address, self.regs.a);
            }
            Instruction::LoadAAbsolute => {
                let address = self.fetch_word(bus);
                self.regs.a = bus.read(address);
            }
            Instruction::LdSp(rr) => self.regs.sp = self.regs.reg16(rr),
            Instruction::LdIA => self.regs.i = self.regs.a,
            Instruction::LdRA => self.regs.r = self.regs.a,
            Instruction::LdAI => self.load_a_special(self.regs.i),
            Instruction::LdAR => self.load_a_special(self.regs.r),

            // =================================================================
            // Arithmetic
            // =================================================================
            Instruction::Alu(op, src) => {
                let src = self.locate(bus, src);
                let value = self.load(bus, src);
                self.accumulate(op, value);
            }
            Instruction::Inc8(target) => {
                let target = self.locate(bus, target);
                let value = self.load(bus, target);
                let result = alu::inc8(&mut self.regs.flags, value);
                self.store(bus, target, result);
            }
            Instruction::Dec8(target) => {
                let target = self.locate(bus, target);
                let value = self.load(bus, target);
                let result = alu::dec8(&mut self.regs.flags, value);
                self.store(bus, target, result);
            }
            Instruction::Inc16(rr) => {
                let value = self.regs.reg16(rr).wrapping_add(1);
                self.regs.set_reg16(rr, value);
            }
            Instruction::Dec16(rr) => {
                let value = self.regs.reg16(rr).wrapping_sub(1);
                self.regs.set_reg16(rr, value);
            }
            Instruction::Add16 { dst, src } => {
                let (a, b) = (self.regs.reg16(dst), self.regs.reg16(src));
                let result = alu::add16(&mut self.regs.flags, a, b);
                self.regs.set_reg16(dst, result);
            }
            Instruction::Adc16(rr) => {
                let (a, b) = (self.regs.hl(), self.regs.reg16(rr));
                let result = alu::adc16(&mut self.regs.flags, a, b);
                self.regs.set_hl(result);
            }
            Instruction::Sbc16(rr) => {
                let (a, b) = (self.regs.hl(), self.regs.reg16(rr));
                let result = alu::sbc16(&mut self.regs.flags, a, b);
                self.regs.set_hl(result);
            }
            Instruction::RotateA(op) => {
                self.regs.a = alu::rotate_accumulator(&mut self.regs.flags, op, self.regs.a);
            }
            Instruction::Daa => self.regs.a = alu::daa(&mut self.regs.flags, self.regs.a),
            Instruction::Cpl => self.regs.a = alu::cpl(&mut self.regs.flags, self.regs.a),
            Instruction::Scf => alu::scf(&mut self.regs.flags, self.regs.a),
            Instruction::Ccf => alu::ccf(&mut self.regs.flags, self.regs.a),
            Instruction::Neg => self.regs.a = alu::neg(&mut self.regs.flags, self.regs.a),
            Instruction::Rrd => {
                let address = self.regs.hl();
                let m = bus.read(address);
                let a = self.regs.a;
                bus.write(address, (a << 4) | (m >> 4));
                self.set_a_nibble(m & 0x0F);
            }
            Instruction::Rld => {
                let address = self.regs.hl();
                let m = bus.read(address);
                let a = self.regs.a;
                bus.write(address, (m << 4) | (a & 0x0F));
                self.set_a_nibble(m >> 4);
            }

            // =================================================================
            // Exchanges
            // =================================================================
            Instruction::ExAf => self.regs.ex_af(),
            Instruction::Exx => self.regs.exx(),
            Instruction::ExDeHl => self.regs.ex_de_hl(),
            Instruction::ExSp(rr) => {
                let sp = self.regs.sp;
                let top = bus.read_word(sp);
                bus.write_word(sp, self.regs.reg16(rr));
                self.regs.set_reg16(rr, top);
            }

            // =================================================================
            // Flow
            // =================================================================
            Instruction::Djnz => {
                let d = self.fetch_displacement(bus);
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(d);
                    return cycles + JR_TAKEN;
                }
            }
            Instruction::Jr(condition) => {
                let d = self.fetch_displacement(bus);
                if self.holds(condition) {
                    self.jump_relative(d);
                    if condition.is_some() {
                        return cycles + JR_TAKEN;
                    }
                }
            }
            Instruction::Jp(condition) => {
                let target = self.fetch_word(bus);
                if self.holds(condition) {
                    self.regs.pc = target;
                }
            }
            Instruction::JpReg(rr) => self.regs.pc = self.regs.reg16(rr),
            Instruction::Call(condition) => {
                let target = self.fetch_word(bus);
                if self.holds(condition) {
                    self.call(bus, target);
                    if condition.is_some() {
                        return cycles + CALL_TAKEN;
                    }
                }
            }
            Instruction::Ret(condition) => {
                if self.holds(condition) {
                    self.regs.pc = self.regs.pop(bus);
                    if condition.is_some() {
                        return cycles + RET_TAKEN;
                    }
                }
            }
            Instruction::Retn => {
                self.regs.iff1 = self.regs.iff2;
                self.regs.pc = self.regs.pop(bus);
            }
            Instruction::Reti => self.regs.pc = self.regs.pop(bus),
            Instruction::Rst(vector) => self.call(bus, u16::from(vector)),
            Instruction::Push(rr) => {
                let value = self.regs.reg16(rr);
                self.regs.push(bus, value);
            }
            Instruction::Pop(rr) => {
                let value = self.regs.pop(bus);
                self.regs.set_reg16(rr, value);
            }

            // =================================================================
            // Interrupt control
            // =================================================================
            Instruction::Di => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }
            Instruction::Ei => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
            }
            Instruction::Im(mode) => self.regs.im = mode,

            // =================================================================
            // I/O
            // =================================================================
            Instruction::OutImm => {
                let n = self.fetch_byte(bus);
                let port = u16::from_be_bytes([self.regs.a, n]);
                bus.write_io(port, self.regs.a);
            }
            Instruction::InImm => {
                let n = self.fetch_byte(bus);
                let port = u16::from_be_bytes([self.regs.a, n]);
                self.regs.a = bus.read_io(port);
            }
            Instruction::InC(target) => {
                let value = bus.read_io(self.regs.bc());
                let f = &mut self.regs.flags;
                f.set_sz53p(value);
                f.h = false;
                f.n = false;
                if let Some(reg) = target {
                    self.regs.set_reg8(reg, value);
                }
            }
            Instruction::OutC(source) => {
                let value = source.map_or(0, |reg| self.regs.reg8(reg));
                bus.write_io(self.regs.bc(), value);
            }

            Instruction::Block(block) => return self.block(bus, block),

            // =================================================================
            // Bit operations
            // =================================================================
            Instruction::BitOp(op, target) => {
                let target = self.locate(bus, target);
                let value = self.load(bus, target);
                if let Some(result) = self.bit_op(op, value) {
                    self.store(bus, target, result);
                }
            }
            Instruction::IndexedBitOp { op, copy } => {
                let value = bus.read(decoded.address);
                if let Some(result) = self.bit_op(op, value) {
                    bus.write(decoded.address, result);
                    if let Some(reg) = copy {
                        self.regs.set_reg8(reg, result);
                    }
                }
            }

            Instruction::EdNop => {
                trace!(opcode = decoded.opcode, pc = self.regs.pc, "undefined ED opcode");
            }
        }

        cycles
    }

    fn accumulate(&mut self, op: AluOp, value: u8) {
        self.regs.a = alu::accumulate(&mut self.regs.flags, op, self.regs.a, value);
    }

    /// LD A,I / LD A,R: P/V shows IFF2.
    fn load_a_special(&mut self, value: u8) {
        self.regs.a = value;
        let f = &mut self.regs.flags;
        f.set_sz53(value);
        f.h = false;
        f.n = false;
        f.pv = self.regs.iff2;
    }

    /// Replace the low nibble of A after RRD/RLD and set flags from A.
    fn set_a_nibble(&mut self, nibble: u8) {
        self.regs.a = (self.regs.a & 0xF0) | nibble;
        let f = &mut self.regs.flags;
        f.set_sz53p(self.regs.a);
        f.h = false;
        f.n = false;
    }

    fn jump_relative(&mut self, d: i8) {
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(d));
    }

    fn call<B: Bus>(&mut self, bus: &mut B, target: u16) {
        let return_address = self.regs.pc;
        self.regs.push(bus, return_address);
        self.regs.pc = target;
    }
}
