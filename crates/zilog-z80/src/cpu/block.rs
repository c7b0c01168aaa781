//! Block transfer, compare and I/O instructions.
//!
//! The repeating forms loop here rather than re-executing the opcode.
//! Every iteration but the last costs 21 cycles, advances R by two (the
//! re-fetched ED and opcode) and gives a pending interrupt its chance to
//! run. The last iteration is the instruction's own 16.

use emu_core::IoBus;

use crate::alu;
use crate::decode::{Block, BlockKind};

use super::Z80;

/// Cost of a block instruction's final (or only) iteration.
const BLOCK_CYCLES: u32 = 16;
/// Cost of each iteration that repeats.
const REPEAT_CYCLES: u32 = 21;

impl Z80 {
    pub(super) fn block<B: IoBus>(&mut self, bus: &mut B, block: Block) -> u32 {
        loop {
            let more = match block.kind {
                BlockKind::Load => self.block_load(bus, block.increment),
                BlockKind::Compare => self.block_compare(bus, block.increment),
                BlockKind::In => self.block_in(bus, block.increment),
                BlockKind::Out => self.block_out(bus, block.increment),
            };
            if !block.repeat || !more {
                break;
            }
            self.regs.inc_r(2);
            self.charge(REPEAT_CYCLES);
            self.check_interrupt(bus);
        }

        if block.repeat {
            self.finish_repeat(block);
        }
        BLOCK_CYCLES
    }

    /// Step HL (and DE) forward or back.
    fn step_pointer(value: u16, increment: bool) -> u16 {
        if increment {
            value.wrapping_add(1)
        } else {
            value.wrapping_sub(1)
        }
    }

    /// LDI/LDD. Returns true while BC is non-zero.
    fn block_load<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let value = bus.read(self.regs.hl());
        bus.write(self.regs.de(), value);
        self.regs.set_hl(Self::step_pointer(self.regs.hl(), increment));
        self.regs.set_de(Self::step_pointer(self.regs.de(), increment));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let f = &mut self.regs.flags;
        f.pv = bc != 0;
        f.h = false;
        f.n = false;
        bc != 0
    }

    /// CPI/CPD. Returns true while BC is non-zero and no match was found.
    fn block_compare<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let value = bus.read(self.regs.hl());
        let carry = self.regs.flags.c;
        alu::cp8(&mut self.regs.flags, self.regs.a, value);
        self.regs.set_hl(Self::step_pointer(self.regs.hl(), increment));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let f = &mut self.regs.flags;
        f.c = carry;
        f.n = true;
        f.pv = bc != 0;
        bc != 0 && !f.z
    }

    /// INI/IND. Returns true while B is non-zero.
    fn block_in<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let value = bus.read_io(self.regs.bc());
        bus.write(self.regs.hl(), value);
        self.regs.set_hl(Self::step_pointer(self.regs.hl(), increment));
        self.regs.b = self.regs.b.wrapping_sub(1);

        let f = &mut self.regs.flags;
        f.n = !increment;
        f.z = self.regs.b == 0;
        self.regs.b != 0
    }

    /// OUTI/OUTD. Returns true while B is non-zero.
    fn block_out<B: IoBus>(&mut self, bus: &mut B, increment: bool) -> bool {
        let value = bus.read(self.regs.hl());
        bus.write_io(self.regs.bc(), value);
        self.regs.set_hl(Self::step_pointer(self.regs.hl(), increment));
        self.regs.b = self.regs.b.wrapping_sub(1);

        let f = &mut self.regs.flags;
        f.n = !increment;
        f.z = self.regs.b == 0;
        self.regs.b != 0
    }

    /// Flags left behind once a repeating form stops.
    fn finish_repeat(&mut self, block: Block) {
        let f = &mut self.regs.flags;
        match block.kind {
            BlockKind::Load => {
                f.pv = false;
                f.h = false;
                f.n = false;
            }
            // P/V already reflects BC from the last iteration.
            BlockKind::Compare => f.n = true,
            BlockKind::In => {
                f.z = true;
                f.c = false;
                f.n = false;
            }
            BlockKind::Out => {
                f.z = true;
                f.n = false;
            }
        }
    }
}
