//! Z80 CPU: fetch loop, cycle budget and interrupt servicing.

use emu_core::{Bus, Cpu, IoBus, MasterClock, Observable, Ticks, Value};
use tracing::trace;

use crate::decode::{DecodeContext, Entry, INDEXED_BITS, Instruction, MAIN};
use crate::registers::{InterruptMode, RegisterFile};

mod block;
mod execute;

/// Cost of accepting a mode 0/1 interrupt.
const IM1_CYCLES: u32 = 13;
/// Cost of accepting a mode 2 interrupt.
const IM2_CYCLES: u32 = 19;
/// Cost of accepting a non-maskable interrupt.
const NMI_CYCLES: u32 = 11;
/// HALT burns cycles in NOP-sized steps.
const HALT_STEP: i64 = 4;

/// An instruction ready to execute.
#[derive(Debug, Clone, Copy)]
struct Decoded {
    entry: Entry,
    /// Final opcode byte (for logging).
    opcode: u8,
    /// Effective address for DDCB/FDCB instructions.
    address: u16,
    /// Cycles spent on prefixes that were overridden by a later one.
    dropped_prefixes: u32,
}

/// Z80 CPU.
///
/// The CPU does not own the bus; each [`Cpu::step`] borrows it for the
/// duration of one instruction.
///
/// Time is tracked as a signed budget that counts up from minus one
/// frame. Once it is non-negative the next step services an interrupt
/// opportunity and winds the budget back by a frame.
pub struct Z80 {
    /// Architectural state.
    pub regs: RegisterFile,

    /// Cycles in one frame (one interrupt period).
    cycles_per_frame: i64,
    /// Cycles until the next interrupt opportunity, negated.
    budget: i64,
    /// Low byte of the mode 2 vector table address.
    vector_byte: u8,
    /// Waiting in HALT for an interrupt.
    halted: bool,
    /// Interrupt opportunities so far.
    frames: u64,
    /// Total cycles elapsed.
    total_cycles: Ticks,
}

impl Z80 {
    /// Create a CPU in the power-on state.
    #[must_use]
    pub fn new(clock: MasterClock) -> Self {
        let cycles_per_frame = clock.cycles_per_interrupt() as i64;
        Self {
            regs: RegisterFile::new(),
            cycles_per_frame,
            budget: -cycles_per_frame,
            vector_byte: 0xFF,
            halted: false,
            frames: 0,
            total_cycles: Ticks::ZERO,
        }
    }

    /// Cycles between interrupt opportunities.
    #[must_use]
    pub fn cycles_per_frame(&self) -> u64 {
        self.cycles_per_frame as u64
    }

    /// Current cycle budget. Negative until the next interrupt is due.
    #[must_use]
    pub fn budget(&self) -> i64 {
        self.budget
    }

    /// Overwrite the cycle budget.
    #[cfg(feature = "test-utils")]
    pub fn set_budget(&mut self, budget: i64) {
        self.budget = budget;
    }

    /// Interrupt opportunities serviced so far (frames run).
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    /// Byte placed on the data bus during a mode 2 acknowledge.
    pub fn set_interrupt_vector_byte(&mut self, value: u8) {
        self.vector_byte = value;
    }

    #[must_use]
    pub fn interrupt_vector_byte(&self) -> u8 {
        self.vector_byte
    }

    /// Run until the next interrupt opportunity has been serviced.
    ///
    /// Returns the cycles that elapsed.
    pub fn run_frame<B: IoBus>(&mut self, bus: &mut B) -> u64 {
        let start = self.total_cycles;
        let frame = self.frames;
        while self.frames == frame {
            self.step(bus);
        }
        self.total_cycles.since(start)
    }

    // =========================================================================
    // Timing
    // =========================================================================

    /// Account for cycles spent.
    fn charge(&mut self, cycles: u32) {
        self.budget += i64::from(cycles);
        self.total_cycles += cycles;
    }

    /// Service an interrupt opportunity if one is due.
    ///
    /// Runs before every fetch and between iterations of block-repeat
    /// instructions.
    fn check_interrupt<B: IoBus>(&mut self, bus: &mut B) {
        if self.budget >= 0 {
            self.frames += 1;
            self.budget -= self.cycles_per_frame;
            self.accept_interrupt(bus);
        }
    }

    /// Push PC and vector according to the interrupt mode. Costs nothing
    /// when IFF1 is clear.
    fn accept_interrupt<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        if !self.regs.iff1 {
            return 0;
        }

        self.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        let return_address = self.regs.pc;
        self.regs.push(bus, return_address);

        let cycles = match self.regs.im {
            InterruptMode::Mode0 | InterruptMode::Mode1 => {
                self.regs.pc = 0x0038;
                IM1_CYCLES
            }
            InterruptMode::Mode2 => {
                let table = u16::from_be_bytes([self.regs.i, self.vector_byte]);
                self.regs.pc = bus.read_word(table);
                IM2_CYCLES
            }
        };
        trace!(
            mode = ?self.regs.im,
            from = return_address,
            to = self.regs.pc,
            "interrupt accepted"
        );
        self.charge(cycles);
        cycles
    }

    /// Spin in HALT up to the next interrupt opportunity.
    ///
    /// Each 4-cycle step is an opcode fetch that refreshes memory, so R
    /// advances once per step. `fetched` says whether the HALT opcode
    /// fetch already counted one of them.
    fn halt_until_interrupt(&mut self, fetched: bool) {
        let steps = if self.budget < 0 {
            (-self.budget - 1) / HALT_STEP + 1
        } else {
            1
        };
        self.charge((steps * HALT_STEP) as u32);
        let refreshes = if fetched { steps - 1 } else { steps };
        self.regs.inc_r(refreshes as u32);
    }

    // =========================================================================
    // Fetch and decode
    // =========================================================================

    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = bus.read_word(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(2);
        value
    }

    fn fetch_displacement<B: Bus>(&mut self, bus: &mut B) -> i8 {
        let value = bus.read_signed(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Walk the prefix chain to a final table entry.
    fn decode<B: Bus>(&mut self, bus: &mut B) -> Decoded {
        let mut context = DecodeContext::Main;
        let mut dropped_prefixes = 0;

        loop {
            if let DecodeContext::IndexedBits(_) = context {
                // DDCB d op: displacement before the opcode, neither is an
                // M1 fetch.
                let displacement = self.fetch_displacement(bus);
                let opcode = self.fetch_byte(bus);
                return Decoded {
                    entry: INDEXED_BITS[opcode as usize],
                    opcode,
                    address: self.regs.index().wrapping_add_signed(i16::from(displacement)),
                    dropped_prefixes,
                };
            }

            if let DecodeContext::Indexed(_) = context {
                // DD/FD straight after DD/FD: the first prefix runs alone as
                // a NOP and the next one starts a fresh instruction.
                let next = bus.read(self.regs.pc);
                if matches!(next, 0xDD | 0xFD) {
                    return Decoded {
                        entry: MAIN[0x00],
                        opcode: next,
                        address: 0,
                        dropped_prefixes,
                    };
                }
            }

            let opcode = self.fetch_byte(bus);
            self.regs.inc_r(1);
            let entry = context.table()[opcode as usize];

            let Instruction::Prefix(prefix) = entry.instruction else {
                return Decoded { entry, opcode, address: 0, dropped_prefixes };
            };

            let next = context.after_prefix(prefix);
            if matches!(context, DecodeContext::Indexed(_))
                && !matches!(next, DecodeContext::IndexedBits(_))
            {
                dropped_prefixes += 4;
            }
            match next {
                DecodeContext::Indexed(index) | DecodeContext::IndexedBits(index) => {
                    self.regs.select_index(index);
                }
                _ => self.regs.deselect_index(),
            }
            context = next;
        }
    }

    fn execute_next<B: IoBus>(&mut self, bus: &mut B) {
        let decoded = self.decode(bus);
        let cycles = self.execute(bus, decoded);
        self.regs.deselect_index();
        self.charge(cycles + decoded.dropped_prefixes);
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new(MasterClock::default())
    }
}

impl Cpu for Z80 {
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let start = self.total_cycles;
        self.check_interrupt(bus);
        if self.halted {
            self.halt_until_interrupt(false);
        } else {
            self.execute_next(bus);
        }
        self.total_cycles.since(start) as u32
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn interrupt<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        self.accept_interrupt(bus)
    }

    fn nmi<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        self.halted = false;
        self.regs.iff2 = self.regs.iff1;
        self.regs.iff1 = false;
        let return_address = self.regs.pc;
        self.regs.push(bus, return_address);
        self.regs.pc = 0x0066;
        trace!(from = return_address, "nmi accepted");
        self.charge(NMI_CYCLES);
        NMI_CYCLES
    }

    fn reset(&mut self) {
        self.regs.reset();
        self.budget = -self.cycles_per_frame;
        self.halted = false;
        self.frames = 0;
    }
}

/// Paths answered by [`Z80::query`].
const Z80_QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l",
    "af", "bc", "de", "hl",
    "af'", "bc'", "de'", "hl'",
    "ix", "iy", "sp", "pc", "i", "r",
    "iff1", "iff2", "im", "halted",
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.pv", "flags.n", "flags.c",
    "frames", "cycles",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.regs;
        let flags = regs.flags;
        let value = match path {
            "a" => regs.a.into(),
            "f" => regs.f().into(),
            "b" => regs.b.into(),
            "c" => regs.c.into(),
            "d" => regs.d.into(),
            "e" => regs.e.into(),
            "h" => regs.h.into(),
            "l" => regs.l.into(),
            "af" => regs.af().into(),
            "bc" => regs.bc().into(),
            "de" => regs.de().into(),
            "hl" => regs.hl().into(),
            "af'" => regs.af_alt().into(),
            "bc'" => regs.bc_alt().into(),
            "de'" => regs.de_alt().into(),
            "hl'" => regs.hl_alt().into(),
            "ix" => regs.ix.into(),
            "iy" => regs.iy.into(),
            "sp" => regs.sp.into(),
            "pc" => regs.pc.into(),
            "i" => regs.i.into(),
            "r" => regs.r.into(),
            "iff1" => regs.iff1.into(),
            "iff2" => regs.iff2.into(),
            "im" => Value::Text(regs.im.name()),
            "halted" => self.halted.into(),
            "flags.s" => flags.s.into(),
            "flags.z" => flags.z.into(),
            "flags.y" => flags.y.into(),
            "flags.h" => flags.h.into(),
            "flags.x" => flags.x.into(),
            "flags.pv" => flags.pv.into(),
            "flags.n" => flags.n.into(),
            "flags.c" => flags.c.into(),
            "frames" => self.frames.into(),
            "cycles" => self.total_cycles.get().into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
