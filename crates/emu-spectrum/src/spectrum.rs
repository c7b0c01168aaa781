//! Top-level Spectrum system.
//!
//! The machine owns the CPU and the bus. The CPU paces itself: its cycle
//! budget raises the maskable interrupt once every 1/50 s of clock, so a
//! frame is simply "run until the next interrupt opportunity".

use std::path::Path;

use emu_core::{Cpu, Observable, Value};
use format_sna::Snapshot;
use tracing::{debug, info};
use zilog_z80::{InterruptMode, Z80};

use crate::bus::{POWER_ON_BORDER, SpectrumBus};
use crate::config::SpectrumConfig;
use crate::error::{Result, SpectrumError};
use crate::keyboard::SpectrumKey;
use crate::memory::{Memory48K, ROM_SIZE};
use crate::snapshot::SnapshotFormat;

/// ZX Spectrum 48K system.
pub struct Spectrum {
    cpu: Z80,
    bus: SpectrumBus,
}

impl Spectrum {
    /// Create a new Spectrum from the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the ROM isn't exactly 16K or the clock is too slow to
    /// give at least one cycle per frame.
    pub fn new(config: &SpectrumConfig) -> Result<Self> {
        if config.rom.len() != ROM_SIZE {
            return Err(SpectrumError::RomSize(config.rom.len()));
        }
        let clock = config.clock();
        if clock.cycles_per_interrupt() == 0 {
            return Err(SpectrumError::ClockTooSlow(config.clock_hz));
        }

        let mut memory = Memory48K::new();
        memory.load_rom(&config.rom);
        let cpu = Z80::new(clock);
        info!(
            clock_hz = config.clock_hz,
            cycles_per_frame = cpu.cycles_per_frame(),
            "48K Spectrum created"
        );

        Ok(Self {
            cpu,
            bus: SpectrumBus::new(memory),
        })
    }

    /// Power-cycle: CPU reset, RAM cleared, border back to white, keys up.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.memory.clear_ram();
        self.bus.set_border(POWER_ON_BORDER);
        self.bus.keyboard.release_all();
    }

    /// Execute one instruction (and any interrupt due before it).
    ///
    /// Returns the cycles that elapsed.
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    /// Run until one interrupt opportunity has passed.
    ///
    /// Returns the number of CPU T-states executed.
    pub fn run_frame(&mut self) -> u64 {
        self.cpu.run_frame(&mut self.bus)
    }

    /// Run until `cancel` returns true. The predicate is checked before
    /// every instruction.
    ///
    /// Returns the number of CPU T-states executed.
    pub fn run_until<F>(&mut self, mut cancel: F) -> u64
    where
        F: FnMut(&Self) -> bool,
    {
        let start = self.cpu.total_cycles();
        while !cancel(self) {
            self.cpu.step(&mut self.bus);
        }
        self.cpu.total_cycles().since(start)
    }

    /// Replace the machine state with a snapshot's.
    ///
    /// The CPU is reset first, so a pending HALT or the frame position is
    /// not carried over.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) {
        let state = &snapshot.cpu;
        self.cpu.reset();

        let regs = &mut self.cpu.regs;
        regs.set_af(state.af);
        regs.set_bc(state.bc);
        regs.set_de(state.de);
        regs.set_hl(state.hl);
        regs.set_af_alt(state.af_alt);
        regs.set_bc_alt(state.bc_alt);
        regs.set_de_alt(state.de_alt);
        regs.set_hl_alt(state.hl_alt);
        regs.ix = state.ix;
        regs.iy = state.iy;
        regs.sp = state.sp;
        regs.pc = state.pc;
        regs.i = state.i;
        regs.r = state.r;
        regs.iff1 = state.iff1;
        regs.iff2 = state.iff2;
        regs.im = InterruptMode::from_bits(state.im);

        self.bus.memory.load(format_sna::RAM_START, &snapshot.ram);
        self.bus.set_border(snapshot.border);
        debug!(pc = state.pc, border = snapshot.border, "snapshot applied");
    }

    /// Read a snapshot file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Fails on an unknown extension, an I/O error or a malformed file.
    pub fn load_snapshot_file(&mut self, path: &Path) -> Result<()> {
        let format = SnapshotFormat::from_path(path)
            .ok_or_else(|| SpectrumError::UnknownSnapshotFormat(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        let snapshot = format.parse(&data)?;
        self.load_snapshot(&snapshot);
        Ok(())
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }

    /// Current border colour, 0-7.
    #[must_use]
    pub fn border(&self) -> u8 {
        self.bus.border()
    }

    /// Interrupt opportunities since power-on.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.cpu.frames()
    }

    /// Press a key (stays pressed until released).
    pub fn press_key(&mut self, key: SpectrumKey) {
        self.bus.keyboard.press(key);
    }

    pub fn release_key(&mut self, key: SpectrumKey) {
        self.bus.keyboard.release(key);
    }

    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }
}

impl Observable for Spectrum {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                u16::from_str_radix(hex, 16).ok()
            } else if let Some(hex) = rest.strip_prefix('$') {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            addr.map(|a| Value::U8(self.bus.memory.peek(a)))
        } else {
            match path {
                "border" => Some(self.border().into()),
                "frames" => Some(self.frames().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["cpu.<z80_paths>", "memory.<address>", "border", "frames"]
    }
}
