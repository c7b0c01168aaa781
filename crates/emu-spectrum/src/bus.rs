//! Spectrum bus: memory and I/O routing.
//!
//! The bus connects the Z80 CPU to memory, the keyboard and the border
//! latch. Port accesses go through the partial-decode [`PortMap`].

use emu_core::{Bus, IoBus};
use tracing::trace;

use crate::keyboard::KeyboardState;
use crate::memory::Memory48K;
use crate::ports::{PortMap, SpectrumPort};

/// Border colour latched at power-on (the ROM's first $FE write is 7).
pub const POWER_ON_BORDER: u8 = 7;

/// Value on the data bus when no device drives it.
const FLOATING: u8 = 0xFF;

/// The Spectrum bus, implementing `emu_core::Bus` and `emu_core::IoBus`.
pub struct SpectrumBus {
    pub memory: Memory48K,
    pub keyboard: KeyboardState,
    ports: PortMap<SpectrumPort>,
    border: u8,
}

impl SpectrumBus {
    #[must_use]
    pub fn new(memory: Memory48K) -> Self {
        Self {
            memory,
            keyboard: KeyboardState::new(),
            ports: SpectrumPort::map(),
            border: POWER_ON_BORDER,
        }
    }

    /// Current border colour, 0-7.
    #[must_use]
    pub fn border(&self) -> u8 {
        self.border
    }

    pub fn set_border(&mut self, colour: u8) {
        self.border = colour & 0x07;
    }
}

impl Bus for SpectrumBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }
}

impl IoBus for SpectrumBus {
    fn read_io(&mut self, port: u16) -> u8 {
        let Some(device) = self.ports.resolve(port).filter(|d| d.has_input()) else {
            return FLOATING;
        };
        match device {
            SpectrumPort::Ula => self.keyboard.read((port >> 8) as u8),
            SpectrumPort::Kempston => 0x00,
            SpectrumPort::AyRegister
            | SpectrumPort::AyData
            | SpectrumPort::MouseButtons
            | SpectrumPort::MouseX
            | SpectrumPort::MouseY => FLOATING,
        }
    }

    fn write_io(&mut self, port: u16, value: u8) {
        match self.ports.resolve(port) {
            Some(SpectrumPort::Ula) => {
                self.set_border(value);
                trace!(port, border = self.border, "border write");
            }
            Some(device) => trace!(port, value, ?device, "write to unattached device"),
            None => {}
        }
    }
}
