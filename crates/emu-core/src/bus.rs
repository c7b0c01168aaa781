//! Memory and port interfaces.

/// Byte-addressable memory as seen by the CPU.
///
/// The address space is total: every 16-bit address reads something and
/// every write either lands or is silently dropped by the implementor
/// (ROM). Word accesses are little-endian and wrap from 0xFFFF to 0x0000.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word. The high byte of a read at 0xFFFF comes
    /// from 0x0000.
    fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read(address);
        let hi = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Write a little-endian word, wrapping like [`Bus::read_word`].
    fn write_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(address, lo);
        self.write(address.wrapping_add(1), hi);
    }

    /// Read a byte as a two's-complement displacement.
    fn read_signed(&mut self, address: u16) -> i8 {
        self.read(address) as i8
    }
}

/// Port-mapped I/O on top of memory.
///
/// The port space is total as well: ports nobody answers read 0xFF and
/// swallow writes.
pub trait IoBus: Bus {
    /// Read from a 16-bit port address.
    fn read_io(&mut self, port: u16) -> u8;

    /// Write to a 16-bit port address.
    fn write_io(&mut self, port: u16, value: u8);
}

/// Flat 64K RAM with an empty port space.
///
/// Used by CPU tests. Every address is writable and every port reads
/// 0xFF unless a value was queued with [`SimpleBus::set_port`].
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
    ports: Box<[u8; 0x10000]>,
    /// Every `(port, value)` pair written, in order.
    pub port_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            ports: Box::new([0xFF; 0x10000]),
            port_writes: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at 0xFFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read memory without going through the [`Bus`] trait.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }

    /// Set the value returned by reads from `port`.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports[port as usize] = value;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
    }
}

impl IoBus for SimpleBus {
    fn read_io(&mut self, port: u16) -> u8 {
        self.ports[port as usize]
    }

    fn write_io(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}
