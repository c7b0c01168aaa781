//! Spectrum memory: 64K split into four 16K banks.
//!
//! Each bank carries a writability flag. Bank 0 holds the ROM and is
//! read-only by default; CPU writes into a read-only bank are dropped.
//! Loaders bypass the flags.

/// Size of one bank.
pub const BANK_SIZE: usize = 0x4000;
/// Size of the 48K ROM image.
pub const ROM_SIZE: usize = BANK_SIZE;

const BANKS: usize = 4;

/// 48K Spectrum memory: 16K ROM + 48K RAM.
///
/// Layout:
/// - $0000-$3FFF: ROM (bank 0, read-only)
/// - $4000-$FFFF: RAM (banks 1-3)
pub struct Memory48K {
    bytes: Box<[u8; 0x10000]>,
    writable: [bool; BANKS],
}

impl Memory48K {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; 0x10000]),
            writable: [false, true, true, true],
        }
    }

    const fn bank(address: u16) -> usize {
        address as usize / BANK_SIZE
    }

    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    /// CPU write: dropped when the bank is read-only.
    pub fn write(&mut self, address: u16, value: u8) {
        if self.writable[Self::bank(address)] {
            self.bytes[address as usize] = value;
        }
    }

    /// Read without going through the CPU.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.read(address)
    }

    /// Copy up to 16K into bank 0 regardless of its flag.
    pub fn load_rom(&mut self, rom: &[u8]) {
        let len = rom.len().min(ROM_SIZE);
        self.bytes[..len].copy_from_slice(&rom[..len]);
    }

    /// Copy `data` in at `address`, ignoring writability and wrapping at
    /// $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.bytes[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Change a bank's writability. Banks outside 0-3 are ignored.
    pub fn set_bank_writable(&mut self, bank: usize, writable: bool) {
        if let Some(flag) = self.writable.get_mut(bank) {
            *flag = writable;
        }
    }

    #[must_use]
    pub fn is_bank_writable(&self, bank: usize) -> bool {
        self.writable.get(bank).copied().unwrap_or(false)
    }

    /// Zero all RAM banks. The ROM bank keeps its contents.
    pub fn clear_ram(&mut self) {
        self.bytes[ROM_SIZE..].fill(0);
    }
}

impl Default for Memory48K {
    fn default() -> Self {
        Self::new()
    }
}
