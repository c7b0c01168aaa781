//! ZX Spectrum keyboard.
//!
//! The Spectrum keyboard is an 8x5 matrix of half-rows, read via port $FE.
//! The high byte of the port address selects which half-rows to scan: each
//! cleared bit (A8-A15) enables one half-row, and the selected rows are
//! ANDed together.
//!
//! # Half-row layout
//!
//! | Addr bit | Row | Keys (bit 0-4)                |
//! |----------|-----|-------------------------------|
//! | A8       | 0   | Shift, Z, X, C, V             |
//! | A9       | 1   | A, S, D, F, G                 |
//! | A10      | 2   | Q, W, E, R, T                 |
//! | A11      | 3   | 1, 2, 3, 4, 5                 |
//! | A12      | 4   | 0, 9, 8, 7, 6                 |
//! | A13      | 5   | P, O, I, U, Y                 |
//! | A14      | 6   | Enter, L, K, J, H             |
//! | A15      | 7   | Space, Sym, M, N, B           |
//!
//! A pressed key reads as 0 (active low). Bits 5-7 always read as 1.

/// One key of the 40-key matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumKey {
    // Row 0 (addr bit A8)
    CapsShift,
    Z,
    X,
    C,
    V,
    // Row 1 (addr bit A9)
    A,
    S,
    D,
    F,
    G,
    // Row 2 (addr bit A10)
    Q,
    W,
    E,
    R,
    T,
    // Row 3 (addr bit A11)
    N1,
    N2,
    N3,
    N4,
    N5,
    // Row 4 (addr bit A12)
    N0,
    N9,
    N8,
    N7,
    N6,
    // Row 5 (addr bit A13)
    P,
    O,
    I,
    U,
    Y,
    // Row 6 (addr bit A14)
    Enter,
    L,
    K,
    J,
    H,
    // Row 7 (addr bit A15)
    Space,
    SymShift,
    M,
    N,
    B,
}

impl SpectrumKey {
    /// Every key, row by row.
    pub const ALL: [Self; 40] = [
        Self::CapsShift, Self::Z, Self::X, Self::C, Self::V,
        Self::A, Self::S, Self::D, Self::F, Self::G,
        Self::Q, Self::W, Self::E, Self::R, Self::T,
        Self::N1, Self::N2, Self::N3, Self::N4, Self::N5,
        Self::N0, Self::N9, Self::N8, Self::N7, Self::N6,
        Self::P, Self::O, Self::I, Self::U, Self::Y,
        Self::Enter, Self::L, Self::K, Self::J, Self::H,
        Self::Space, Self::SymShift, Self::M, Self::N, Self::B,
    ];

    /// The (row, bit) pair for this key in the keyboard matrix.
    #[must_use]
    pub const fn matrix(self) -> (usize, u8) {
        let index = self as usize;
        (index / 5, (index % 5) as u8)
    }
}

/// Keyboard state: 8 half-rows of 5 keys each, stored active-low.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardState {
    rows: [u8; 8],
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: [0xFF; 8] }
    }

    pub fn press(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.rows[row] &= !(1 << bit);
    }

    pub fn release(&mut self, key: SpectrumKey) {
        let (row, bit) = key.matrix();
        self.rows[row] |= 1 << bit;
    }

    pub fn release_all(&mut self) {
        self.rows = [0xFF; 8];
    }

    #[must_use]
    pub fn is_pressed(&self, key: SpectrumKey) -> bool {
        let (row, bit) = key.matrix();
        self.rows[row] & (1 << bit) == 0
    }

    /// Read the keyboard for a port $FE access.
    ///
    /// `addr_high` is the high byte of the port address (bits A8-A15).
    /// Returns bits 0-4 (active low: 0 = pressed), bits 5-7 = 1.
    #[must_use]
    pub fn read(&self, addr_high: u8) -> u8 {
        self.rows
            .iter()
            .enumerate()
            .filter(|&(row, _)| addr_high & (1 << row) == 0)
            .fold(0xFF, |acc, (_, &bits)| acc & bits)
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}
