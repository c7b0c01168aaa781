//! I/O port decoding.
//!
//! The Spectrum decodes ports partially: a device answers whenever the
//! address bits it looks at match, whatever the others hold. A
//! [`PortMap`] is an ordered list of `(mask, value, device)` entries and
//! the first entry with `port & mask == value & mask` wins.

/// One partially-decoded port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortEntry<D> {
    pub mask: u16,
    pub value: u16,
    pub device: D,
}

impl<D> PortEntry<D> {
    #[must_use]
    pub const fn matches(&self, port: u16) -> bool {
        port & self.mask == self.value & self.mask
    }
}

/// Ordered partial-decode table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMap<D> {
    entries: Vec<PortEntry<D>>,
}

impl<D: Copy> PortMap<D> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append an entry. Earlier entries take priority.
    #[must_use]
    pub fn with(mut self, mask: u16, value: u16, device: D) -> Self {
        self.entries.push(PortEntry { mask, value, device });
        self
    }

    /// The device answering `port`, if any.
    #[must_use]
    pub fn resolve(&self, port: u16) -> Option<D> {
        self.entries
            .iter()
            .find(|entry| entry.matches(port))
            .map(|entry| entry.device)
    }

    #[must_use]
    pub fn entries(&self) -> &[PortEntry<D>] {
        &self.entries
    }
}

impl<D: Copy> Default for PortMap<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Devices on the 48K port map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumPort {
    /// $FE: keyboard in, border out.
    Ula,
    /// $FFFD: AY register select. Nothing is attached, reads float high.
    AyRegister,
    /// $BFFD: AY data. Write only.
    AyData,
    /// $FADF: Kempston mouse buttons. No mouse attached, reads float high.
    MouseButtons,
    /// $FBDF: Kempston mouse X position.
    MouseX,
    /// $FFDF: Kempston mouse Y position.
    MouseY,
    /// $1F: Kempston joystick. Reads as nothing pressed.
    Kempston,
}

impl SpectrumPort {
    /// Whether the device drives the data bus on an IN.
    #[must_use]
    pub const fn has_input(self) -> bool {
        !matches!(self, Self::AyData)
    }

    /// The 48K machine's decode table, in priority order.
    #[must_use]
    pub fn map() -> PortMap<Self> {
        PortMap::new()
            .with(0x0001, 0x00FE, Self::Ula)
            .with(0xC002, 0xFFFD, Self::AyRegister)
            .with(0xC002, 0xBFFD, Self::AyData)
            .with(0x0320, 0xFADF, Self::MouseButtons)
            .with(0x0720, 0xFBDF, Self::MouseX)
            .with(0x0720, 0xFFDF, Self::MouseY)
            .with(0x0021, 0x001F, Self::Kempston)
    }
}
