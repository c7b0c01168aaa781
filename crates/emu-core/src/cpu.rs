//! CPU core trait.

use crate::IoBus;

/// An instruction-stepped CPU.
///
/// The bus is passed in rather than owned so the machine around the CPU
/// can inspect and mutate it between instructions.
pub trait Cpu {
    /// Run one interrupt check plus one instruction.
    ///
    /// Returns the number of cycles that elapsed, including any interrupt
    /// service and every iteration of a block-repeat instruction.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns true while the CPU sits in HALT waiting for an interrupt.
    fn is_halted(&self) -> bool;

    /// Service a maskable interrupt now if the CPU accepts one.
    ///
    /// Returns the cycles the service took (0 if interrupts are disabled).
    fn interrupt<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Service a non-maskable interrupt. Returns the cycles it took.
    fn nmi<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Return to the power-on state.
    fn reset(&mut self);
}
