//! Core traits and types shared by the CPU core and the machines around it.
//!
//! The CPU only ever talks to the outside world through [`Bus`] (memory)
//! and [`IoBus`] (ports). Time is counted in [`Ticks`] of the processor
//! clock described by a [`MasterClock`].

mod bus;
mod clock;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, IoBus, SimpleBus};
pub use clock::{FRAMES_PER_SECOND, MasterClock};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
