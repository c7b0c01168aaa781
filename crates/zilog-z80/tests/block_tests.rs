//! Block transfer, search and I/O instructions, including the repeating
//! forms and interrupts that land between their iterations.

use emu_core::{Cpu, SimpleBus};
use zilog_z80::{InterruptMode, Z80};

fn cpu_at(bus: &mut SimpleBus, program: &[u8]) -> Z80 {
    bus.load(0x0000, program);
    Z80::default()
}

#[test]
fn ldir_copies_and_charges_per_iteration() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0xAA, 0xBB, 0xCC]);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB0]); // LDIR
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_de(0x5000);
    cpu.regs.set_bc(3);

    let cycles = cpu.step(&mut bus);

    assert_eq!(cycles, 21 * 2 + 16);
    assert_eq!(bus.peek(0x5000), 0xAA);
    assert_eq!(bus.peek(0x5001), 0xBB);
    assert_eq!(bus.peek(0x5002), 0xCC);
    assert_eq!(cpu.regs.hl(), 0x4003);
    assert_eq!(cpu.regs.de(), 0x5003);
    assert_eq!(cpu.regs.bc(), 0);
    assert!(!cpu.regs.flags.pv);
    assert!(!cpu.regs.flags.h);
    assert!(!cpu.regs.flags.n);
    assert_eq!(cpu.regs.r, 6);
    assert_eq!(cpu.regs.pc, 0x0002);
}

#[test]
fn lddr_walks_backwards() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x01, 0x02]);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB8]); // LDDR
    cpu.regs.set_hl(0x4001);
    cpu.regs.set_de(0x6001);
    cpu.regs.set_bc(2);

    assert_eq!(cpu.step(&mut bus), 21 + 16);
    assert_eq!(bus.peek(0x6000), 0x01);
    assert_eq!(bus.peek(0x6001), 0x02);
    assert_eq!(cpu.regs.hl(), 0x3FFF);
    assert_eq!(cpu.regs.de(), 0x5FFF);
}

#[test]
fn ldi_reports_remaining_count() {
    let mut bus = SimpleBus::new();
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xA0]); // LDI
    cpu.regs.set_bc(2);

    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.regs.bc(), 1);
    assert!(cpu.regs.flags.pv);
}

#[test]
fn cpir_stops_on_match() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x11, 0x22, 0x33, 0x44]);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB1]); // CPIR
    cpu.regs.a = 0x33;
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_bc(10);
    cpu.regs.flags.c = true;

    assert_eq!(cpu.step(&mut bus), 21 * 2 + 16);
    assert_eq!(cpu.regs.hl(), 0x4003);
    assert_eq!(cpu.regs.bc(), 7);
    assert!(cpu.regs.flags.z);
    assert!(cpu.regs.flags.pv);
    assert!(cpu.regs.flags.n);
    assert!(cpu.regs.flags.c, "carry survives the compare");
}

#[test]
fn cpir_exhausts_count() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[0x11, 0x22]);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB1]); // CPIR
    cpu.regs.a = 0x99;
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_bc(2);

    assert_eq!(cpu.step(&mut bus), 21 + 16);
    assert_eq!(cpu.regs.bc(), 0);
    assert!(!cpu.regs.flags.z);
    assert!(!cpu.regs.flags.pv);
    assert!(!cpu.regs.flags.c);
}

#[test]
fn inir_reads_port_bc() {
    let mut bus = SimpleBus::new();
    bus.set_port(0x02FE, 0x12);
    bus.set_port(0x01FE, 0x34);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB2]); // INIR
    cpu.regs.set_bc(0x02FE);
    cpu.regs.set_hl(0x4000);
    cpu.regs.flags.c = true;

    assert_eq!(cpu.step(&mut bus), 21 + 16);
    assert_eq!(bus.peek(0x4000), 0x12);
    assert_eq!(bus.peek(0x4001), 0x34);
    assert_eq!(cpu.regs.b, 0);
    assert!(cpu.regs.flags.z);
    assert!(!cpu.regs.flags.c);
    assert!(!cpu.regs.flags.n);
}

#[test]
fn ind_sets_subtract() {
    let mut bus = SimpleBus::new();
    bus.set_port(0x02FE, 0x77);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xAA]); // IND
    cpu.regs.set_bc(0x02FE);
    cpu.regs.set_hl(0x4000);

    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(bus.peek(0x4000), 0x77);
    assert_eq!(cpu.regs.hl(), 0x3FFF);
    assert_eq!(cpu.regs.b, 1);
    assert!(!cpu.regs.flags.z);
    assert!(cpu.regs.flags.n);
}

#[test]
fn otir_writes_each_byte() {
    let mut bus = SimpleBus::new();
    bus.load(0x4000, &[1, 2, 3]);
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB3]); // OTIR
    cpu.regs.set_bc(0x03FE);
    cpu.regs.set_hl(0x4000);

    assert_eq!(cpu.step(&mut bus), 21 * 2 + 16);
    assert_eq!(bus.port_writes, vec![(0x03FE, 1), (0x02FE, 2), (0x01FE, 3)]);
    assert_eq!(cpu.regs.b, 0);
    assert!(cpu.regs.flags.z);
    assert!(!cpu.regs.flags.n);
}

#[test]
fn interrupt_between_iterations() {
    let mut bus = SimpleBus::new();
    let mut cpu = cpu_at(&mut bus, &[0xED, 0xB0]); // LDIR
    cpu.regs.set_hl(0x4000);
    cpu.regs.set_de(0x5000);
    cpu.regs.set_bc(10);
    cpu.regs.sp = 0x8000;
    cpu.regs.iff1 = true;
    cpu.regs.iff2 = true;
    cpu.regs.im = InterruptMode::Mode1;
    cpu.set_budget(-30);

    let cycles = cpu.step(&mut bus);

    // The second repeat crosses the frame boundary.
    assert_eq!(cpu.frames(), 1);
    assert_eq!(cycles, 21 * 9 + 13 + 16);
    assert_eq!(cpu.regs.bc(), 0);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.regs.sp, 0x7FFE);
    assert_eq!(bus.peek(0x7FFE), 0x02);
    assert_eq!(bus.peek(0x7FFF), 0x00);
    assert!(!cpu.regs.iff1);
}
