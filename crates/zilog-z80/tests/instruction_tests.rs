//! Unit tests for individual Z80 instructions.
//!
//! Each test assembles a short program into a `SimpleBus`, runs it to the
//! closing HALT and checks registers, memory and cycle counts.

use emu_core::{Cpu, SimpleBus};
use zilog_z80::Z80;

/// Run CPU until it HALTs, return instruction count.
fn run_until_halt(cpu: &mut Z80, bus: &mut SimpleBus) -> u64 {
    let mut count = 0;
    while !cpu.is_halted() && count < 10_000 {
        cpu.step(bus);
        count += 1;
    }
    count
}

/// Load `program` at 0x0000 and run it to HALT.
fn run(program: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, program);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);
    (cpu, bus)
}

/// Execute one instruction at 0x0000 and return its cycle count.
fn cycles_of(program: &[u8], setup: impl FnOnce(&mut Z80, &mut SimpleBus)) -> u32 {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, program);
    let mut cpu = Z80::default();
    setup(&mut cpu, &mut bus);
    cpu.step(&mut bus)
}

#[test]
fn test_nop() {
    let (cpu, _) = run(&[0x00, 0x76]); // NOP, HALT
    assert_eq!(cpu.pc(), 0x0002); // After HALT
}

#[test]
fn test_ld_a_n() {
    let (cpu, _) = run(&[0x3E, 0x42, 0x76]); // LD A, 0x42; HALT
    assert_eq!(cpu.regs.a, 0x42);
}

#[test]
fn test_ld_bc_nn() {
    let (cpu, _) = run(&[0x01, 0x34, 0x12, 0x76]); // LD BC, 0x1234; HALT
    assert_eq!(cpu.regs.bc(), 0x1234);
}

#[test]
fn test_push_pop_bc() {
    let (cpu, bus) = run(&[
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0xC5,             // PUSH BC
        0x01, 0x00, 0x00, // LD BC, 0x0000
        0xC1,             // POP BC
        0x76,             // HALT
    ]);
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_eq!(cpu.regs.sp, 0x8000);
    assert_eq!(bus.peek(0x7FFF), 0x12);
    assert_eq!(bus.peek(0x7FFE), 0x34);
}

#[test]
fn test_push_pop_af_round_trips_flags() {
    let (cpu, _) = run(&[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0x01, 0xC5, 0x12, // LD BC, 0x12C5
        0xC5,             // PUSH BC
        0xF1,             // POP AF
        0x76,             // HALT
    ]);
    assert_eq!(cpu.regs.a, 0x12);
    assert_eq!(cpu.regs.f(), 0xC5);
    assert!(cpu.regs.flags.s);
    assert!(cpu.regs.flags.z);
    assert!(!cpu.regs.flags.n);
}

#[test]
fn test_add_a_a_overflow() {
    let (cpu, _) = run(&[
        0x3E, 0x80, // LD A, 0x80
        0x87,       // ADD A, A
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.a, 0x00);
    let f = cpu.regs.flags;
    assert!(f.z);
    assert!(f.pv);
    assert!(f.c);
    assert!(!f.s);
    assert!(!f.h);
    assert!(!f.n);
}

#[test]
fn test_sub_borrows() {
    let (cpu, _) = run(&[
        0x3E, 0x05, // LD A, 5
        0xD6, 0x07, // SUB 7
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.a, 0xFE);
    let f = cpu.regs.flags;
    assert!(f.s);
    assert!(f.h);
    assert!(f.n);
    assert!(f.c);
    assert!(!f.pv);
}

#[test]
fn test_cp_leaves_a() {
    let (cpu, _) = run(&[
        0x3E, 0x40, // LD A, 0x40
        0xFE, 0x40, // CP 0x40
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.a, 0x40);
    assert!(cpu.regs.flags.z);
    assert!(cpu.regs.flags.n);
}

#[test]
fn test_inc_hl_indirect_overflows() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x21, 0x00, 0x40, // LD HL, 0x4000
        0x34,             // INC (HL)
        0x76,             // HALT
    ]);
    bus.load(0x4000, &[0x7F]);
    let mut cpu = Z80::default();
    cpu.regs.flags.c = true;
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(bus.peek(0x4000), 0x80);
    let f = cpu.regs.flags;
    assert!(f.s);
    assert!(f.h);
    assert!(f.pv);
    assert!(f.c, "INC leaves carry alone");
}

#[test]
fn test_dec_to_zero() {
    let (cpu, _) = run(&[
        0x06, 0x01, // LD B, 1
        0x05,       // DEC B
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.b, 0);
    assert!(cpu.regs.flags.z);
    assert!(cpu.regs.flags.n);
}

#[test]
fn test_djnz_loop() {
    let (cpu, _) = run(&[
        0x06, 0x05, // LD B, 5
        0x3E, 0x00, // LD A, 0
        0xC6, 0x02, // loop: ADD A, 2
        0x10, 0xFC, // DJNZ loop
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.a, 10);
    assert_eq!(cpu.regs.b, 0);
}

#[test]
fn test_call_ret() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0xCD, 0x10, 0x00, // CALL 0x0010
        0x76,             // HALT
    ]);
    bus.load(0x0010, &[
        0x3E, 0x99, // LD A, 0x99
        0xC9,       // RET
    ]);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x99);
    assert_eq!(cpu.regs.sp, 0x8000);
    assert_eq!(cpu.pc(), 0x0007);
}

#[test]
fn test_rst_pushes_return_address() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0xEF,             // RST 28h
    ]);
    bus.load(0x0028, &[0x76]); // HALT
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.pc(), 0x0029);
    assert_eq!(cpu.regs.sp, 0x7FFE);
    assert_eq!(bus.peek(0x7FFE), 0x04);
    assert_eq!(bus.peek(0x7FFF), 0x00);
}

#[test]
fn test_ld_indexed_immediate() {
    let (cpu, bus) = run(&[
        0xDD, 0x21, 0x00, 0x50, // LD IX, 0x5000
        0xDD, 0x36, 0xFE, 0x77, // LD (IX-2), 0x77
        0x76,                   // HALT
    ]);
    assert_eq!(cpu.regs.ix, 0x5000);
    assert_eq!(bus.peek(0x4FFE), 0x77);
}

#[test]
fn test_index_halves() {
    let (cpu, _) = run(&[
        0xFD, 0x26, 0x12, // LD IYH, 0x12
        0xFD, 0x2E, 0x34, // LD IYL, 0x34
        0x26, 0x99,       // LD H, 0x99
        0x76,             // HALT
    ]);
    assert_eq!(cpu.regs.iy, 0x1234);
    assert_eq!(cpu.regs.h, 0x99);
}

#[test]
fn test_ld_h_indexed_uses_real_h() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0xDD, 0x21, 0x00, 0x50, // LD IX, 0x5000
        0xDD, 0x66, 0x01,       // LD H, (IX+1)
        0x76,                   // HALT
    ]);
    bus.load(0x5001, &[0xAB]);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.h, 0xAB);
    assert_eq!(cpu.regs.ix, 0x5000);
}

#[test]
fn test_indexed_rotate_copies_to_register() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0xDD, 0x21, 0x00, 0x50, // LD IX, 0x5000
        0xDD, 0xCB, 0x01, 0x00, // RLC (IX+1), B
        0x76,                   // HALT
    ]);
    bus.load(0x5001, &[0x01]);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(bus.peek(0x5001), 0x02);
    assert_eq!(cpu.regs.b, 0x02);
}

#[test]
fn test_exchanges() {
    let (cpu, _) = run(&[
        0x01, 0x11, 0x11, // LD BC, 0x1111
        0xD9,             // EXX
        0x01, 0x22, 0x22, // LD BC, 0x2222
        0x3E, 0x33,       // LD A, 0x33
        0x08,             // EX AF, AF'
        0x3E, 0x44,       // LD A, 0x44
        0x11, 0x55, 0x55, // LD DE, 0x5555
        0xEB,             // EX DE, HL
        0x76,             // HALT
    ]);
    assert_eq!(cpu.regs.bc(), 0x2222);
    assert_eq!(cpu.regs.bc_alt(), 0x1111);
    assert_eq!(cpu.regs.a, 0x44);
    assert_eq!(cpu.regs.af_alt() >> 8, 0x33);
    assert_eq!(cpu.regs.hl(), 0x5555);
    assert_eq!(cpu.regs.de(), 0x0000);
}

#[test]
fn test_daa_after_add() {
    let (cpu, _) = run(&[
        0x3E, 0x15, // LD A, 0x15
        0xC6, 0x27, // ADD A, 0x27
        0x27,       // DAA
        0x76,       // HALT
    ]);
    assert_eq!(cpu.regs.a, 0x42);
    assert!(!cpu.regs.flags.c);
}

#[test]
fn test_rld() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x21, 0x00, 0x40, // LD HL, 0x4000
        0x3E, 0x12,       // LD A, 0x12
        0xED, 0x6F,       // RLD
        0x76,             // HALT
    ]);
    bus.load(0x4000, &[0x34]);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0x13);
    assert_eq!(bus.peek(0x4000), 0x42);
}

#[test]
fn test_sbc_hl_with_carry() {
    let (cpu, _) = run(&[
        0x21, 0x00, 0x10, // LD HL, 0x1000
        0x11, 0x01, 0x00, // LD DE, 0x0001
        0x37,             // SCF
        0xED, 0x52,       // SBC HL, DE
        0x76,             // HALT
    ]);
    assert_eq!(cpu.regs.hl(), 0x0FFE);
    assert!(!cpu.regs.flags.c);
    assert!(cpu.regs.flags.n);
}

#[test]
fn test_in_a_n_uses_a_as_high_byte() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x3E, 0x7F, // LD A, 0x7F
        0xDB, 0xFE, // IN A, (0xFE)
        0x76,       // HALT
    ]);
    bus.set_port(0x7FFE, 0xBF);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.a, 0xBF);
}

#[test]
fn test_out_instructions() {
    let (_, bus) = run(&[
        0x01, 0xFE, 0x12, // LD BC, 0x12FE
        0x3E, 0x03,       // LD A, 3
        0xED, 0x79,       // OUT (C), A
        0x3E, 0x10,       // LD A, 0x10
        0xD3, 0xFE,       // OUT (0xFE), A
        0xED, 0x71,       // OUT (C), 0
        0x76,             // HALT
    ]);
    assert_eq!(bus.port_writes, vec![(0x12FE, 3), (0x10FE, 0x10), (0x12FE, 0)]);
}

#[test]
fn test_ld_a_i_copies_iff2() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x3E, 0x80, // LD A, 0x80
        0xED, 0x47, // LD I, A
        0xFB,       // EI
        0x3E, 0x00, // LD A, 0
        0xED, 0x57, // LD A, I
        0xF3,       // DI
        0x76,       // HALT
    ]);
    let mut cpu = Z80::default();
    run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.i, 0x80);
    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.flags.s);
    assert!(cpu.regs.flags.pv);
    assert!(!cpu.regs.iff1);
}

#[test]
fn test_instruction_cycles() {
    let none = |_: &mut Z80, _: &mut SimpleBus| {};

    assert_eq!(cycles_of(&[0x00], none), 4); // NOP
    assert_eq!(cycles_of(&[0x21, 0x00, 0x40], none), 10); // LD HL, nn
    assert_eq!(cycles_of(&[0x34], none), 11); // INC (HL)
    assert_eq!(cycles_of(&[0x09], none), 11); // ADD HL, BC
    assert_eq!(cycles_of(&[0xC5], none), 11); // PUSH BC
    assert_eq!(cycles_of(&[0xE3], none), 19); // EX (SP), HL
    assert_eq!(cycles_of(&[0xCD, 0x00, 0x10], none), 17); // CALL nn
    assert_eq!(cycles_of(&[0xC9], none), 10); // RET
    assert_eq!(cycles_of(&[0xCB, 0x46], none), 12); // BIT 0, (HL)
    assert_eq!(cycles_of(&[0xDD, 0x36, 0x00, 0x00], none), 19); // LD (IX+d), n
    assert_eq!(cycles_of(&[0xDD, 0xCB, 0x00, 0x46], none), 20); // BIT 0, (IX+d)
    assert_eq!(cycles_of(&[0xDD, 0xCB, 0x00, 0xC6], none), 23); // SET 0, (IX+d)
    assert_eq!(cycles_of(&[0xDD, 0x00], none), 8); // NOP behind DD
    assert_eq!(cycles_of(&[0xDD, 0xDD, 0x00], none), 4); // overridden prefix
    assert_eq!(cycles_of(&[0xDD, 0xED, 0x44], none), 12); // NEG behind DD
    assert_eq!(cycles_of(&[0xED, 0x44], none), 8); // NEG
    assert_eq!(cycles_of(&[0xED, 0x00], none), 8); // undefined ED
}

#[test]
fn test_conditional_cycles() {
    let zero = |cpu: &mut Z80, _: &mut SimpleBus| cpu.regs.flags.z = true;
    let clear = |cpu: &mut Z80, _: &mut SimpleBus| cpu.regs.flags.z = false;

    assert_eq!(cycles_of(&[0x28, 0x00], zero), 12); // JR Z taken
    assert_eq!(cycles_of(&[0x28, 0x00], clear), 7); // JR Z not taken
    assert_eq!(cycles_of(&[0xC8], zero), 11); // RET Z taken
    assert_eq!(cycles_of(&[0xC8], clear), 5); // RET Z not taken
    assert_eq!(cycles_of(&[0xCC, 0x00, 0x10], zero), 17); // CALL Z taken
    assert_eq!(cycles_of(&[0xCC, 0x00, 0x10], clear), 10); // CALL Z not taken
    assert_eq!(cycles_of(&[0xCA, 0x00, 0x10], clear), 10); // JP Z either way

    let b_two = |cpu: &mut Z80, _: &mut SimpleBus| cpu.regs.b = 2;
    let b_one = |cpu: &mut Z80, _: &mut SimpleBus| cpu.regs.b = 1;
    assert_eq!(cycles_of(&[0x10, 0xFE], b_two), 13); // DJNZ taken
    assert_eq!(cycles_of(&[0x10, 0xFE], b_one), 8); // DJNZ falls through
}

#[test]
fn test_repeated_index_prefixes() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &vec![0xDD; 0x10000]);
    let mut cpu = Z80::default();

    for n in 1..=3u16 {
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc(), n);
        assert_eq!(u16::from(cpu.regs.r), n);
    }
}

#[test]
fn test_index_prefix_then_other_index() {
    let mut bus = SimpleBus::new();
    // DD FD 21 34 12: LD IY, $1234 after a lone DD
    bus.load(0x0000, &[0xDD, 0xFD, 0x21, 0x34, 0x12]);
    let mut cpu = Z80::default();

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.pc(), 0x0001);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.regs.iy, 0x1234);
    assert_eq!(cpu.regs.ix, 0x0000);
    assert_eq!(cpu.regs.r, 3);
}

#[test]
fn test_refresh_counts_prefixes() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[
        0x00,                   // NOP: +1
        0xED, 0x44,             // NEG: +2
        0xDD, 0x21, 0x00, 0x00, // LD IX, 0: +2
        0xFD, 0xCB, 0x00, 0x46, // BIT 0, (IY+0): +2
    ]);
    let mut cpu = Z80::default();
    for _ in 0..4 {
        cpu.step(&mut bus);
    }
    assert_eq!(cpu.regs.r, 7);
    assert_eq!(cpu.pc(), 0x000B);
}
