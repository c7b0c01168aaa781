//! Minimal CP/M harness for ZEXDOC/ZEXALL.
//!
//! CP/M memory layout:
//! - 0x0000: Warm boot (HALT here)
//! - 0x0005: BDOS entry (intercepted before execution)
//! - 0x0006-0x0007: Top of TPA (programs read this for stack init)
//! - 0x0100: Program load address (TPA start)
//!
//! The binaries are not shipped; drop them into `tests/data/`.

use std::io::Write;

use emu_core::{Cpu, SimpleBus};
use zilog_z80::Z80;

/// Handle a BDOS call, appending console output.
fn bdos(cpu: &Z80, bus: &SimpleBus, output: &mut String) {
    match cpu.regs.c {
        2 => output.push(cpu.regs.e as char),
        9 => {
            let mut addr = cpu.regs.de();
            loop {
                let ch = bus.peek(addr);
                if ch == b'$' {
                    break;
                }
                output.push(ch as char);
                addr = addr.wrapping_add(1);
            }
        }
        func => eprintln!("\nUnknown BDOS function: {func}"),
    }
}

fn run_zex(binary: &[u8]) -> bool {
    let mut bus = SimpleBus::new();
    bus.load(0x0100, binary);
    bus.load(0x0000, &[0x76]); // HALT
    bus.load(0x0005, &[0xC9]); // RET
    bus.load(0x0006, &[0x00, 0xFE]); // TPA top 0xFE00

    let mut cpu = Z80::default();
    cpu.regs.pc = 0x0100;

    let mut output = String::new();
    let mut instructions: u64 = 0;

    loop {
        let pc = cpu.pc();
        if pc == 0x0000 || cpu.is_halted() {
            eprintln!("\nExit at instruction {instructions}");
            break;
        }

        if pc == 0x0005 {
            let before = output.len();
            bdos(&cpu, &bus, &mut output);
            eprint!("{}", &output[before..]);
            std::io::stderr().flush().expect("flush stderr");
            cpu.regs.pc = cpu.regs.pop(&mut bus);
            continue;
        }

        cpu.step(&mut bus);
        instructions += 1;
        if instructions % 10_000_000 == 0 {
            eprintln!("[{instructions} instructions]");
        }
    }

    eprintln!("Total: {} cycles", cpu.total_cycles());
    !output.contains("ERROR")
}

#[test]
#[ignore = "needs tests/data/zexdoc.com"]
fn zexdoc() {
    let binary = std::fs::read("tests/data/zexdoc.com").expect("tests/data/zexdoc.com not found");
    assert!(run_zex(&binary), "ZEXDOC failed");
}

#[test]
#[ignore = "needs tests/data/zexall.com"]
fn zexall() {
    let binary = std::fs::read("tests/data/zexall.com").expect("tests/data/zexall.com not found");
    assert!(run_zex(&binary), "ZEXALL failed");
}
