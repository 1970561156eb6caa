//! Integration tests using Tom Harte's `SingleStepTests` for the Z80.
//!
//! Each opcode file holds 1,000 randomised cases with a full register and
//! RAM state before and after one instruction, plus the bus cycles it
//! took. Registers, WZ, Q, RAM and the t-state count are all compared.
//! The `p` field (LD A,I/R followed by an accepted interrupt) is not
//! modelled and is ignored.
//!
//! Test data lives in `test-data/z80/v1/`.

#![allow(clippy::cast_possible_truncation)]

use emu_core::{Bus, Cpu, IoBus, Ticks};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::panic;
use std::path::Path;
use zilog_z80::{Registers, Z80};

/// Flat 64KB RAM bus with preloaded port values.
struct TestBus {
    ram: Vec<u8>,
    clock: Ticks,
    io_read_values: HashMap<u16, u8>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            ram: vec![0; 0x1_0000],
            clock: Ticks::ZERO,
            io_read_values: HashMap::new(),
        }
    }

    fn load_ram(&mut self, entries: &[(u16, u8)]) {
        for &(addr, value) in entries {
            self.ram[usize::from(addr)] = value;
        }
    }

    fn advance(&mut self, cycles: u32) {
        self.clock += Ticks::new(u64::from(cycles));
    }
}

impl Bus for TestBus {
    fn fetch(&mut self, address: u16) -> u8 {
        self.advance(4);
        self.ram[usize::from(address)]
    }

    fn read(&mut self, address: u16) -> u8 {
        self.advance(3);
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.advance(3);
        self.ram[usize::from(address)] = value;
    }

    fn contend(&mut self, _address: u16, cycles: u32) {
        self.advance(cycles);
    }

    fn tick(&mut self, cycles: u32) {
        self.advance(cycles);
    }

    fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    fn elapsed(&self) -> Ticks {
        self.clock
    }
}

impl IoBus for TestBus {
    fn read_io(&mut self, port: u16) -> u8 {
        self.advance(4);
        self.io_read_values.get(&port).copied().unwrap_or(0xFF)
    }

    fn write_io(&mut self, _port: u16, _value: u8) {
        self.advance(4);
    }
}

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
    #[serde(default)]
    ports: Vec<(u16, u8, String)>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    ix: u16,
    iy: u16,
    wz: u16,
    #[serde(rename = "af_")]
    af_alt: u16,
    #[serde(rename = "bc_")]
    bc_alt: u16,
    #[serde(rename = "de_")]
    de_alt: u16,
    #[serde(rename = "hl_")]
    hl_alt: u16,
    iff1: u8,
    iff2: u8,
    im: u8,
    ei: u8,
    q: u8,
    ram: Vec<(u16, u8)>,
}

fn setup(cpu: &mut Z80, bus: &mut TestBus, state: &CpuState, ports: &[(u16, u8, String)]) {
    bus.load_ram(&state.ram);
    for (port, value, dir) in ports {
        if dir == "r" {
            bus.io_read_values.insert(*port, *value);
        }
    }

    let r = cpu.registers_mut();
    r.a = state.a;
    r.f = state.f;
    r.b = state.b;
    r.c = state.c;
    r.d = state.d;
    r.e = state.e;
    r.h = state.h;
    r.l = state.l;

    r.a_alt = (state.af_alt >> 8) as u8;
    r.f_alt = state.af_alt as u8;
    r.b_alt = (state.bc_alt >> 8) as u8;
    r.c_alt = state.bc_alt as u8;
    r.d_alt = (state.de_alt >> 8) as u8;
    r.e_alt = state.de_alt as u8;
    r.h_alt = (state.hl_alt >> 8) as u8;
    r.l_alt = state.hl_alt as u8;

    r.ix = state.ix;
    r.iy = state.iy;
    r.sp = state.sp;
    r.pc = state.pc;
    r.i = state.i;
    r.r = state.r;
    r.wz = state.wz;

    r.iff1 = state.iff1 != 0;
    r.iff2 = state.iff2 != 0;
    r.im = state.im;
    r.ei_delay = state.ei != 0;
    r.q = state.q;
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(regs: &Registers, bus: &TestBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();

    check_u8(&mut errors, "A", regs.a, expected.a);
    check_u8(&mut errors, "F", regs.f, expected.f);
    check_u8(&mut errors, "B", regs.b, expected.b);
    check_u8(&mut errors, "C", regs.c, expected.c);
    check_u8(&mut errors, "D", regs.d, expected.d);
    check_u8(&mut errors, "E", regs.e, expected.e);
    check_u8(&mut errors, "H", regs.h, expected.h);
    check_u8(&mut errors, "L", regs.l, expected.l);

    check_u16(&mut errors, "AF'", regs.af_alt(), expected.af_alt);
    check_u16(&mut errors, "BC'", regs.bc_alt(), expected.bc_alt);
    check_u16(&mut errors, "DE'", regs.de_alt(), expected.de_alt);
    check_u16(&mut errors, "HL'", regs.hl_alt(), expected.hl_alt);

    check_u16(&mut errors, "IX", regs.ix, expected.ix);
    check_u16(&mut errors, "IY", regs.iy, expected.iy);
    check_u16(&mut errors, "SP", regs.sp, expected.sp);
    check_u16(&mut errors, "PC", regs.pc, expected.pc);
    check_u8(&mut errors, "I", regs.i, expected.i);
    check_u8(&mut errors, "R", regs.r, expected.r);
    check_u16(&mut errors, "WZ", regs.wz, expected.wz);

    check_u8(&mut errors, "IFF1", u8::from(regs.iff1), expected.iff1);
    check_u8(&mut errors, "IFF2", u8::from(regs.iff2), expected.iff2);
    check_u8(&mut errors, "IM", regs.im, expected.im);
    check_u8(&mut errors, "EI", u8::from(regs.ei_delay), expected.ei);
    check_u8(&mut errors, "Q", regs.q, expected.q);

    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.peek(addr);
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

fn test_filenames() -> Vec<String> {
    let mut filenames = Vec::new();
    for opcode in 0..=0xFFu8 {
        if !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            filenames.push(format!("{opcode:02x}.json"));
        }
    }
    for prefix in ["cb", "dd", "ed", "fd", "dd cb __", "fd cb __"] {
        for opcode in 0..=0xFFu8 {
            filenames.push(format!("{prefix} {opcode:02x}.json"));
        }
    }
    filenames
}

#[test]
#[ignore = "requires test-data/z80 — run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/z80/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for filename in &test_filenames() {
        let path = test_dir.join(filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                let mut cpu = Z80::new();
                let mut bus = TestBus::new();
                setup(&mut cpu, &mut bus, &test.initial, &test.ports);

                let t_states = cpu.step(&mut bus);
                let mut errors = compare(&cpu.registers(), &bus, &test.final_state);
                if t_states as usize != test.cycles.len() {
                    errors.push(format!("T-states: got {t_states}, want {}", test.cycles.len()));
                }
                errors
            }));

            match result {
                Ok(errors) if errors.is_empty() => file_pass += 1,
                Ok(errors) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                    }
                }
                Err(_) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  PANIC [{}]", test.name));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!("{filename}: {status} — {file_pass}/{} passed", file_pass + file_fail);
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== Z80 SingleStepTests Summary ===");
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
