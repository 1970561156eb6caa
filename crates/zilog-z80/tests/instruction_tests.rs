//! Unit tests for individual Z80 instructions and short programs.

use emu_core::{Bus, Cpu, Observable, SimpleBus, Value};
use zilog_z80::{CF, HF, NF, PF, SF, ZF, Z80};

/// Run CPU until it HALTs, return instruction count.
fn run_until_halt(cpu: &mut Z80, bus: &mut SimpleBus) -> u64 {
    let mut count = 0;
    while !cpu.is_halted() && count < 10_000 {
        cpu.step(bus);
        count += 1;
    }
    count
}

fn setup(code: &[u8]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, code);
    let mut cpu = Z80::new();
    cpu.set_pc(0x0000);
    (cpu, bus)
}

#[test]
fn test_reset_state() {
    let mut cpu = Z80::new();
    cpu.registers_mut().pc = 0x1234;
    cpu.registers_mut().iff1 = true;
    cpu.reset();

    let r = cpu.registers();
    assert_eq!(r.pc, 0x0000);
    assert_eq!(r.sp, 0xFFFF);
    assert!(!r.iff1);
    assert!(!r.iff2);
    assert_eq!(r.im, 0);
}

#[test]
fn test_add_program_then_halt() {
    // LD A,5 ; LD B,3 ; ADD A,B ; HALT
    let (mut cpu, mut bus) = setup(&[0x3E, 0x05, 0x06, 0x03, 0x80, 0x76]);
    assert_eq!(run_until_halt(&mut cpu, &mut bus), 4);

    assert_eq!(cpu.a(), 8);
    assert_eq!(cpu.f() & ZF, 0);
    assert_eq!(cpu.pc(), 0x0006);

    // HALT keeps executing NOP cycles in place.
    for _ in 0..10 {
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc(), 0x0006);
    }
}

#[test]
fn test_halt_increments_refresh() {
    let (mut cpu, mut bus) = setup(&[0x76]);
    cpu.step(&mut bus);
    let r_before = cpu.registers().r;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.registers().r, r_before + 2);
}

#[test]
fn test_interrupt_leaves_halt() {
    // EI ; HALT
    let (mut cpu, mut bus) = setup(&[0xFB, 0x76]);
    cpu.registers_mut().sp = 0x8000;
    cpu.registers_mut().im = 1;
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert!(cpu.is_halted());

    assert_eq!(cpu.interrupt(&mut bus, 0xFF), Some(13));
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc(), 0x0038);
    // Return address is the instruction after HALT.
    assert_eq!(bus.peek(0x7FFE), 0x02);
}

#[test]
fn test_ei_delays_interrupt_by_one_instruction() {
    // EI ; NOP
    let (mut cpu, mut bus) = setup(&[0xFB, 0x00]);
    cpu.registers_mut().sp = 0x8000;
    cpu.registers_mut().im = 1;

    cpu.step(&mut bus);
    assert_eq!(cpu.interrupt(&mut bus, 0xFF), None);
    cpu.step(&mut bus);
    assert!(cpu.interrupt(&mut bus, 0xFF).is_some());
}

#[test]
fn test_push_pop_bc() {
    let (mut cpu, mut bus) = setup(&[
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0xC5, // PUSH BC
        0x01, 0x00, 0x00, // LD BC, 0x0000
        0xC1, // POP BC
        0x76, // HALT
    ]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.bc(), 0x1234);
    assert_eq!(cpu.sp(), 0x8000);
}

#[test]
fn test_call_and_ret() {
    let (mut cpu, mut bus) = setup(&[
        0x31, 0x00, 0x80, // LD SP, 0x8000
        0xCD, 0x10, 0x00, // CALL 0x0010
        0x76, // HALT
    ]);
    bus.load(0x0010, &[0x3E, 0x99, 0xC9]); // LD A,0x99 ; RET
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0x99);
    assert_eq!(cpu.pc(), 0x0007);
}

#[test]
fn test_djnz_loop() {
    let (mut cpu, mut bus) = setup(&[
        0x06, 0x05, // LD B,5
        0xAF, // XOR A
        0x3C, // loop: INC A
        0x10, 0xFD, // DJNZ loop
        0x76, // HALT
    ]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 5);
    assert_eq!(cpu.bc() >> 8, 0);
}

#[test]
fn test_sub_sets_carry_and_sign() {
    // LD A,1 ; SUB 2 ; HALT
    let (mut cpu, mut bus) = setup(&[0x3E, 0x01, 0xD6, 0x02, 0x76]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0xFF);
    assert_eq!(cpu.f() & (SF | NF | CF | HF), SF | NF | CF | HF);
}

#[test]
fn test_xor_a_clears_and_sets_parity() {
    let (mut cpu, mut bus) = setup(&[0xAF, 0x76]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0);
    assert_eq!(cpu.f(), ZF | PF);
}

#[test]
fn test_ix_indexed_load_and_store() {
    let (mut cpu, mut bus) = setup(&[
        0xDD, 0x21, 0x00, 0x90, // LD IX,0x9000
        0xDD, 0x36, 0xFE, 0x42, // LD (IX-2),0x42
        0xDD, 0x7E, 0xFE, // LD A,(IX-2)
        0xDD, 0x34, 0xFE, // INC (IX-2)
        0x76,
    ]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0x42);
    assert_eq!(bus.peek(0x8FFE), 0x43);
    assert_eq!(cpu.ix(), 0x9000);
}

#[test]
fn test_undocumented_index_halves() {
    let (mut cpu, mut bus) = setup(&[
        0xFD, 0x21, 0x34, 0x12, // LD IY,0x1234
        0xFD, 0x7C, // LD A,IYH
        0xFD, 0x2C, // INC IYL
        0x76,
    ]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0x12);
    assert_eq!(cpu.iy(), 0x1235);
}

#[test]
fn test_exchange_instructions() {
    let (mut cpu, mut bus) = setup(&[
        0x21, 0x11, 0x11, // LD HL,0x1111
        0xD9, // EXX
        0x21, 0x22, 0x22, // LD HL,0x2222
        0xD9, // EXX
        0x76,
    ]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.hl(), 0x1111);
    assert_eq!(cpu.registers().hl_alt(), 0x2222);
}

#[test]
fn test_in_and_out_use_full_port_address() {
    let (mut cpu, mut bus) = setup(&[
        0x3E, 0x7F, // LD A,0x7F
        0xDB, 0xFE, // IN A,(0xFE)
        0xD3, 0xFE, // OUT (0xFE),A
        0x76,
    ]);
    bus.io_value = 0xBF;
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.a(), 0xBF);
    assert_eq!(bus.io_writes, vec![(0xBFFE, 0xBF)]);
}

#[test]
fn test_im2_after_ed_5e() {
    let (mut cpu, mut bus) = setup(&[
        0x31, 0x00, 0x80, // LD SP,0x8000
        0x3E, 0x39, // LD A,0x39
        0xED, 0x47, // LD I,A
        0xED, 0x5E, // IM 2
        0xFB, // EI
        0x00, // NOP
    ]);
    bus.load(0x39FF, &[0x00, 0x60]);
    for _ in 0..6 {
        cpu.step(&mut bus);
    }
    assert_eq!(cpu.registers().im, 2);
    assert_eq!(cpu.interrupt(&mut bus, 0xFF), Some(19));
    assert_eq!(cpu.pc(), 0x6000);
}

#[test]
fn test_retn_restores_iff1_from_iff2() {
    let (mut cpu, mut bus) = setup(&[0xED, 0x45]);
    bus.load(0x7FFE, &[0x34, 0x12]);
    {
        let r = cpu.registers_mut();
        r.sp = 0x7FFE;
        r.iff1 = false;
        r.iff2 = true;
    }
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.pc(), 0x1234);
    assert!(cpu.registers().iff1);
}

#[test]
fn test_nmi_from_halt() {
    let (mut cpu, mut bus) = setup(&[0x76]);
    cpu.registers_mut().sp = 0x8000;
    cpu.step(&mut bus);
    assert_eq!(cpu.nmi(&mut bus), 11);
    assert_eq!(cpu.pc(), 0x0066);
    assert!(!cpu.is_halted());
}

#[test]
fn test_ticks_accumulate_across_steps() {
    // LD A,5 (7) ; NOP (4) ; HALT (4)
    let (mut cpu, mut bus) = setup(&[0x3E, 0x05, 0x00, 0x76]);
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.total_ticks().get(), 15);
    assert_eq!(cpu.query("ticks"), Some(Value::U64(15)));
}

#[test]
fn test_memptr_after_ld_a_nn() {
    let (mut cpu, mut bus) = setup(&[0x3A, 0x00, 0x50, 0x76]); // LD A,(0x5000)
    run_until_halt(&mut cpu, &mut bus);
    assert_eq!(cpu.query("wz"), Some(Value::U16(0x5001)));
}
