//! Instruction execution.
//!
//! Each handler issues the bus accesses of the real instruction in order,
//! so contention is applied per machine cycle. The comments give the
//! uncontended cost with the opcode fetches included.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Displacements are signed bytes.
#![allow(clippy::too_many_lines)] // One arm per instruction family.

use emu_core::IoBus;

use super::{Index, Z80};
use crate::alu::{self, AluResult};
use crate::decode::{
    AluOp, BlockOp, CB, Cond, Dir, ED, INDEX, INDEX_CB, Kind, MAIN, Op, Operand, Prefix, Rp,
};
use crate::flags::{CF, HF, NF, PF, SF, XF, XYF, ZF, parity, pf_if, sz53, sz53p};

impl Z80 {
    /// Fetch, decode and execute one instruction, following prefixes.
    pub(super) fn execute_next<B: IoBus>(&mut self, bus: &mut B) {
        self.index = Index::Hl;
        let mut table: &[Op; 256] = &MAIN;
        loop {
            let opcode = self.fetch_opcode(bus);
            match table[usize::from(opcode)].kind {
                Kind::Prefix(Prefix::Cb) => {
                    self.ea = self.regs.hl();
                    table = &CB;
                }
                Kind::Prefix(Prefix::Ed) => table = &ED,
                Kind::Prefix(Prefix::Ix) => {
                    self.index = Index::Ix;
                    table = &INDEX;
                }
                Kind::Prefix(Prefix::Iy) => {
                    self.index = Index::Iy;
                    table = &INDEX;
                }
                Kind::IndexCb => return self.execute_index_cb(bus),
                Kind::Unindexed => return self.execute(bus, MAIN[usize::from(opcode)].kind),
                kind => return self.execute(bus, kind),
            }
        }
    }

    /// DD CB d op / FD CB d op. Neither of the last two bytes is an M1
    /// fetch, so R advances only for the prefixes.
    fn execute_index_cb<B: IoBus>(&mut self, bus: &mut B) {
        let d = self.read_imm(bus);
        let addr = self.index_reg().wrapping_add_signed(i16::from(d as i8));
        self.ea = addr;
        self.regs.wz = addr;
        let pc = self.regs.pc;
        let opcode = bus.read(pc);
        self.regs.pc = pc.wrapping_add(1);
        bus.contend(pc, 2);
        self.execute(bus, INDEX_CB[usize::from(opcode)].kind);
    }

    fn execute<B: IoBus>(&mut self, bus: &mut B, kind: Kind) {
        match kind {
            Kind::Nop | Kind::EdNop => {}
            Kind::Halt => self.regs.halted = true,

            // --- 8-bit loads ---
            Kind::Ld { dst, src } => {
                if src.is_memory() {
                    self.resolve(bus, src);
                } else if dst.is_memory() {
                    self.resolve(bus, dst);
                }
                let value = self.get(bus, src);
                self.put(bus, dst, value);
            }
            Kind::LdImm { dst: Operand::IdxMem } => {
                // d and n are both read before the address is formed: 19.
                let d = self.read_imm(bus);
                let n_addr = self.regs.pc;
                let n = self.read_imm(bus);
                bus.contend(n_addr, 2);
                let addr = self.index_reg().wrapping_add_signed(i16::from(d as i8));
                self.ea = addr;
                self.regs.wz = addr;
                bus.write(addr, n);
            }
            Kind::LdImm { dst } => {
                self.resolve(bus, dst);
                let n = self.read_imm(bus);
                self.put(bus, dst, n);
            }
            Kind::LdAInd { rp } => {
                let addr = self.rp(rp);
                self.regs.a = bus.read(addr);
                self.regs.wz = addr.wrapping_add(1);
            }
            Kind::LdIndA { rp } => {
                let addr = self.rp(rp);
                bus.write(addr, self.regs.a);
                self.regs.wz = self.wz_after_store(addr);
            }
            Kind::LdAAbs => {
                let addr = self.read_imm16(bus);
                self.regs.a = bus.read(addr);
                self.regs.wz = addr.wrapping_add(1);
            }
            Kind::LdAbsA => {
                let addr = self.read_imm16(bus);
                bus.write(addr, self.regs.a);
                self.regs.wz = self.wz_after_store(addr);
            }
            Kind::LdIA => {
                bus.contend(self.regs.ir(), 1);
                self.regs.i = self.regs.a;
            }
            Kind::LdRA => {
                bus.contend(self.regs.ir(), 1);
                self.regs.r = self.regs.a;
            }
            Kind::LdAI => {
                bus.contend(self.regs.ir(), 1);
                self.regs.a = self.regs.i;
                self.ld_a_ir_flags();
            }
            Kind::LdAR => {
                bus.contend(self.regs.ir(), 1);
                self.regs.a = self.regs.r;
                self.ld_a_ir_flags();
            }

            // --- 16-bit loads and stack ---
            Kind::LdRpImm { rp } => {
                let value = self.read_imm16(bus);
                self.set_rp(rp, value);
            }
            Kind::LdRpAbs { rp } => {
                let addr = self.read_imm16(bus);
                let lo = bus.read(addr);
                let hi = bus.read(addr.wrapping_add(1));
                self.set_rp(rp, u16::from_le_bytes([lo, hi]));
                self.regs.wz = addr.wrapping_add(1);
            }
            Kind::LdAbsRp { rp } => {
                let addr = self.read_imm16(bus);
                let [lo, hi] = self.rp(rp).to_le_bytes();
                bus.write(addr, lo);
                bus.write(addr.wrapping_add(1), hi);
                self.regs.wz = addr.wrapping_add(1);
            }
            Kind::LdSpRp { rp } => {
                bus.contend(self.regs.ir(), 2);
                self.regs.sp = self.rp(rp);
            }
            Kind::Push { rp } => {
                bus.contend(self.regs.ir(), 1);
                let value = self.rp(rp);
                self.push(bus, value);
            }
            Kind::Pop { rp } => {
                let value = self.pop(bus);
                // POP AF loads F directly; Q stays clear.
                self.set_rp(rp, value);
            }

            // --- Exchanges ---
            Kind::ExAf => {
                let r = &mut self.regs;
                std::mem::swap(&mut r.a, &mut r.a_alt);
                std::mem::swap(&mut r.f, &mut r.f_alt);
            }
            Kind::Exx => {
                let r = &mut self.regs;
                std::mem::swap(&mut r.b, &mut r.b_alt);
                std::mem::swap(&mut r.c, &mut r.c_alt);
                std::mem::swap(&mut r.d, &mut r.d_alt);
                std::mem::swap(&mut r.e, &mut r.e_alt);
                std::mem::swap(&mut r.h, &mut r.h_alt);
                std::mem::swap(&mut r.l, &mut r.l_alt);
            }
            Kind::ExDeHl => {
                let r = &mut self.regs;
                std::mem::swap(&mut r.d, &mut r.h);
                std::mem::swap(&mut r.e, &mut r.l);
            }
            Kind::ExSp { rp } => {
                // 19 (23 for IX/IY)
                let sp = self.regs.sp;
                let lo = bus.read(sp);
                let hi = bus.read(sp.wrapping_add(1));
                bus.contend(sp.wrapping_add(1), 1);
                let [old_lo, old_hi] = self.rp(rp).to_le_bytes();
                bus.write(sp.wrapping_add(1), old_hi);
                bus.write(sp, old_lo);
                bus.contend(sp, 2);
                let value = u16::from_le_bytes([lo, hi]);
                self.set_rp(rp, value);
                self.regs.wz = value;
            }

            // --- Arithmetic ---
            Kind::IncR { r } => {
                self.resolve(bus, r);
                let value = self.get(bus, r);
                let result = alu::inc8(value);
                if r.is_memory() {
                    bus.contend(self.ea, 1);
                }
                self.put(bus, r, result.value);
                self.set_f(result.flags | (self.regs.f & CF));
            }
            Kind::DecR { r } => {
                self.resolve(bus, r);
                let value = self.get(bus, r);
                let result = alu::dec8(value);
                if r.is_memory() {
                    bus.contend(self.ea, 1);
                }
                self.put(bus, r, result.value);
                self.set_f(result.flags | (self.regs.f & CF));
            }
            Kind::IncRp { rp } => {
                bus.contend(self.regs.ir(), 2);
                let value = self.rp(rp).wrapping_add(1);
                self.set_rp(rp, value);
            }
            Kind::DecRp { rp } => {
                bus.contend(self.regs.ir(), 2);
                let value = self.rp(rp).wrapping_sub(1);
                self.set_rp(rp, value);
            }
            Kind::AddRp { dst, src } => {
                bus.contend(self.regs.ir(), 7);
                let a = self.rp(dst);
                let (value, flags) = alu::add16(a, self.rp(src));
                self.regs.wz = a.wrapping_add(1);
                self.set_rp(dst, value);
                self.set_f((self.regs.f & (SF | ZF | PF)) | flags);
            }
            Kind::AdcHl { src } => {
                bus.contend(self.regs.ir(), 7);
                let hl = self.regs.hl();
                let (value, flags) = alu::adc16(hl, self.rp(src), self.carry());
                self.regs.wz = hl.wrapping_add(1);
                self.regs.set_hl(value);
                self.set_f(flags);
            }
            Kind::SbcHl { src } => {
                bus.contend(self.regs.ir(), 7);
                let hl = self.regs.hl();
                let (value, flags) = alu::sbc16(hl, self.rp(src), self.carry());
                self.regs.wz = hl.wrapping_add(1);
                self.regs.set_hl(value);
                self.set_f(flags);
            }
            Kind::Alu { op, src } => {
                self.resolve(bus, src);
                let value = self.get(bus, src);
                self.alu_a(op, value);
            }
            Kind::AluImm { op } => {
                let value = self.read_imm(bus);
                self.alu_a(op, value);
            }
            Kind::RotA { op } => {
                let result = alu::rot_a(op, self.regs.a, self.regs.f);
                self.apply_a(result);
            }
            Kind::Daa => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.apply_a(result);
            }
            Kind::Cpl => {
                self.regs.a = !self.regs.a;
                let f = self.regs.f;
                self.set_f((f & (SF | ZF | PF | CF)) | HF | NF | (self.regs.a & XYF));
            }
            Kind::Scf => {
                let f = self.regs.f;
                self.set_f((f & (SF | ZF | PF)) | self.scf_ccf_xy() | CF);
            }
            Kind::Ccf => {
                let f = self.regs.f;
                let half = if f & CF != 0 { HF } else { 0 };
                self.set_f((f & (SF | ZF | PF)) | self.scf_ccf_xy() | half | ((f & CF) ^ CF));
            }
            Kind::Neg => {
                let result = alu::sub8(0, self.regs.a, false);
                self.apply_a(result);
            }
            Kind::Rrd => {
                // 18
                let hl = self.regs.hl();
                let value = bus.read(hl);
                bus.contend(hl, 4);
                let a = self.regs.a;
                bus.write(hl, (a << 4) | (value >> 4));
                self.regs.a = (a & 0xF0) | (value & 0x0F);
                self.regs.wz = hl.wrapping_add(1);
                self.set_f(sz53p(self.regs.a) | (self.regs.f & CF));
            }
            Kind::Rld => {
                let hl = self.regs.hl();
                let value = bus.read(hl);
                bus.contend(hl, 4);
                let a = self.regs.a;
                bus.write(hl, (value << 4) | (a & 0x0F));
                self.regs.a = (a & 0xF0) | (value >> 4);
                self.regs.wz = hl.wrapping_add(1);
                self.set_f(sz53p(self.regs.a) | (self.regs.f & CF));
            }

            // --- Control flow ---
            Kind::Jp => {
                let addr = self.read_imm16(bus);
                self.regs.pc = addr;
                self.regs.wz = addr;
            }
            Kind::JpCc { cond } => {
                let addr = self.read_imm16(bus);
                self.regs.wz = addr;
                if self.condition(cond) {
                    self.regs.pc = addr;
                }
            }
            Kind::JpRp { rp } => self.regs.pc = self.rp(rp),
            Kind::Jr => self.jump_relative(bus, true),
            Kind::JrCc { cond } => {
                let taken = self.condition(cond);
                self.jump_relative(bus, taken);
            }
            Kind::Djnz => {
                // 8 / 13
                bus.contend(self.regs.ir(), 1);
                self.regs.b = self.regs.b.wrapping_sub(1);
                let taken = self.regs.b != 0;
                self.jump_relative(bus, taken);
            }
            Kind::Call => {
                let addr = self.read_imm16(bus);
                self.call(bus, addr);
            }
            Kind::CallCc { cond } => {
                let addr = self.read_imm16(bus);
                if self.condition(cond) {
                    self.call(bus, addr);
                } else {
                    self.regs.wz = addr;
                }
            }
            Kind::Ret => self.ret(bus),
            Kind::RetCc { cond } => {
                bus.contend(self.regs.ir(), 1);
                if self.condition(cond) {
                    self.ret(bus);
                }
            }
            Kind::Retn | Kind::Reti => {
                self.regs.iff1 = self.regs.iff2;
                self.ret(bus);
            }
            Kind::Rst { addr } => {
                bus.contend(self.regs.ir(), 1);
                let pc = self.regs.pc;
                self.push(bus, pc);
                self.regs.pc = addr;
                self.regs.wz = addr;
            }

            // --- I/O and interrupt control ---
            Kind::OutImmA => {
                let n = self.read_imm(bus);
                let a = self.regs.a;
                bus.write_io(u16::from_le_bytes([n, a]), a);
                self.regs.wz = u16::from_le_bytes([n.wrapping_add(1), a]);
            }
            Kind::InAImm => {
                let n = self.read_imm(bus);
                let port = u16::from_le_bytes([n, self.regs.a]);
                self.regs.a = bus.read_io(port);
                self.regs.wz = port.wrapping_add(1);
            }
            Kind::InC { dst } => {
                let bc = self.regs.bc();
                let value = bus.read_io(bc);
                self.regs.wz = bc.wrapping_add(1);
                if let Some(r) = dst {
                    self.put(bus, r, value);
                }
                self.set_f(sz53p(value) | (self.regs.f & CF));
            }
            Kind::OutC { src } => {
                let bc = self.regs.bc();
                let value = match src {
                    Some(r) => self.get(bus, r),
                    None => 0,
                };
                bus.write_io(bc, value);
                self.regs.wz = bc.wrapping_add(1);
            }
            Kind::Di => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }
            Kind::Ei => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.regs.ei_delay = true;
            }
            Kind::Im { mode } => self.regs.im = mode,

            Kind::Block { op, dir, repeat } => match op {
                BlockOp::Ld => self.block_ld(bus, dir, repeat),
                BlockOp::Cp => self.block_cp(bus, dir, repeat),
                BlockOp::In => self.block_in(bus, dir, repeat),
                BlockOp::Out => self.block_out(bus, dir, repeat),
            },

            // --- CB page. `ea` is already set. ---
            Kind::Rot { op, operand, copy } => {
                let value = self.get(bus, operand);
                let result = alu::rot8(op, value, self.carry());
                self.write_back(bus, operand, copy, result.value);
                self.set_f(result.flags);
            }
            Kind::Bit { bit, operand } => {
                let value = self.get(bus, operand);
                let xy = if operand.is_memory() {
                    bus.contend(self.ea, 1);
                    (self.regs.wz >> 8) as u8
                } else {
                    value
                };
                let tested = value & (1 << bit);
                let mut f = (xy & XYF) | HF | (self.regs.f & CF);
                if tested == 0 {
                    f |= ZF | PF;
                }
                if bit == 7 && tested != 0 {
                    f |= SF;
                }
                self.set_f(f);
            }
            Kind::Res { bit, operand, copy } => {
                let value = self.get(bus, operand) & !(1 << bit);
                self.write_back(bus, operand, copy, value);
            }
            Kind::Set { bit, operand, copy } => {
                let value = self.get(bus, operand) | (1 << bit);
                self.write_back(bus, operand, copy, value);
            }

            Kind::Prefix(_) | Kind::IndexCb | Kind::Unindexed => {
                unreachable!("prefix entries are resolved by execute_next")
            }
        }
    }

    // --- Block instructions ---

    fn block_ld<B: IoBus>(&mut self, bus: &mut B, dir: Dir, repeat: bool) {
        // 16 / 21
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = bus.read(hl);
        bus.write(de, value);
        bus.contend(de, 2);
        self.regs.set_hl(step(hl, dir));
        self.regs.set_de(step(de, dir));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let n = value.wrapping_add(self.regs.a);
        let mut f = (self.regs.f & (SF | ZF | CF)) | (n & XF) | ((n & 0x02) << 4) | pf_if(bc != 0);
        if repeat && bc != 0 {
            bus.contend(de, 5);
            f = self.repeat_block(f);
        }
        self.set_f(f);
    }

    fn block_cp<B: IoBus>(&mut self, bus: &mut B, dir: Dir, repeat: bool) {
        // 16 / 21
        let hl = self.regs.hl();
        let value = bus.read(hl);
        bus.contend(hl, 5);
        self.regs.set_hl(step(hl, dir));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.regs.wz = step(self.regs.wz, dir);

        let result = alu::sub8(self.regs.a, value, false);
        let half = u8::from(result.flags & HF != 0);
        let n = result.value.wrapping_sub(half);
        let mut f = (result.flags & (SF | ZF | HF))
            | NF
            | (self.regs.f & CF)
            | (n & XF)
            | ((n & 0x02) << 4)
            | pf_if(bc != 0);
        if repeat && bc != 0 && f & ZF == 0 {
            bus.contend(hl, 5);
            f = self.repeat_block(f);
        }
        self.set_f(f);
    }

    fn block_in<B: IoBus>(&mut self, bus: &mut B, dir: Dir, repeat: bool) {
        // 16 / 21
        bus.contend(self.regs.ir(), 1);
        let bc = self.regs.bc();
        let value = bus.read_io(bc);
        self.regs.wz = step(bc, dir);
        let hl = self.regs.hl();
        bus.write(hl, value);
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.regs.set_hl(step(hl, dir));

        let k = u16::from(value) + u16::from(step(u16::from(self.regs.c), dir) as u8);
        let mut f = self.io_block_flags(value, k);
        if repeat && self.regs.b != 0 {
            bus.contend(hl, 5);
            f = self.repeat_io_block(f);
        }
        self.set_f(f);
    }

    fn block_out<B: IoBus>(&mut self, bus: &mut B, dir: Dir, repeat: bool) {
        // 16 / 21
        bus.contend(self.regs.ir(), 1);
        let hl = self.regs.hl();
        let value = bus.read(hl);
        self.regs.b = self.regs.b.wrapping_sub(1);
        let bc = self.regs.bc();
        bus.write_io(bc, value);
        self.regs.wz = step(bc, dir);
        self.regs.set_hl(step(hl, dir));

        let k = u16::from(value) + u16::from(self.regs.l);
        let mut f = self.io_block_flags(value, k);
        if repeat && self.regs.b != 0 {
            bus.contend(bc, 5);
            f = self.repeat_io_block(f);
        }
        self.set_f(f);
    }

    /// Flags shared by INI/IND/OUTI/OUTD. `k` is the transferred byte plus
    /// the low byte that accompanies it (C±1 for input, L for output).
    fn io_block_flags(&self, value: u8, k: u16) -> u8 {
        let b = self.regs.b;
        let mut f = sz53(b);
        if value & 0x80 != 0 {
            f |= NF;
        }
        if k > 0xFF {
            f |= HF | CF;
        }
        f | pf_if(parity((k as u8 & 7) ^ b))
    }

    /// Rewind PC over a repeating LDxR/CPxR; bits 3/5 come from PC high.
    fn repeat_block(&mut self, f: u8) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        (f & !XYF) | ((self.regs.pc >> 8) as u8 & XYF)
    }

    /// Rewind PC over a repeating INxR/OTxR and apply the P/V and H
    /// adjustments made during the extra cycles.
    fn repeat_io_block(&mut self, f: u8) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        let b = self.regs.b;
        let (source, half) = if f & CF == 0 {
            (b, false)
        } else if f & NF == 0 {
            (b.wrapping_add(1), b & 0x0F == 0x0F)
        } else {
            (b.wrapping_sub(1), b & 0x0F == 0x00)
        };
        let pv = (f & PF != 0) ^ parity(source & 7) ^ true;
        let mut out = (f & !(XYF | HF | PF)) | ((self.regs.pc >> 8) as u8 & XYF) | pf_if(pv);
        if half {
            out |= HF;
        }
        out
    }

    // --- Helpers ---

    fn fetch_opcode<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        let opcode = bus.fetch(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.regs.inc_r();
        opcode
    }

    fn read_imm<B: IoBus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn read_imm16<B: IoBus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.read_imm(bus);
        let hi = self.read_imm(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Form the effective address of a memory operand. `(IX+d)` reads the
    /// displacement and spends 5 internal cycles on the address.
    fn resolve<B: IoBus>(&mut self, bus: &mut B, operand: Operand) {
        match operand {
            Operand::HlMem => self.ea = self.regs.hl(),
            Operand::IdxMem => {
                let d_addr = self.regs.pc;
                let d = self.read_imm(bus);
                bus.contend(d_addr, 5);
                let addr = self.index_reg().wrapping_add_signed(i16::from(d as i8));
                self.ea = addr;
                self.regs.wz = addr;
            }
            _ => {}
        }
    }

    fn get<B: IoBus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        let r = &self.regs;
        match operand {
            Operand::B => r.b,
            Operand::C => r.c,
            Operand::D => r.d,
            Operand::E => r.e,
            Operand::H => r.h,
            Operand::L => r.l,
            Operand::A => r.a,
            Operand::IdxH => (self.index_reg() >> 8) as u8,
            Operand::IdxL => self.index_reg() as u8,
            Operand::HlMem | Operand::IdxMem => bus.read(self.ea),
        }
    }

    fn put<B: IoBus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        match operand {
            Operand::B => self.regs.b = value,
            Operand::C => self.regs.c = value,
            Operand::D => self.regs.d = value,
            Operand::E => self.regs.e = value,
            Operand::H => self.regs.h = value,
            Operand::L => self.regs.l = value,
            Operand::A => self.regs.a = value,
            Operand::IdxH => {
                let idx = (self.index_reg() & 0x00FF) | (u16::from(value) << 8);
                self.set_index_reg(idx);
            }
            Operand::IdxL => {
                let idx = (self.index_reg() & 0xFF00) | u16::from(value);
                self.set_index_reg(idx);
            }
            Operand::HlMem | Operand::IdxMem => bus.write(self.ea, value),
        }
    }

    /// Store a CB-page result: memory operands take one internal cycle
    /// before the write, and DDCB forms may also copy into a register.
    fn write_back<B: IoBus>(&mut self, bus: &mut B, operand: Operand, copy: Option<Operand>, value: u8) {
        if operand.is_memory() {
            bus.contend(self.ea, 1);
        }
        self.put(bus, operand, value);
        if let Some(r) = copy {
            self.put(bus, r, value);
        }
    }

    fn index_reg(&self) -> u16 {
        match self.index {
            Index::Hl => self.regs.hl(),
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    fn set_index_reg(&mut self, value: u16) {
        match self.index {
            Index::Hl => self.regs.set_hl(value),
            Index::Ix => self.regs.ix = value,
            Index::Iy => self.regs.iy = value,
        }
    }

    fn rp(&self, rp: Rp) -> u16 {
        match rp {
            Rp::Bc => self.regs.bc(),
            Rp::De => self.regs.de(),
            Rp::Hl => self.regs.hl(),
            Rp::Sp => self.regs.sp,
            Rp::Af => self.regs.af(),
            Rp::Idx => self.index_reg(),
        }
    }

    fn set_rp(&mut self, rp: Rp, value: u16) {
        match rp {
            Rp::Bc => self.regs.set_bc(value),
            Rp::De => self.regs.set_de(value),
            Rp::Hl => self.regs.set_hl(value),
            Rp::Sp => self.regs.sp = value,
            Rp::Af => self.regs.set_af(value),
            Rp::Idx => self.set_index_reg(value),
        }
    }

    fn carry(&self) -> bool {
        self.regs.f & CF != 0
    }

    fn condition(&self, cond: Cond) -> bool {
        let f = self.regs.f;
        match cond {
            Cond::Nz => f & ZF == 0,
            Cond::Z => f & ZF != 0,
            Cond::Nc => f & CF == 0,
            Cond::C => f & CF != 0,
            Cond::Po => f & PF == 0,
            Cond::Pe => f & PF != 0,
            Cond::P => f & SF == 0,
            Cond::M => f & SF != 0,
        }
    }

    /// Write F from an instruction's result. Q records it for SCF/CCF.
    fn set_f(&mut self, f: u8) {
        self.regs.f = f;
        self.regs.q = f;
    }

    fn apply_a(&mut self, result: AluResult) {
        self.regs.a = result.value;
        self.set_f(result.flags);
    }

    fn alu_a(&mut self, op: AluOp, value: u8) {
        let result = alu::alu8(op, self.regs.a, value, self.carry());
        self.apply_a(result);
    }

    fn scf_ccf_xy(&self) -> u8 {
        ((self.prev_q ^ self.regs.f) | self.regs.a) & XYF
    }

    fn ld_a_ir_flags(&mut self) {
        let f = sz53(self.regs.a) | pf_if(self.regs.iff2) | (self.regs.f & CF);
        self.set_f(f);
    }

    /// `LD (rp),A` and `LD (nn),A`: WZ low is the address low plus one,
    /// WZ high is A.
    fn wz_after_store(&self, addr: u16) -> u16 {
        u16::from_le_bytes([(addr as u8).wrapping_add(1), self.regs.a])
    }

    /// JR/DJNZ tail: the displacement is always read; a taken jump spends
    /// 5 more cycles with the displacement address on the bus.
    fn jump_relative<B: IoBus>(&mut self, bus: &mut B, taken: bool) {
        let d_addr = self.regs.pc;
        let d = self.read_imm(bus);
        if taken {
            bus.contend(d_addr, 5);
            let target = self.regs.pc.wrapping_add_signed(i16::from(d as i8));
            self.regs.pc = target;
            self.regs.wz = target;
        }
    }

    fn call<B: IoBus>(&mut self, bus: &mut B, addr: u16) {
        // 17
        bus.contend(self.regs.pc.wrapping_sub(1), 1);
        let pc = self.regs.pc;
        self.push(bus, pc);
        self.regs.pc = addr;
        self.regs.wz = addr;
    }

    fn ret<B: IoBus>(&mut self, bus: &mut B) {
        let addr = self.pop(bus);
        self.regs.pc = addr;
        self.regs.wz = addr;
    }
}

fn step(value: u16, dir: Dir) -> u16 {
    match dir {
        Dir::Inc => value.wrapping_add(1),
        Dir::Dec => value.wrapping_sub(1),
    }
}
