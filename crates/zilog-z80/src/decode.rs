//! Opcode tables.
//!
//! Decoding splits each opcode into the usual fields
//!
//! ```text
//!   7 6 5 4 3 2 1 0
//!  | x |  y  |  z  |      y = p:q (p = bits 5-4, q = bit 3)
//! ```
//!
//! and maps it to a tagged [`Op`]. There is one 256-entry table per opcode
//! page: [`MAIN`], [`CB`], [`ED`], [`INDEX`] (shared by DD and FD, the prefix
//! picks IX or IY) and [`INDEX_CB`] (DDCB/FDCB). All tables are built at
//! compile time, so every byte sequence decodes to something.
//!
//! `t_states` is the documented uncontended cost of the whole instruction,
//! prefixes included. Conditional and repeating forms carry their not-taken
//! cost. Prefix entries carry the cost of the prefix byte alone.

#![allow(clippy::cast_possible_truncation)] // Table indices are < 256.

/// An 8-bit operand as encoded in the `r` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    B,
    C,
    D,
    E,
    H,
    L,
    /// `(HL)`
    HlMem,
    A,
    /// High byte of the active index register (IXH/IYH).
    IdxH,
    /// Low byte of the active index register (IXL/IYL).
    IdxL,
    /// `(IX+d)` / `(IY+d)`
    IdxMem,
}

impl Operand {
    /// True for `(HL)` and `(IX+d)`.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Operand::HlMem | Operand::IdxMem)
    }
}

/// A 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rp {
    Bc,
    De,
    Hl,
    Sp,
    Af,
    /// The active index register.
    Idx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented: shift left, bit 0 set.
    Sll,
    Srl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
    Po,
    Pe,
    P,
    M,
}

/// The four block instruction families (LDI, CPI, INI, OUTI and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOp {
    Ld,
    Cp,
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Cb,
    Ed,
    Ix,
    Iy,
}

/// What an opcode does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Halt,

    // 8-bit loads
    Ld { dst: Operand, src: Operand },
    LdImm { dst: Operand },
    /// `LD A,(BC)` / `LD A,(DE)`
    LdAInd { rp: Rp },
    /// `LD (BC),A` / `LD (DE),A`
    LdIndA { rp: Rp },
    /// `LD A,(nn)`
    LdAAbs,
    /// `LD (nn),A`
    LdAbsA,
    LdIA,
    LdRA,
    LdAI,
    LdAR,

    // 16-bit loads
    LdRpImm { rp: Rp },
    /// `LD rp,(nn)`
    LdRpAbs { rp: Rp },
    /// `LD (nn),rp`
    LdAbsRp { rp: Rp },
    /// `LD SP,HL` and the index forms.
    LdSpRp { rp: Rp },
    Push { rp: Rp },
    Pop { rp: Rp },

    // Exchanges
    ExAf,
    Exx,
    ExDeHl,
    ExSp { rp: Rp },

    // Arithmetic
    IncR { r: Operand },
    DecR { r: Operand },
    IncRp { rp: Rp },
    DecRp { rp: Rp },
    AddRp { dst: Rp, src: Rp },
    AdcHl { src: Rp },
    SbcHl { src: Rp },
    Alu { op: AluOp, src: Operand },
    AluImm { op: AluOp },
    RotA { op: RotOp },
    Daa,
    Cpl,
    Scf,
    Ccf,
    Neg,
    Rrd,
    Rld,

    // Control flow
    Jp,
    JpCc { cond: Cond },
    JpRp { rp: Rp },
    Jr,
    JrCc { cond: Cond },
    Djnz,
    Call,
    CallCc { cond: Cond },
    Ret,
    RetCc { cond: Cond },
    Retn,
    Reti,
    Rst { addr: u16 },

    // I/O and interrupt control
    OutImmA,
    InAImm,
    /// `IN r,(C)`; `None` is `IN F,(C)` (flags only).
    InC { dst: Option<Operand> },
    /// `OUT (C),r`; `None` is `OUT (C),0`.
    OutC { src: Option<Operand> },
    Di,
    Ei,
    Im { mode: u8 },

    Block { op: BlockOp, dir: Dir, repeat: bool },

    // CB page. `copy` is the undocumented DDCB/FDCB register copy.
    Rot { op: RotOp, operand: Operand, copy: Option<Operand> },
    Bit { bit: u8, operand: Operand },
    Res { bit: u8, operand: Operand, copy: Option<Operand> },
    Set { bit: u8, operand: Operand, copy: Option<Operand> },

    /// Switch to another opcode page.
    Prefix(Prefix),
    /// DD CB / FD CB: displacement and opcode follow. The entry carries the
    /// cost of the two prefix bytes; [`INDEX_CB`] has the full cost.
    IndexCb,
    /// A DD/FD prefix on an opcode that does not use HL: run the MAIN
    /// entry unchanged.
    Unindexed,
    /// Undefined ED opcode, an 8 t-state no-op.
    EdNop,
}

/// A decoded table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    pub kind: Kind,
    /// Instruction length in bytes, prefixes and operands included.
    pub len: u8,
    /// Uncontended t-states (not-taken cost for conditional forms).
    pub t_states: u8,
}

impl Op {
    const fn new(kind: Kind, len: u8, t_states: u8) -> Self {
        Self { kind, len, t_states }
    }
}

const R: [Operand; 8] = [
    Operand::B,
    Operand::C,
    Operand::D,
    Operand::E,
    Operand::H,
    Operand::L,
    Operand::HlMem,
    Operand::A,
];
const RP: [Rp; 4] = [Rp::Bc, Rp::De, Rp::Hl, Rp::Sp];
const RP2: [Rp; 4] = [Rp::Bc, Rp::De, Rp::Hl, Rp::Af];
const CC: [Cond; 8] = [
    Cond::Nz,
    Cond::Z,
    Cond::Nc,
    Cond::C,
    Cond::Po,
    Cond::Pe,
    Cond::P,
    Cond::M,
];
const ALU: [AluOp; 8] = [
    AluOp::Add,
    AluOp::Adc,
    AluOp::Sub,
    AluOp::Sbc,
    AluOp::And,
    AluOp::Xor,
    AluOp::Or,
    AluOp::Cp,
];
const ROT: [RotOp; 8] = [
    RotOp::Rlc,
    RotOp::Rrc,
    RotOp::Rl,
    RotOp::Rr,
    RotOp::Sla,
    RotOp::Sra,
    RotOp::Sll,
    RotOp::Srl,
];
const IM: [u8; 8] = [0, 0, 1, 2, 0, 0, 1, 2];

/// 4 t-states, 3 more for each `(HL)` access.
const fn mem_cost(r: Operand, reg: u8, mem: u8) -> u8 {
    if r.is_memory() { mem } else { reg }
}

const fn main_op(opcode: u8) -> Op {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = (y >> 1) as usize;
    let q = y & 1;
    let ry = R[y as usize];
    let rz = R[z as usize];

    match (x, z) {
        (0, 0) => match y {
            0 => Op::new(Kind::Nop, 1, 4),
            1 => Op::new(Kind::ExAf, 1, 4),
            2 => Op::new(Kind::Djnz, 2, 8),
            3 => Op::new(Kind::Jr, 2, 12),
            _ => Op::new(Kind::JrCc { cond: CC[(y - 4) as usize] }, 2, 7),
        },
        (0, 1) if q == 0 => Op::new(Kind::LdRpImm { rp: RP[p] }, 3, 10),
        (0, 1) => Op::new(Kind::AddRp { dst: Rp::Hl, src: RP[p] }, 1, 11),
        (0, 2) => match (q, p) {
            (0, 0) => Op::new(Kind::LdIndA { rp: Rp::Bc }, 1, 7),
            (0, 1) => Op::new(Kind::LdIndA { rp: Rp::De }, 1, 7),
            (0, 2) => Op::new(Kind::LdAbsRp { rp: Rp::Hl }, 3, 16),
            (0, _) => Op::new(Kind::LdAbsA, 3, 13),
            (_, 0) => Op::new(Kind::LdAInd { rp: Rp::Bc }, 1, 7),
            (_, 1) => Op::new(Kind::LdAInd { rp: Rp::De }, 1, 7),
            (_, 2) => Op::new(Kind::LdRpAbs { rp: Rp::Hl }, 3, 16),
            (_, _) => Op::new(Kind::LdAAbs, 3, 13),
        },
        (0, 3) if q == 0 => Op::new(Kind::IncRp { rp: RP[p] }, 1, 6),
        (0, 3) => Op::new(Kind::DecRp { rp: RP[p] }, 1, 6),
        (0, 4) => Op::new(Kind::IncR { r: ry }, 1, mem_cost(ry, 4, 11)),
        (0, 5) => Op::new(Kind::DecR { r: ry }, 1, mem_cost(ry, 4, 11)),
        (0, 6) => Op::new(Kind::LdImm { dst: ry }, 2, mem_cost(ry, 7, 10)),
        (0, _) => Op::new(
            match y {
                0 => Kind::RotA { op: RotOp::Rlc },
                1 => Kind::RotA { op: RotOp::Rrc },
                2 => Kind::RotA { op: RotOp::Rl },
                3 => Kind::RotA { op: RotOp::Rr },
                4 => Kind::Daa,
                5 => Kind::Cpl,
                6 => Kind::Scf,
                _ => Kind::Ccf,
            },
            1,
            4,
        ),
        (1, 6) if y == 6 => Op::new(Kind::Halt, 1, 4),
        (1, _) => {
            let cost = if ry.is_memory() || rz.is_memory() { 7 } else { 4 };
            Op::new(Kind::Ld { dst: ry, src: rz }, 1, cost)
        }
        (2, _) => Op::new(Kind::Alu { op: ALU[y as usize], src: rz }, 1, mem_cost(rz, 4, 7)),
        (_, 0) => Op::new(Kind::RetCc { cond: CC[y as usize] }, 1, 5),
        (_, 1) => match (q, p) {
            (0, _) => Op::new(Kind::Pop { rp: RP2[p] }, 1, 10),
            (_, 0) => Op::new(Kind::Ret, 1, 10),
            (_, 1) => Op::new(Kind::Exx, 1, 4),
            (_, 2) => Op::new(Kind::JpRp { rp: Rp::Hl }, 1, 4),
            (_, _) => Op::new(Kind::LdSpRp { rp: Rp::Hl }, 1, 6),
        },
        (_, 2) => Op::new(Kind::JpCc { cond: CC[y as usize] }, 3, 10),
        (_, 3) => match y {
            0 => Op::new(Kind::Jp, 3, 10),
            1 => Op::new(Kind::Prefix(Prefix::Cb), 1, 4),
            2 => Op::new(Kind::OutImmA, 2, 11),
            3 => Op::new(Kind::InAImm, 2, 11),
            4 => Op::new(Kind::ExSp { rp: Rp::Hl }, 1, 19),
            5 => Op::new(Kind::ExDeHl, 1, 4),
            6 => Op::new(Kind::Di, 1, 4),
            _ => Op::new(Kind::Ei, 1, 4),
        },
        (_, 4) => Op::new(Kind::CallCc { cond: CC[y as usize] }, 3, 10),
        (_, 5) => match (q, p) {
            (0, _) => Op::new(Kind::Push { rp: RP2[p] }, 1, 11),
            (_, 0) => Op::new(Kind::Call, 3, 17),
            (_, 1) => Op::new(Kind::Prefix(Prefix::Ix), 1, 4),
            (_, 2) => Op::new(Kind::Prefix(Prefix::Ed), 1, 4),
            (_, _) => Op::new(Kind::Prefix(Prefix::Iy), 1, 4),
        },
        (_, 6) => Op::new(Kind::AluImm { op: ALU[y as usize] }, 2, 7),
        (_, _) => Op::new(Kind::Rst { addr: (y as u16) * 8 }, 1, 11),
    }
}

const fn cb_op(opcode: u8) -> Op {
    let y = (opcode >> 3) & 7;
    let r = R[(opcode & 7) as usize];
    match opcode >> 6 {
        0 => Op::new(
            Kind::Rot { op: ROT[y as usize], operand: r, copy: None },
            2,
            mem_cost(r, 8, 15),
        ),
        1 => Op::new(Kind::Bit { bit: y, operand: r }, 2, mem_cost(r, 8, 12)),
        2 => Op::new(Kind::Res { bit: y, operand: r, copy: None }, 2, mem_cost(r, 8, 15)),
        _ => Op::new(Kind::Set { bit: y, operand: r, copy: None }, 2, mem_cost(r, 8, 15)),
    }
}

const fn ed_op(opcode: u8) -> Op {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = (y >> 1) as usize;
    let q = y & 1;

    match (x, z) {
        (1, 0) if y == 6 => Op::new(Kind::InC { dst: None }, 2, 12),
        (1, 0) => Op::new(Kind::InC { dst: Some(R[y as usize]) }, 2, 12),
        (1, 1) if y == 6 => Op::new(Kind::OutC { src: None }, 2, 12),
        (1, 1) => Op::new(Kind::OutC { src: Some(R[y as usize]) }, 2, 12),
        (1, 2) if q == 0 => Op::new(Kind::SbcHl { src: RP[p] }, 2, 15),
        (1, 2) => Op::new(Kind::AdcHl { src: RP[p] }, 2, 15),
        (1, 3) if q == 0 => Op::new(Kind::LdAbsRp { rp: RP[p] }, 4, 20),
        (1, 3) => Op::new(Kind::LdRpAbs { rp: RP[p] }, 4, 20),
        (1, 4) => Op::new(Kind::Neg, 2, 8),
        (1, 5) if y == 1 => Op::new(Kind::Reti, 2, 14),
        (1, 5) => Op::new(Kind::Retn, 2, 14),
        (1, 6) => Op::new(Kind::Im { mode: IM[y as usize] }, 2, 8),
        (1, _) => match y {
            0 => Op::new(Kind::LdIA, 2, 9),
            1 => Op::new(Kind::LdRA, 2, 9),
            2 => Op::new(Kind::LdAI, 2, 9),
            3 => Op::new(Kind::LdAR, 2, 9),
            4 => Op::new(Kind::Rrd, 2, 18),
            5 => Op::new(Kind::Rld, 2, 18),
            _ => Op::new(Kind::EdNop, 2, 8),
        },
        (2, 0..=3) if y >= 4 => {
            let op = match z {
                0 => BlockOp::Ld,
                1 => BlockOp::Cp,
                2 => BlockOp::In,
                _ => BlockOp::Out,
            };
            let dir = if y & 1 == 0 { Dir::Inc } else { Dir::Dec };
            Op::new(Kind::Block { op, dir, repeat: y >= 6 }, 2, 16)
        }
        _ => Op::new(Kind::EdNop, 2, 8),
    }
}

/// H and L become the index register halves; `(HL)` is left for the caller.
const fn index_half(r: Operand) -> Operand {
    match r {
        Operand::H => Operand::IdxH,
        Operand::L => Operand::IdxL,
        other => other,
    }
}

const fn uses_hl_half(r: Operand) -> bool {
    matches!(r, Operand::H | Operand::L)
}

const fn index_rp(rp: Rp) -> Rp {
    match rp {
        Rp::Hl => Rp::Idx,
        other => other,
    }
}

/// DD/FD page, derived from MAIN. `(HL)` forms gain a displacement byte and
/// 12 t-states (8 for `LD (IX+d),n`, which overlaps the operand fetch with
/// the address calculation); H/L/HL forms cost the prefix's 4 t-states.
const fn index_op(opcode: u8) -> Op {
    const MEM: u8 = 1;
    const REG: u8 = 2;

    let base = main_op(opcode);
    let (kind, form) = match base.kind {
        Kind::Ld { dst: Operand::HlMem, src } => (Kind::Ld { dst: Operand::IdxMem, src }, MEM),
        Kind::Ld { dst, src: Operand::HlMem } => (Kind::Ld { dst, src: Operand::IdxMem }, MEM),
        Kind::Ld { dst, src } if uses_hl_half(dst) || uses_hl_half(src) => (
            Kind::Ld { dst: index_half(dst), src: index_half(src) },
            REG,
        ),
        Kind::LdImm { dst: Operand::HlMem } => {
            return Op::new(Kind::LdImm { dst: Operand::IdxMem }, base.len + 2, base.t_states + 9);
        }
        Kind::LdImm { dst } if uses_hl_half(dst) => (Kind::LdImm { dst: index_half(dst) }, REG),
        Kind::IncR { r: Operand::HlMem } => (Kind::IncR { r: Operand::IdxMem }, MEM),
        Kind::IncR { r } if uses_hl_half(r) => (Kind::IncR { r: index_half(r) }, REG),
        Kind::DecR { r: Operand::HlMem } => (Kind::DecR { r: Operand::IdxMem }, MEM),
        Kind::DecR { r } if uses_hl_half(r) => (Kind::DecR { r: index_half(r) }, REG),
        Kind::Alu { op, src: Operand::HlMem } => (Kind::Alu { op, src: Operand::IdxMem }, MEM),
        Kind::Alu { op, src } if uses_hl_half(src) => (Kind::Alu { op, src: index_half(src) }, REG),
        Kind::LdRpImm { rp: Rp::Hl } => (Kind::LdRpImm { rp: Rp::Idx }, REG),
        Kind::LdRpAbs { rp: Rp::Hl } => (Kind::LdRpAbs { rp: Rp::Idx }, REG),
        Kind::LdAbsRp { rp: Rp::Hl } => (Kind::LdAbsRp { rp: Rp::Idx }, REG),
        Kind::IncRp { rp: Rp::Hl } => (Kind::IncRp { rp: Rp::Idx }, REG),
        Kind::DecRp { rp: Rp::Hl } => (Kind::DecRp { rp: Rp::Idx }, REG),
        Kind::AddRp { dst: Rp::Hl, src } => (Kind::AddRp { dst: Rp::Idx, src: index_rp(src) }, REG),
        Kind::Push { rp: Rp::Hl } => (Kind::Push { rp: Rp::Idx }, REG),
        Kind::Pop { rp: Rp::Hl } => (Kind::Pop { rp: Rp::Idx }, REG),
        Kind::JpRp { rp: Rp::Hl } => (Kind::JpRp { rp: Rp::Idx }, REG),
        Kind::LdSpRp { rp: Rp::Hl } => (Kind::LdSpRp { rp: Rp::Idx }, REG),
        Kind::ExSp { rp: Rp::Hl } => (Kind::ExSp { rp: Rp::Idx }, REG),
        Kind::Prefix(Prefix::Cb) => return Op::new(Kind::IndexCb, 2, 8),
        Kind::Prefix(prefix) => return Op::new(Kind::Prefix(prefix), 1, 4),
        _ => (Kind::Unindexed, REG),
    };

    if form == MEM {
        Op::new(kind, base.len + 2, base.t_states + 12)
    } else {
        Op::new(kind, base.len + 1, base.t_states + 4)
    }
}

/// DDCB/FDCB page. The operand is always `(IX+d)`; non-BIT forms with a
/// register field other than 6 also copy the result into that register.
const fn index_cb_op(opcode: u8) -> Op {
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let copy = if z == 6 { None } else { Some(R[z as usize]) };
    let operand = Operand::IdxMem;
    match opcode >> 6 {
        0 => Op::new(Kind::Rot { op: ROT[y as usize], operand, copy }, 4, 23),
        1 => Op::new(Kind::Bit { bit: y, operand }, 4, 20),
        2 => Op::new(Kind::Res { bit: y, operand, copy }, 4, 23),
        _ => Op::new(Kind::Set { bit: y, operand, copy }, 4, 23),
    }
}

macro_rules! table {
    ($decode:ident) => {{
        let mut table = [Op::new(Kind::Nop, 1, 4); 256];
        let mut i = 0;
        while i < 256 {
            table[i] = $decode(i as u8);
            i += 1;
        }
        table
    }};
}

/// Unprefixed opcodes.
pub static MAIN: [Op; 256] = table!(main_op);
/// CB-prefixed opcodes.
pub static CB: [Op; 256] = table!(cb_op);
/// ED-prefixed opcodes.
pub static ED: [Op; 256] = table!(ed_op);
/// DD/FD-prefixed opcodes.
pub static INDEX: [Op; 256] = table!(index_op);
/// DDCB/FDCB opcodes (the byte after the displacement).
pub static INDEX_CB: [Op; 256] = table!(index_cb_op);
