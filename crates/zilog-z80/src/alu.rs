//! ALU operations for the Z80.
//!
//! Every function is pure: it takes operands (and the incoming carry where
//! the instruction uses it) and returns the result with a complete flag
//! byte. Callers merge in any flags the instruction preserves.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::decode::{AluOp, RotOp};
use crate::flags::{CF, HF, NF, PF, SF, XYF, ZF, pf_if, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Dispatch one of the eight accumulator operations.
#[must_use]
pub fn alu8(op: AluOp, a: u8, b: u8, carry: bool) -> AluResult {
    match op {
        AluOp::Add => add8(a, b, false),
        AluOp::Adc => add8(a, b, carry),
        AluOp::Sub => sub8(a, b, false),
        AluOp::Sbc => sub8(a, b, carry),
        AluOp::And => and8(a, b),
        AluOp::Xor => xor8(a, b),
        AluOp::Or => or8(a, b),
        AluOp::Cp => cp8(a, b),
    }
}

#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let result = wide as u8;

    let mut flags = sz53(result);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    // Same-sign operands, different-sign result.
    if (a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0 {
        flags |= PF;
    }
    if wide > 0xFF {
        flags |= CF;
    }
    AluResult { value: result, flags }
}

#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = NF | sz53(result);
    if (a & 0x0F) < (b & 0x0F) + c {
        flags |= HF;
    }
    if (a ^ b) & 0x80 != 0 && (b ^ result) & 0x80 == 0 {
        flags |= PF;
    }
    if u16::from(a) < u16::from(b) + u16::from(c) {
        flags |= CF;
    }
    AluResult { value: result, flags }
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult { value, flags: sz53p(value) | HF }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult { value, flags: sz53p(value) }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult { value, flags: sz53p(value) }
}

/// Compare. The result is discarded; bits 3/5 come from the operand.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let mut result = sub8(a, b, false);
    result.flags = (result.flags & !XYF) | (b & XYF);
    result.value = a;
    result
}

/// INC r. Carry is not produced; the caller keeps the old C.
#[must_use]
pub fn inc8(a: u8) -> AluResult {
    let value = a.wrapping_add(1);
    let mut flags = sz53(value);
    if a & 0x0F == 0x0F {
        flags |= HF;
    }
    flags |= pf_if(a == 0x7F);
    AluResult { value, flags }
}

/// DEC r. Carry is not produced; the caller keeps the old C.
#[must_use]
pub fn dec8(a: u8) -> AluResult {
    let value = a.wrapping_sub(1);
    let mut flags = NF | sz53(value);
    if a & 0x0F == 0 {
        flags |= HF;
    }
    flags |= pf_if(a == 0x80);
    AluResult { value, flags }
}

/// CB-prefixed rotate or shift of `a`.
#[must_use]
pub fn rot8(op: RotOp, a: u8, carry: bool) -> AluResult {
    let (value, out) = match op {
        RotOp::Rlc => (a.rotate_left(1), a >> 7),
        RotOp::Rrc => (a.rotate_right(1), a & 1),
        RotOp::Rl => ((a << 1) | u8::from(carry), a >> 7),
        RotOp::Rr => ((a >> 1) | (u8::from(carry) << 7), a & 1),
        RotOp::Sla => (a << 1, a >> 7),
        RotOp::Sra => ((a >> 1) | (a & 0x80), a & 1),
        RotOp::Sll => ((a << 1) | 1, a >> 7),
        RotOp::Srl => (a >> 1, a & 1),
    };
    AluResult { value, flags: sz53p(value) | out }
}

/// RLCA/RRCA/RLA/RRA. Only H, N and C change, plus bits 3/5 from the result;
/// S, Z and P/V are carried over from `flags`.
#[must_use]
pub fn rot_a(op: RotOp, a: u8, flags: u8) -> AluResult {
    let rotated = rot8(op, a, flags & CF != 0);
    AluResult {
        value: rotated.value,
        flags: (flags & (SF | ZF | PF)) | (rotated.value & XYF) | (rotated.flags & CF),
    }
}

/// Decimal adjust after an 8-bit add or subtract.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let mut correction = 0u8;
    let mut carry = flags & CF;
    if flags & HF != 0 || a & 0x0F > 9 {
        correction = 0x06;
    }
    if carry != 0 || a > 0x99 {
        correction |= 0x60;
        carry = CF;
    }

    let result = if flags & NF != 0 {
        sub8(a, correction, false)
    } else {
        add8(a, correction, false)
    };
    AluResult {
        value: result.value,
        flags: (result.flags & HF) | sz53p(result.value) | (flags & NF) | carry,
    }
}

/// ADD HL,rp (and the IX/IY forms). S, Z and P/V are preserved by the
/// caller; this returns only H, C and bits 3/5 from the result high byte.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;

    let mut flags = ((result >> 8) as u8) & XYF;
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= HF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }
    (result, flags)
}

#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let wide = u32::from(a) + u32::from(b) + u32::from(c);
    let result = wide as u16;

    let mut flags = ((result >> 8) as u8) & (SF | XYF);
    if result == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) + (b & 0x0FFF) + c > 0x0FFF {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0 {
        flags |= PF;
    }
    if wide > 0xFFFF {
        flags |= CF;
    }
    (result, flags)
}

#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u16::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let mut flags = NF | (((result >> 8) as u8) & (SF | XYF));
    if result == 0 {
        flags |= ZF;
    }
    if (a & 0x0FFF) < (b & 0x0FFF) + c {
        flags |= HF;
    }
    if (a ^ b) & 0x8000 != 0 && (b ^ result) & 0x8000 == 0 {
        flags |= PF;
    }
    if u32::from(a) < u32::from(b) + u32::from(c) {
        flags |= CF;
    }
    (result, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::YF;

    #[test]
    fn add_overflow_into_sign() {
        let r = add8(0x7F, 0x01, false);
        assert_eq!(r.value, 0x80);
        assert_eq!(r.flags, SF | HF | PF);
    }

    #[test]
    fn sub_borrow_sets_carry() {
        let r = sub8(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert_eq!(r.flags, SF | YF | crate::flags::XF | HF | NF | CF);
    }

    #[test]
    fn cp_takes_undocumented_bits_from_operand() {
        let r = cp8(0x00, 0x28);
        assert_eq!(r.flags & XYF, 0x28);
        assert_eq!(r.value, 0x00);
    }

    #[test]
    fn daa_after_bcd_add() {
        // 0x15 + 0x27 = 0x3C, adjusted to 0x42.
        let sum = add8(0x15, 0x27, false);
        let r = daa(sum.value, sum.flags);
        assert_eq!(r.value, 0x42);
        assert_eq!(r.flags & CF, 0);
    }

    #[test]
    fn sll_shifts_in_a_one() {
        let r = rot8(RotOp::Sll, 0x80, false);
        assert_eq!(r.value, 0x01);
        assert_eq!(r.flags & CF, CF);
    }

    #[test]
    fn sbc16_to_zero() {
        let (value, flags) = sbc16(0x1000, 0x0FFF, true);
        assert_eq!(value, 0);
        assert_eq!(flags & (ZF | NF), ZF | NF);
    }
}
