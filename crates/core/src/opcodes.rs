//! LS-8 instruction encoding.
//!
//! Every property of an instruction is derived from fixed bit positions
//! of its opcode byte:
//!
//! ```text
//! bit  7 6 5 4 3 2 1 0
//!      A A B C - D D D
//! ```
//!
//! - `AA` — operand count: bytes following the opcode that belong to it
//! - `B`  — ALU op: route to the arithmetic/comparison unit
//! - `C`  — sets PC: route to the flow unit, which then owns the PC advance
//! - `DDD` — selector within the chosen unit's dispatch
//!
//! [`decode`] is pure classification; whether a selector actually exists
//! in a unit's table is the unit's concern.

// Core control
pub const HLT: u8 = 0b0000_0001;
pub const LDI: u8 = 0b1000_0010;
pub const PRN: u8 = 0b0100_0111;
pub const PUSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
// ALU
pub const ADD: u8 = 0b1010_0000;
pub const MUL: u8 = 0b1010_0010;
pub const CMP: u8 = 0b1010_0111;
// Flow control
pub const CALL: u8 = 0b0101_0000;
pub const RET: u8 = 0b0001_0001;
pub const JMP: u8 = 0b0101_0100;
pub const JEQ: u8 = 0b0101_0101;
pub const JNE: u8 = 0b0101_0110;

/// Low three bits of the opcode select within a unit's dispatch table.
pub const SELECTOR_MASK: u8 = 0b0000_0111;

// Per-unit selectors
pub const SEL_HLT: u8 = HLT & SELECTOR_MASK;
pub const SEL_LDI: u8 = LDI & SELECTOR_MASK;
pub const SEL_PRN: u8 = PRN & SELECTOR_MASK;
pub const SEL_PUSH: u8 = PUSH & SELECTOR_MASK;
pub const SEL_POP: u8 = POP & SELECTOR_MASK;
pub const SEL_ADD: u8 = ADD & SELECTOR_MASK;
pub const SEL_MUL: u8 = MUL & SELECTOR_MASK;
pub const SEL_CMP: u8 = CMP & SELECTOR_MASK;
pub const SEL_CALL: u8 = CALL & SELECTOR_MASK;
pub const SEL_RET: u8 = RET & SELECTOR_MASK;
pub const SEL_JMP: u8 = JMP & SELECTOR_MASK;
pub const SEL_JEQ: u8 = JEQ & SELECTOR_MASK;
pub const SEL_JNE: u8 = JNE & SELECTOR_MASK;

/// Opcode classification derived from its bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Bytes following the opcode that belong to this instruction
    pub operand_count: u8,
    /// Route to the ALU
    pub is_alu: bool,
    /// Route to the flow unit, which becomes responsible for the PC
    pub sets_pc: bool,
    /// Index into the chosen unit's dispatch
    pub selector: u8,
}

/// Classify a raw opcode byte. Pure; no table lookup happens here.
#[inline(always)]
pub fn decode(opcode: u8) -> Decoded {
    Decoded {
        operand_count: opcode >> 6,
        is_alu: opcode & 0b0010_0000 != 0,
        sets_pc: opcode & 0b0001_0000 != 0,
        selector: opcode & SELECTOR_MASK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_counts() {
        assert_eq!(decode(HLT).operand_count, 0);
        assert_eq!(decode(RET).operand_count, 0);
        assert_eq!(decode(PRN).operand_count, 1);
        assert_eq!(decode(PUSH).operand_count, 1);
        assert_eq!(decode(CALL).operand_count, 1);
        assert_eq!(decode(JMP).operand_count, 1);
        assert_eq!(decode(LDI).operand_count, 2);
        assert_eq!(decode(ADD).operand_count, 2);
        assert_eq!(decode(CMP).operand_count, 2);
    }

    #[test]
    fn test_unit_routing() {
        for op in [ADD, MUL, CMP] {
            let d = decode(op);
            assert!(d.is_alu && !d.sets_pc, "0b{:08b} routes to the ALU", op);
        }
        for op in [CALL, RET, JMP, JEQ, JNE] {
            let d = decode(op);
            assert!(d.sets_pc && !d.is_alu, "0b{:08b} routes to flow control", op);
        }
        for op in [HLT, LDI, PRN, PUSH, POP] {
            let d = decode(op);
            assert!(!d.sets_pc && !d.is_alu, "0b{:08b} routes to core control", op);
        }
    }

    #[test]
    fn test_selectors_are_low_bits() {
        assert_eq!(decode(LDI).selector, 0b010);
        assert_eq!(decode(CMP).selector, 0b111);
        assert_eq!(decode(CALL).selector, 0b000);
        assert_eq!(decode(JNE).selector, 0b110);
    }

    #[test]
    fn test_decode_is_pure_classification() {
        // An undefined byte still decodes to a well-formed shape.
        let d = decode(0b0100_0000);
        assert_eq!(d.operand_count, 1);
        assert!(!d.is_alu);
        assert!(!d.sets_pc);
        assert_eq!(d.selector, 0);
    }
}
