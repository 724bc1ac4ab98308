//! LS-8 disassembler.
//!
//! Turns raw instruction bytes back into mnemonic form for the trace,
//! step debugger, and profiler report. Operand bytes that name a register
//! render as `Rn`; immediates render as hex.

use crate::cpu::Flags;
use crate::opcodes::{self, ADD, CALL, CMP, HLT, JEQ, JMP, JNE, LDI, MUL, POP, PRN, PUSH, RET};
use crate::reg_index;

/// Disassemble one instruction given its opcode byte and the two bytes
/// that follow it (extra bytes are ignored per the operand count).
pub fn disassemble(opcode: u8, a: u8, b: u8) -> String {
    match opcode {
        HLT => "HLT".into(),
        LDI => format!("LDI R{}, 0x{:02X}", reg_index(a), b),
        PRN => format!("PRN R{}", reg_index(a)),
        PUSH => format!("PUSH R{}", reg_index(a)),
        POP => format!("POP R{}", reg_index(a)),
        ADD => format!("ADD R{}, R{}", reg_index(a), reg_index(b)),
        MUL => format!("MUL R{}, R{}", reg_index(a), reg_index(b)),
        CMP => format!("CMP R{}, R{}", reg_index(a), reg_index(b)),
        CALL => format!("CALL R{}", reg_index(a)),
        RET => "RET".into(),
        JMP => format!("JMP R{}", reg_index(a)),
        JEQ => format!("JEQ R{}", reg_index(a)),
        JNE => format!("JNE R{}", reg_index(a)),
        _ => {
            // Undefined byte: show it as data plus where the decoder
            // would have routed it.
            let d = opcodes::decode(opcode);
            let unit = if d.is_alu {
                "alu"
            } else if d.sets_pc {
                "flow"
            } else {
                "core"
            };
            format!("DB 0x{:02X} ; ?{} sel={:03b}", opcode, unit, d.selector)
        }
    }
}

/// Render the flag register as `LGE` with `-` for clear bits.
pub fn format_flags(fl: Flags) -> String {
    format!(
        "{}{}{}",
        if fl.less() { 'L' } else { '-' },
        if fl.greater() { 'G' } else { '-' },
        if fl.equal() { 'E' } else { '-' },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_basic() {
        assert_eq!(disassemble(LDI, 0, 8), "LDI R0, 0x08");
        assert_eq!(disassemble(PRN, 3, 0xFF), "PRN R3");
        assert_eq!(disassemble(HLT, 0, 0), "HLT");
        assert_eq!(disassemble(RET, 0xAA, 0xBB), "RET");
        assert_eq!(disassemble(MUL, 0, 1), "MUL R0, R1");
        assert_eq!(disassemble(CALL, 2, 0), "CALL R2");
    }

    #[test]
    fn test_register_operands_use_low_bits() {
        assert_eq!(disassemble(PUSH, 0b1111_1010, 0), "PUSH R2");
    }

    #[test]
    fn test_unknown_byte_renders_as_data() {
        let s = disassemble(0b0100_0000, 0, 0);
        assert!(s.starts_with("DB 0x40"), "{}", s);
    }

    #[test]
    fn test_format_flags() {
        assert_eq!(format_flags(Flags::new()), "---");
        assert_eq!(format_flags(Flags::from_bits(0b001)), "--E");
        assert_eq!(format_flags(Flags::from_bits(0b100)), "L--");
        assert_eq!(format_flags(Flags::from_bits(0b010)), "-G-");
    }
}
