//! LS-8 CPU core.
//!
//! Holds the CPU state machine and the three execution units the decoder
//! routes to: core control (HLT, LDI, PRN, PUSH, POP), the ALU (ADD, MUL,
//! CMP), and flow control (CALL, RET, JMP, JEQ, JNE). Execution runs on
//! [`Ls8`] so stack traffic goes through the watchpoint-checked memory
//! paths.
//!
//! Flow instructions own the PC: when the decoder reports `sets_pc`, the
//! loop does not add `1 + operand_count` afterward, so even a conditional
//! jump that falls through must advance the PC itself.

use crate::opcodes::{self, Decoded};
use crate::{reg_index, VmError};
use crate::{FL_E, FL_G, FL_L, REG_COUNT, SP_INIT, SP_REG};

/// Condition flags set by CMP: Less, Greater, Equal.
///
/// The three bits are mutually exclusive and only ever replaced as a
/// whole by [`Flags::set_from_comparison`]; there is no per-bit setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    pub fn new() -> Self {
        Flags(0)
    }

    /// Replace all three bits from an unsigned comparison of `a` and `b`.
    pub fn set_from_comparison(&mut self, a: u8, b: u8) {
        self.0 = if a == b {
            1 << FL_E
        } else if a < b {
            1 << FL_L
        } else {
            1 << FL_G
        };
    }

    #[inline(always)]
    pub fn less(&self) -> bool {
        self.0 & (1 << FL_L) != 0
    }

    #[inline(always)]
    pub fn greater(&self) -> bool {
        self.0 & (1 << FL_G) != 0
    }

    #[inline(always)]
    pub fn equal(&self) -> bool {
        self.0 & (1 << FL_E) != 0
    }

    /// Raw FL byte (00000LGE).
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Rebuild from a raw FL byte (used by save states).
    pub fn from_bits(bits: u8) -> Self {
        Flags(bits & 0b111)
    }
}

/// CPU state for the LS-8.
///
/// The register file lives here (R0–R7, with R7 reserved as SP); RAM is
/// a separate address space in [`crate::Memory`].
pub struct Cpu {
    /// Program counter (byte address in RAM)
    pub pc: usize,
    /// Instruction register: the opcode fetched this cycle
    pub ir: u8,
    /// General-purpose registers; `reg[SP_REG]` is the stack pointer
    pub reg: [u8; REG_COUNT],
    /// Condition flags, written only by CMP
    pub fl: Flags,
    /// True while the fetch-execute loop should continue
    pub running: bool,
    /// Monotonic cycle counter
    pub tick: u64,
}

impl Cpu {
    pub fn new() -> Self {
        let mut reg = [0u8; REG_COUNT];
        reg[SP_REG] = SP_INIT;
        Cpu { pc: 0, ir: 0, reg, fl: Flags::new(), running: false, tick: 0 }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

// ---- Instruction execution on Ls8 ----

impl crate::Ls8 {
    /// Dispatch one decoded instruction to its execution unit.
    ///
    /// `a` and `b` are the two speculatively fetched operand bytes; units
    /// ignore the ones beyond the decoded operand count. The PC is
    /// advanced here for core and ALU instructions; flow instructions set
    /// it themselves. Returns `Err` only for the fatal unsupported-ALU
    /// case.
    pub fn execute(&mut self, opcode: u8, d: Decoded, a: u8, b: u8) -> Result<(), VmError> {
        if d.sets_pc {
            self.exec_flow(opcode, d, a);
        } else {
            if d.is_alu {
                self.exec_alu(opcode, a, b)?;
            } else {
                self.exec_core(opcode, d.selector, a, b);
            }
            self.cpu.pc += 1 + d.operand_count as usize;
        }
        Ok(())
    }

    /// Core control unit: halt, immediate load, output, stack push/pop.
    fn exec_core(&mut self, opcode: u8, selector: u8, a: u8, b: u8) {
        match selector {
            opcodes::SEL_HLT => self.cpu.running = false,
            opcodes::SEL_LDI => self.cpu.reg[reg_index(a)] = b,
            opcodes::SEL_PRN => {
                let v = self.cpu.reg[reg_index(a)];
                self.output.extend_from_slice(format!("{}\n", v).as_bytes());
            }
            opcodes::SEL_PUSH => {
                let v = self.cpu.reg[reg_index(a)];
                if let Err(e) = self.stack_push(v) {
                    eprintln!("ls8: {}", e);
                }
            }
            opcodes::SEL_POP => match self.stack_pop() {
                Ok(v) => self.cpu.reg[reg_index(a)] = v,
                Err(e) => eprintln!("ls8: {}", e),
            },
            _ => {
                eprintln!("ls8: {}", VmError::UnknownOpcode { opcode, pc: self.cpu.pc });
            }
        }
    }

    /// ALU: add, multiply, compare. Everything else is fatal.
    fn exec_alu(&mut self, opcode: u8, a: u8, b: u8) -> Result<(), VmError> {
        let ra = reg_index(a);
        let rb = reg_index(b);
        match opcode & opcodes::SELECTOR_MASK {
            opcodes::SEL_ADD => {
                self.cpu.reg[ra] = self.cpu.reg[ra].wrapping_add(self.cpu.reg[rb]);
            }
            opcodes::SEL_MUL => {
                self.cpu.reg[ra] = self.cpu.reg[ra].wrapping_mul(self.cpu.reg[rb]);
            }
            opcodes::SEL_CMP => {
                let (x, y) = (self.cpu.reg[ra], self.cpu.reg[rb]);
                self.cpu.fl.set_from_comparison(x, y);
            }
            _ => return Err(VmError::UnsupportedAluOp { opcode }),
        }
        Ok(())
    }

    /// Flow control unit. Always leaves the PC set, including on the
    /// not-taken branch of a conditional jump and on an unknown selector.
    fn exec_flow(&mut self, opcode: u8, d: Decoded, a: u8) {
        let fall_through = self.cpu.pc + 1 + d.operand_count as usize;
        let target = self.cpu.reg[reg_index(a)] as usize;
        match d.selector {
            opcodes::SEL_CALL => {
                // Return address lives in a byte cell, so it wraps mod 256
                // like everything else in memory.
                let ret = (self.cpu.pc + 2) as u8;
                if let Err(e) = self.stack_push(ret) {
                    eprintln!("ls8: {}", e);
                }
                self.cpu.pc = target;
            }
            opcodes::SEL_RET => match self.stack_pop() {
                Ok(addr) => self.cpu.pc = addr as usize,
                Err(e) => {
                    eprintln!("ls8: {}", e);
                    self.cpu.pc = fall_through;
                }
            },
            opcodes::SEL_JMP => self.cpu.pc = target,
            opcodes::SEL_JEQ => {
                self.cpu.pc = if self.cpu.fl.equal() { target } else { fall_through };
            }
            opcodes::SEL_JNE => {
                self.cpu.pc = if !self.cpu.fl.equal() { target } else { fall_through };
            }
            _ => {
                eprintln!("ls8: {}", VmError::UnknownOpcode { opcode, pc: self.cpu.pc });
                self.cpu.pc = fall_through;
            }
        }
    }

    /// Push a byte: decrement SP, then write at the new SP.
    pub(crate) fn stack_push(&mut self, v: u8) -> Result<(), VmError> {
        let sp = self.cpu.reg[SP_REG];
        let new_sp = sp.checked_sub(1).ok_or(VmError::StackOverflow)?;
        self.cpu.reg[SP_REG] = new_sp;
        self.write_ram(new_sp as usize, v)
    }

    /// Pop a byte: read at SP, then increment SP.
    ///
    /// Reading below the live stack returns whatever was last written
    /// there; the cell is not zeroed on pop. That contract is deliberate.
    pub(crate) fn stack_pop(&mut self) -> Result<u8, VmError> {
        let sp = self.cpu.reg[SP_REG];
        let new_sp = sp.checked_add(1).ok_or(VmError::StackUnderflow)?;
        let v = self.read_ram(sp as usize)?;
        self.cpu.reg[SP_REG] = new_sp;
        Ok(v)
    }
}
