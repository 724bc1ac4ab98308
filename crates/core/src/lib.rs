//! # ls8-core
//!
//! Emulation core for the LS-8, an 8-bit von-Neumann machine (v0.3.0):
//! 256 bytes of RAM, eight general-purpose registers, three condition
//! flags, and a fixed 8-bit instruction encoding where the opcode byte
//! itself selects operand count, destination class, and execution unit.
//!
//! ## Architecture
//!
//! - [`Ls8`] — Top-level machine that wires together CPU, memory, and the
//!   diagnostic facilities
//! - [`Cpu`] — CPU state (PC, IR, register file, flags, running, tick counter)
//! - [`Memory`] — Flat 256-byte RAM with range-checked access
//! - [`opcodes`] — Opcode byte constants and the bit-field decoder
//! - [`loader`] — Binary-text program image parser
//! - [`disasm`] — Instruction disassembler for debug views
//! - [`profiler`] — Execution profiler with PC histogram and call graph
//! - [`debugger`] — RAM viewer and watchpoints
//! - [`savestate`] — Machine state snapshots saved to disk
//!
//! ## Execution model
//!
//! The machine is Ready after construction, Running once [`Ls8::run`] sets
//! the running flag, and Halted when HLT clears it. Each cycle fetches the
//! opcode plus two speculative operand bytes, decodes the opcode's bit
//! fields, dispatches to the core/ALU/flow unit, and advances the PC by
//! `1 + operand_count` unless a flow instruction claimed it.
//!
//! Out-of-bounds accesses, stack limit violations, and unknown opcodes are
//! reported on stderr and the loop keeps ticking; only HLT and an
//! unsupported ALU selector end a run.

pub mod cpu;
pub mod memory;
pub mod opcodes;
pub mod loader;
pub mod disasm;
pub mod debugger;
pub mod profiler;
pub mod savestate;

pub use cpu::{Cpu, Flags};
pub use memory::Memory;

use std::fmt;

/// RAM size in bytes.
pub const MEM_SIZE: usize = 256;
/// Number of general-purpose registers (R0–R7).
pub const REG_COUNT: usize = 8;
/// Register reserved as the stack pointer.
pub const SP_REG: usize = 7;
/// Initial stack pointer value; the stack grows downward from here.
pub const SP_INIT: u8 = 0xF4;

// FL register bit positions
pub const FL_L: u8 = 2;
pub const FL_G: u8 = 1;
pub const FL_E: u8 = 0;

/// Extract the register index from an operand byte (low 3 bits).
#[inline(always)]
pub fn reg_index(operand: u8) -> usize {
    (operand as usize) & (REG_COUNT - 1)
}

/// Runtime error raised by the machine.
///
/// Only [`VmError::UnsupportedAluOp`] is fatal to a run; every other kind
/// is reported on stderr and recovered from locally, preserving the lenient
/// legacy behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Memory address outside `[0, MEM_SIZE)`.
    OutOfBounds { addr: usize },
    /// A push would move SP below address 0.
    StackOverflow,
    /// A pop would move SP past the top of memory.
    StackUnderflow,
    /// Opcode selector missing from the dispatched unit's table.
    UnknownOpcode { opcode: u8, pc: usize },
    /// ALU selector outside {ADD, MUL, CMP}.
    UnsupportedAluOp { opcode: u8 },
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::OutOfBounds { addr } => {
                write!(f, "memory access out of bounds: address 0x{:X} (valid 0x00-0x{:02X})",
                    addr, MEM_SIZE - 1)
            }
            VmError::StackOverflow => {
                write!(f, "stack overflow: SP would move below address 0x00")
            }
            VmError::StackUnderflow => {
                write!(f, "stack underflow: SP would move past the top of memory")
            }
            VmError::UnknownOpcode { opcode, pc } => {
                write!(f, "unknown opcode 0b{:08b} at pc=0x{:02X}", opcode, pc)
            }
            VmError::UnsupportedAluOp { opcode } => {
                write!(f, "unsupported ALU operation 0b{:08b}", opcode)
            }
        }
    }
}

impl std::error::Error for VmError {}

/// The LS-8 machine: CPU, RAM, and diagnostic subsystems.
pub struct Ls8 {
    pub cpu: Cpu,
    pub mem: Memory,
    /// PRN output bytes, drained by the frontend
    pub output: Vec<u8>,
    /// Emit a trace line on stderr before every cycle
    pub trace_enabled: bool,
    /// Breakpoint addresses (checked at the top of each cycle)
    pub breakpoints: Vec<usize>,
    /// True if execution stopped at a breakpoint or watchpoint
    pub breakpoint_hit: bool,
    /// Execution profiler (zero-cost when disabled)
    pub profiler: profiler::Profiler,
    /// Watchpoints and RAM viewer
    pub debugger: debugger::Debugger,
}

impl Ls8 {
    /// Create a new machine with zeroed RAM and SP at [`SP_INIT`].
    pub fn new() -> Self {
        Ls8 {
            cpu: Cpu::new(),
            mem: Memory::new(),
            output: Vec::new(),
            trace_enabled: false,
            breakpoints: Vec::new(),
            breakpoint_hit: false,
            profiler: profiler::Profiler::new(),
            debugger: debugger::Debugger::new(),
        }
    }

    /// Reset CPU and RAM to power-on state.
    ///
    /// Breakpoints and watchpoints are preserved across resets.
    pub fn reset(&mut self) {
        self.cpu = Cpu::new();
        self.mem.ram.fill(0);
        self.output.clear();
        self.breakpoint_hit = false;
    }

    /// Parse a binary-text program image and load it at address 0.
    ///
    /// The machine is reset first; a parse error leaves it untouched.
    /// Returns the number of bytes loaded.
    pub fn load_image(&mut self, text: &str) -> Result<usize, String> {
        let mut staged = [0u8; MEM_SIZE];
        let size = loader::parse_image(text, &mut staged)?;
        self.reset();
        self.mem.ram.copy_from_slice(&staged);
        Ok(size)
    }

    /// Run until HLT, a breakpoint, or a fatal error.
    pub fn run(&mut self) -> Result<(), VmError> {
        self.run_for(u64::MAX)
    }

    /// Run for at most `max_cycles` cycles.
    ///
    /// Returns early with `breakpoint_hit` set when the PC lands on a
    /// breakpoint or a watchpoint fires. A fatal error propagates; the
    /// lenient kinds are reported inside [`Ls8::step`] and do not stop
    /// the loop.
    pub fn run_for(&mut self, max_cycles: u64) -> Result<(), VmError> {
        self.cpu.running = true;
        let mut executed = 0u64;
        while self.cpu.running && executed < max_cycles {
            if !self.breakpoints.is_empty() && self.breakpoints.contains(&self.cpu.pc) {
                self.breakpoint_hit = true;
                return Ok(());
            }
            if self.debugger.watch_hit.is_some() {
                self.breakpoint_hit = true;
                return Ok(());
            }
            self.step()?;
            executed += 1;
        }
        Ok(())
    }

    /// Execute a single fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<(), VmError> {
        let pc = self.cpu.pc;

        if self.trace_enabled {
            eprintln!("{}", self.trace_line());
        }

        let opcode = match self.mem.read(pc) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("ls8: {}", e);
                0
            }
        };
        self.cpu.ir = opcode;

        // Speculative operand fetch: unused bytes are discarded, and reads
        // past the end of memory yield 0.
        let operand_a = self.mem.read(pc + 1).unwrap_or(0);
        let operand_b = self.mem.read(pc + 2).unwrap_or(0);

        let decoded = opcodes::decode(opcode);

        if self.profiler.enabled {
            self.profiler.record(pc);
            if decoded.sets_pc {
                match decoded.selector {
                    opcodes::SEL_CALL => {
                        let target = self.cpu.reg[reg_index(operand_a)] as usize;
                        self.profiler.record_call(pc, target);
                    }
                    opcodes::SEL_RET => self.profiler.record_ret(),
                    _ => {}
                }
            }
        }

        self.execute(opcode, decoded, operand_a, operand_b)?;
        self.cpu.tick += 1;
        Ok(())
    }

    /// Execute a single cycle and return the disassembly of what ran.
    ///
    /// Used by the step debugger.
    pub fn step_one(&mut self) -> Result<String, VmError> {
        let pc = self.cpu.pc;
        let opcode = self.mem.read(pc).unwrap_or(0);
        let a = self.mem.read(pc + 1).unwrap_or(0);
        let b = self.mem.read(pc + 2).unwrap_or(0);
        let asm = disasm::disassemble(opcode, a, b);
        self.step()?;
        Ok(format!("0x{:02X}: {}", pc, asm))
    }

    /// Disassemble the instruction at the current PC without executing it.
    pub fn disasm_at_pc(&self) -> String {
        let pc = self.cpu.pc;
        let opcode = self.mem.read(pc).unwrap_or(0);
        let a = self.mem.read(pc + 1).unwrap_or(0);
        let b = self.mem.read(pc + 2).unwrap_or(0);
        format!("0x{:02X}: {}", pc, disasm::disassemble(opcode, a, b))
    }

    /// Format the legacy one-line trace: PC, the next three memory bytes,
    /// and all eight registers, two-digit hex.
    pub fn trace_line(&self) -> String {
        let pc = self.cpu.pc;
        let mut s = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            self.mem.read(pc).unwrap_or(0),
            self.mem.read(pc + 1).unwrap_or(0),
            self.mem.read(pc + 2).unwrap_or(0),
        );
        for r in &self.cpu.reg {
            s.push_str(&format!(" {:02X}", r));
        }
        s
    }

    /// Format a register dump with R0-R7, PC, SP, FL, and cycle count.
    pub fn dump_regs(&self) -> String {
        let mut s = String::new();
        for (i, r) in self.cpu.reg.iter().enumerate() {
            s.push_str(&format!("R{}={:02X} ", i, r));
        }
        s.push_str(&format!(
            "\nPC={:02X} SP={:02X} FL={} ({:03b}) tick={}",
            self.cpu.pc,
            self.cpu.reg[SP_REG],
            disasm::format_flags(self.cpu.fl),
            self.cpu.fl.bits(),
            self.cpu.tick,
        ));
        s
    }

    /// Take and clear accumulated PRN output bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Dump a RAM region as hex + ASCII.
    pub fn dump_ram(&self, start: usize, length: usize) -> String {
        debugger::dump_ram(&self.mem.ram, start, length)
    }

    /// Get the profiler report string.
    pub fn profiler_report(&self) -> String {
        self.profiler.report(&self.mem.ram)
    }

    // --- Data access with watchpoint hooks ---

    /// Read RAM, firing read watchpoints.
    pub fn read_ram(&mut self, addr: usize) -> Result<u8, VmError> {
        let v = self.mem.read(addr)?;
        if !self.debugger.watchpoints.is_empty() {
            self.debugger.check_read(addr, v);
        }
        Ok(v)
    }

    /// Write RAM, firing write watchpoints.
    pub fn write_ram(&mut self, addr: usize, value: u8) -> Result<(), VmError> {
        if !self.debugger.watchpoints.is_empty() {
            let old = self.mem.read(addr).unwrap_or(0);
            self.debugger.check_write(addr, old, value);
        }
        self.mem.write(addr, value)
    }
}

impl Default for Ls8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let m = Ls8::new();
        assert_eq!(m.cpu.pc, 0);
        assert!(!m.cpu.running);
        assert_eq!(m.cpu.reg[SP_REG], SP_INIT);
        assert!(m.mem.ram.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_print8_scenario() {
        // LDI R0,8 / PRN R0 / HLT
        let mut m = Ls8::new();
        m.mem.ram[..6].copy_from_slice(&[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]);
        m.run().unwrap();
        assert_eq!(m.take_output(), b"8\n");
        assert_eq!(m.cpu.pc, 6);
        assert!(!m.cpu.running);
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut m = Ls8::new();
        m.mem.ram[..6].copy_from_slice(&[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]);
        m.breakpoints.push(3);
        m.run().unwrap();
        assert!(m.breakpoint_hit);
        assert_eq!(m.cpu.pc, 3);
        assert!(m.output.is_empty());
        // resume: step past the breakpoint, then run to completion
        m.breakpoint_hit = false;
        m.step().unwrap();
        m.run().unwrap();
        assert_eq!(m.take_output(), b"8\n");
    }

    #[test]
    fn test_run_for_budget() {
        // JMP R0 with R0=0 jumps to itself forever
        let mut m = Ls8::new();
        m.mem.ram[0] = 0b0101_0100;
        m.run_for(100).unwrap();
        assert!(m.cpu.running);
        assert_eq!(m.cpu.tick, 100);
    }

    #[test]
    fn test_trace_line_format() {
        let mut m = Ls8::new();
        m.mem.ram[..3].copy_from_slice(&[0b1000_0010, 0, 8]);
        assert_eq!(
            m.trace_line(),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4"
        );
    }

    #[test]
    fn test_fetch_past_end_keeps_ticking() {
        // With no HLT the PC walks off the end of memory; failed fetches
        // substitute 0 and the loop keeps going.
        let mut m = Ls8::new();
        m.cpu.pc = 255;
        m.run_for(10).unwrap();
        assert!(m.cpu.running);
        assert_eq!(m.cpu.tick, 10);
        assert_eq!(m.cpu.pc, 265);
    }

    #[test]
    fn test_load_failure_leaves_machine_zeroed() {
        let mut m = Ls8::new();
        assert!(m.load_image("10000010\nnot-binary\n").is_err());
        assert!(m.mem.ram.iter().all(|&b| b == 0));
        assert_eq!(m.cpu.pc, 0);
    }
}
