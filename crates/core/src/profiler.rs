//! Execution profiler for LS-8 programs.
//!
//! Tracks instruction-level execution statistics:
//! - Per-address hit counts (PC histogram)
//! - Total instruction counts
//! - Top-N hotspot analysis with disassembly
//! - Call graph tracking (CALL/RET pairs)
//!
//! The profiler is zero-cost when disabled — all data lives in this struct,
//! and the machine calls [`Profiler::record`] only when enabled.

use std::collections::HashMap;

/// Execution profiler state.
pub struct Profiler {
    /// Whether profiling is currently active
    pub enabled: bool,
    /// Per-PC hit counts
    pc_hits: HashMap<usize, u64>,
    /// Total instructions executed while profiling
    pub total_instructions: u64,
    /// Total ticks elapsed while profiling
    pub total_ticks: u64,
    /// Tick counter at profiler start
    start_tick: u64,
    /// Call graph: (caller_pc, callee_pc) → count
    call_graph: HashMap<(usize, usize), u64>,
    /// Current call stack for tracking (limited depth)
    call_stack: Vec<usize>,
}

impl Profiler {
    pub fn new() -> Self {
        Profiler {
            enabled: false,
            pc_hits: HashMap::new(),
            total_instructions: 0,
            total_ticks: 0,
            start_tick: 0,
            call_graph: HashMap::new(),
            call_stack: Vec::new(),
        }
    }

    /// Start or restart profiling, clearing all accumulated data.
    pub fn start(&mut self, tick: u64) {
        self.pc_hits.clear();
        self.call_graph.clear();
        self.call_stack.clear();
        self.total_instructions = 0;
        self.total_ticks = 0;
        self.start_tick = tick;
        self.enabled = true;
    }

    /// Stop profiling, finalize tick count.
    pub fn stop(&mut self, tick: u64) {
        self.total_ticks = tick.saturating_sub(self.start_tick);
        self.enabled = false;
    }

    /// Record execution of an instruction at the given PC.
    #[inline]
    pub fn record(&mut self, pc: usize) {
        *self.pc_hits.entry(pc).or_insert(0) += 1;
        self.total_instructions += 1;
    }

    /// Record a CALL instruction.
    #[inline]
    pub fn record_call(&mut self, caller_pc: usize, target_pc: usize) {
        *self.call_graph.entry((caller_pc, target_pc)).or_insert(0) += 1;
        if self.call_stack.len() < 128 {
            self.call_stack.push(caller_pc);
        }
    }

    /// Record a RET instruction.
    #[inline]
    pub fn record_ret(&mut self) {
        self.call_stack.pop();
    }

    /// Get number of unique addresses executed.
    pub fn unique_addresses(&self) -> usize {
        self.pc_hits.len()
    }

    /// Get top-N hottest addresses by execution count.
    pub fn top_hits(&self, n: usize) -> Vec<(usize, u64)> {
        let mut v: Vec<_> = self.pc_hits.iter().map(|(&pc, &cnt)| (pc, cnt)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }

    /// Get top-N call edges by invocation count.
    pub fn top_calls(&self, n: usize) -> Vec<((usize, usize), u64)> {
        let mut v: Vec<_> = self.call_graph.iter()
            .map(|(&edge, &cnt)| (edge, cnt)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }

    /// Get flat profile: addresses grouped into contiguous ranges.
    /// Returns sorted vec of (start_addr, end_addr, total_hits).
    pub fn flat_profile(&self) -> Vec<(usize, usize, u64)> {
        if self.pc_hits.is_empty() { return vec![]; }
        let mut addrs: Vec<_> = self.pc_hits.keys().copied().collect();
        addrs.sort();

        let mut ranges = Vec::new();
        let mut start = addrs[0];
        let mut end = start;
        let mut hits = *self.pc_hits.get(&start).unwrap_or(&0);

        for &addr in &addrs[1..] {
            if addr <= end + 3 {
                // Contiguous (instructions span up to three bytes)
                end = addr;
                hits += self.pc_hits.get(&addr).unwrap_or(&0);
            } else {
                ranges.push((start, end, hits));
                start = addr;
                end = addr;
                hits = *self.pc_hits.get(&addr).unwrap_or(&0);
            }
        }
        ranges.push((start, end, hits));
        ranges.sort_by(|a, b| b.2.cmp(&a.2));
        ranges
    }

    /// Format a full profiling report, disassembling hotspots out of `ram`.
    pub fn report(&self, ram: &[u8]) -> String {
        let mut s = String::new();
        s.push_str("=== Profiler Report ===\n");
        s.push_str(&format!("Instructions: {}\n", self.total_instructions));
        s.push_str(&format!("Unique addresses: {}\n", self.unique_addresses()));

        s.push_str("\n--- Top 20 Hotspots ---\n");
        s.push_str(&format!("{:>6}  {:>6}  {:>7}  {}\n", "Addr", "Hits", "%", "Instruction"));
        for (pc, cnt) in self.top_hits(20) {
            let pct = if self.total_instructions > 0 {
                cnt as f64 / self.total_instructions as f64 * 100.0
            } else { 0.0 };
            let opcode = ram.get(pc).copied().unwrap_or(0);
            let a = ram.get(pc + 1).copied().unwrap_or(0);
            let b = ram.get(pc + 2).copied().unwrap_or(0);
            let asm = crate::disasm::disassemble(opcode, a, b);
            s.push_str(&format!("  0x{:02X}  {:>6}  {:>6.2}%  {}\n", pc, cnt, pct, asm));
        }

        let calls = self.top_calls(10);
        if !calls.is_empty() {
            s.push_str("\n--- Top 10 Call Edges ---\n");
            s.push_str(&format!("{:>6} → {:>6}  {:>6}\n", "Caller", "Callee", "Count"));
            for ((from, to), cnt) in calls {
                s.push_str(&format!("  0x{:02X} →   0x{:02X}  {:>6}\n", from, to, cnt));
            }
        }

        let blocks = self.flat_profile();
        if !blocks.is_empty() {
            s.push_str("\n--- Hot Regions ---\n");
            for (start, end, hits) in blocks.iter().take(10) {
                let pct = if self.total_instructions > 0 {
                    *hits as f64 / self.total_instructions as f64 * 100.0
                } else { 0.0 };
                s.push_str(&format!("  0x{:02X}–0x{:02X}  {:>6} hits  ({:.1}%)\n",
                    start, end, hits, pct));
            }
        }

        s
    }
}

impl Default for Profiler {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_basic() {
        let mut p = Profiler::new();
        p.start(0);
        p.record(0x10);
        p.record(0x10);
        p.record(0x13);
        p.record(0x10);
        assert_eq!(p.total_instructions, 4);
        assert_eq!(p.unique_addresses(), 2);
        let top = p.top_hits(1);
        assert_eq!(top[0], (0x10, 3));
    }

    #[test]
    fn test_call_graph() {
        let mut p = Profiler::new();
        p.start(0);
        p.record_call(0x05, 0x20);
        p.record_call(0x05, 0x20);
        p.record_call(0x09, 0x30);
        let calls = p.top_calls(2);
        assert_eq!(calls[0], ((0x05, 0x20), 2));
    }

    #[test]
    fn test_flat_profile_groups_adjacent_instructions() {
        let mut p = Profiler::new();
        p.start(0);
        // Two three-byte instructions back to back, then a far-away one.
        p.record(0x00);
        p.record(0x03);
        p.record(0x40);
        let blocks = p.flat_profile();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], (0x00, 0x03, 2));
    }

    #[test]
    fn test_report_includes_disassembly() {
        let mut ram = vec![0u8; 256];
        ram[0] = crate::opcodes::LDI;
        ram[1] = 0;
        ram[2] = 8;
        let mut p = Profiler::new();
        p.start(0);
        p.record(0);
        let report = p.report(&ram);
        assert!(report.contains("LDI R0, 0x08"), "{}", report);
    }
}
