//! Debugging facilities.
//!
//! - **RAM viewer**: hex + ASCII dump of any memory region
//! - **Watchpoints**: trigger on memory read/write at specified addresses
//!
//! Watchpoints are checked in the machine's `read_ram` / `write_ram`
//! paths, so they observe every data access the running program makes
//! (stack traffic included) but not the fetch stream.

/// Watchpoint trigger type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchKind {
    /// Trigger on write
    Write,
    /// Trigger on read
    Read,
    /// Trigger on read or write
    ReadWrite,
}

/// A memory watchpoint.
#[derive(Debug, Clone)]
pub struct Watchpoint {
    /// Address to watch
    pub addr: usize,
    /// Trigger condition
    pub kind: WatchKind,
    /// Optional: only trigger when value changes to this
    pub value_match: Option<u8>,
    /// Hit count
    pub hits: u64,
    /// Enabled
    pub enabled: bool,
}

/// Watchpoint trigger event returned from check functions.
#[derive(Debug)]
pub struct WatchHit {
    /// Watchpoint index
    pub index: usize,
    /// Address that triggered
    pub addr: usize,
    /// Old value (for writes) or current value (for reads)
    pub old_val: u8,
    /// New value (for writes, same as old for reads)
    pub new_val: u8,
    /// Access kind that triggered
    pub access: WatchKind,
}

/// Debugger state.
pub struct Debugger {
    /// Active watchpoints
    pub watchpoints: Vec<Watchpoint>,
    /// Pending trigger (the machine should pause)
    pub watch_hit: Option<WatchHit>,
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            watchpoints: Vec::new(),
            watch_hit: None,
        }
    }

    /// Add a watchpoint. Returns its index.
    pub fn add_watchpoint(&mut self, addr: usize, kind: WatchKind) -> usize {
        let idx = self.watchpoints.len();
        self.watchpoints.push(Watchpoint {
            addr, kind, value_match: None, hits: 0, enabled: true,
        });
        idx
    }

    /// Remove a watchpoint by index.
    pub fn remove_watchpoint(&mut self, idx: usize) -> bool {
        if idx < self.watchpoints.len() {
            self.watchpoints.remove(idx);
            true
        } else { false }
    }

    /// Check watchpoints for a write access. Call BEFORE writing to RAM.
    #[inline]
    pub fn check_write(&mut self, addr: usize, old_val: u8, new_val: u8) {
        for (i, wp) in self.watchpoints.iter_mut().enumerate() {
            if !wp.enabled || wp.addr != addr { continue; }
            if wp.kind == WatchKind::Read { continue; }
            if let Some(v) = wp.value_match {
                if new_val != v { continue; }
            }
            wp.hits += 1;
            if self.watch_hit.is_none() {
                self.watch_hit = Some(WatchHit {
                    index: i, addr, old_val, new_val,
                    access: WatchKind::Write,
                });
            }
        }
    }

    /// Check watchpoints for a read access.
    #[inline]
    pub fn check_read(&mut self, addr: usize, val: u8) {
        for (i, wp) in self.watchpoints.iter_mut().enumerate() {
            if !wp.enabled || wp.addr != addr { continue; }
            if wp.kind == WatchKind::Write { continue; }
            wp.hits += 1;
            if self.watch_hit.is_none() {
                self.watch_hit = Some(WatchHit {
                    index: i, addr, old_val: val, new_val: val,
                    access: WatchKind::Read,
                });
            }
        }
    }

    /// Take pending watchpoint hit (returns and clears it).
    pub fn take_hit(&mut self) -> Option<WatchHit> {
        self.watch_hit.take()
    }

    /// Format watchpoints list.
    pub fn list_watchpoints(&self) -> String {
        if self.watchpoints.is_empty() { return "No watchpoints set.\n".into(); }
        let mut s = String::new();
        for (i, wp) in self.watchpoints.iter().enumerate() {
            let k = match wp.kind {
                WatchKind::Write => "W",
                WatchKind::Read => "R",
                WatchKind::ReadWrite => "RW",
            };
            let en = if wp.enabled { " " } else { "!" };
            let vm = if let Some(v) = wp.value_match {
                format!(" =0x{:02X}", v)
            } else { String::new() };
            s.push_str(&format!("  [{}]{} 0x{:02X} {}  hits={}{}\n",
                i, en, wp.addr, k, wp.hits, vm));
        }
        s
    }
}

impl Default for Debugger {
    fn default() -> Self { Self::new() }
}

// ─── RAM Viewer ─────────────────────────────────────────────────────────────

/// Format a hex + ASCII dump of a RAM region.
///
/// Outputs 16 bytes per line with address, hex values, and ASCII printable chars.
pub fn dump_ram(data: &[u8], start: usize, length: usize) -> String {
    let mut s = String::new();
    let end = (start + length).min(data.len());
    let mut addr = start;
    while addr < end {
        let line_end = (addr + 16).min(end);
        s.push_str(&format!("{:02X}: ", addr));
        // Hex bytes
        for i in addr..addr + 16 {
            if i < line_end {
                s.push_str(&format!("{:02X} ", data[i]));
            } else {
                s.push_str("   ");
            }
            if i == addr + 7 { s.push(' '); }
        }
        s.push(' ');
        // ASCII
        for i in addr..line_end {
            let c = data[i];
            if c >= 0x20 && c < 0x7F {
                s.push(c as char);
            } else {
                s.push('.');
            }
        }
        s.push('\n');
        addr += 16;
    }
    s
}

/// Format a diff view showing only changed bytes between two snapshots.
pub fn dump_ram_diff(old: &[u8], new: &[u8], start: usize, length: usize) -> String {
    let mut s = String::new();
    let end = (start + length).min(old.len().min(new.len()));
    let mut any = false;
    for i in start..end {
        if old[i] != new[i] {
            s.push_str(&format!("  0x{:02X}: {:02X} → {:02X}\n", i, old[i], new[i]));
            any = true;
        }
    }
    if !any { s.push_str("  (no changes)\n"); }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_ram() {
        let mut data = vec![0u8; 256];
        data[0x40] = 0x41; // 'A'
        data[0x41] = 0x42; // 'B'
        data[0x4F] = 0xFF;
        let dump = dump_ram(&data, 0x40, 16);
        assert!(dump.contains("40:"));
        assert!(dump.contains("41 42"));
        assert!(dump.contains("AB"));
    }

    #[test]
    fn test_write_watchpoint() {
        let mut dbg = Debugger::new();
        dbg.add_watchpoint(0xF3, WatchKind::Write);
        dbg.check_write(0xF3, 0x00, 0xFF);
        let hit = dbg.take_hit().unwrap();
        assert_eq!(hit.addr, 0xF3);
        assert_eq!(hit.new_val, 0xFF);
        assert!(dbg.take_hit().is_none());
    }

    #[test]
    fn test_read_watchpoint_ignores_writes() {
        let mut dbg = Debugger::new();
        dbg.add_watchpoint(0x10, WatchKind::Read);
        dbg.check_write(0x10, 0, 1);
        assert!(dbg.watch_hit.is_none());
        dbg.check_read(0x10, 1);
        assert!(dbg.watch_hit.is_some());
    }

    #[test]
    fn test_ram_diff() {
        let old = vec![0u8; 256];
        let mut new = old.clone();
        new[0xF3] = 0x2A;
        let diff = dump_ram_diff(&old, &new, 0, 256);
        assert!(diff.contains("0xF3: 00 → 2A"));
    }
}
