//! Save state (quick save / quick load) for the LS-8 machine.
//!
//! Captures the full machine state to a file using bincode serialization
//! with deflate compression, so a step-debugging session can be parked
//! and resumed later.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "LS8S"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Ls8, MEM_SIZE, REG_COUNT};

/// Magic bytes identifying an ls8-emu save state file.
const MAGIC: &[u8; 4] = b"LS8S";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;

/// Complete machine snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    // CPU
    pub pc: usize,
    pub ir: u8,
    pub reg: [u8; REG_COUNT],
    pub fl: u8,
    pub running: bool,
    pub tick: u64,

    // Memory
    pub ram: Vec<u8>,

    // Undrained PRN output
    pub output: Vec<u8>,
}

impl Ls8 {
    /// Capture the current machine state.
    pub fn save_state(&self) -> SaveState {
        SaveState {
            pc: self.cpu.pc,
            ir: self.cpu.ir,
            reg: self.cpu.reg,
            fl: self.cpu.fl.bits(),
            running: self.cpu.running,
            tick: self.cpu.tick,
            ram: self.mem.ram.clone(),
            output: self.output.clone(),
        }
    }

    /// Restore a previously captured state.
    ///
    /// Breakpoints, watchpoints, and profiler data are not part of a
    /// snapshot and survive the restore.
    pub fn apply_state(&mut self, state: &SaveState) -> Result<(), String> {
        if state.ram.len() != MEM_SIZE {
            return Err(format!(
                "save state RAM size {} does not match machine RAM size {}",
                state.ram.len(),
                MEM_SIZE
            ));
        }
        self.cpu.pc = state.pc;
        self.cpu.ir = state.ir;
        self.cpu.reg = state.reg;
        self.cpu.fl = crate::Flags::from_bits(state.fl);
        self.cpu.running = state.running;
        self.cpu.tick = state.tick;
        self.mem.ram.copy_from_slice(&state.ram);
        self.output = state.output.clone();
        Ok(())
    }
}

// ─── File I/O ───────────────────────────────────────────────────────────────

/// Save state to file with header and deflate compression.
pub fn save_to_file(state: &SaveState, path: &Path) -> Result<(), String> {
    let payload = bincode::serialize(state)
        .map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(8 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);

    std::fs::write(path, &out)
        .map_err(|e| format!("Write error: {}", e))
}

/// Load state from file, verifying magic and version.
pub fn load_from_file(path: &Path) -> Result<SaveState, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Read error: {}", e))?;

    if data.len() < 8 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid save state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!("Unsupported save state version {} (expected {})",
            version, FORMAT_VERSION));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[8..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    bincode::deserialize(&decompressed)
        .map_err(|e| format!("Deserialize error: {}", e))
}

/// Derive save state file path from program file path.
/// `print8.ls8` → `print8.state`
pub fn state_path(program_path: &str) -> String {
    let p = Path::new(program_path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("program");
    let dir = p.parent().unwrap_or(Path::new("."));
    dir.join(format!("{}.state", stem)).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let mut m = Ls8::new();
        // LDI R0,8 / PRN R0 / HLT — run halfway, snapshot, then restore
        // into a fresh machine and finish the run there.
        m.mem.ram[..6].copy_from_slice(&[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]);
        m.cpu.running = true;
        m.step().unwrap();
        let snap = m.save_state();

        let mut m2 = Ls8::new();
        m2.apply_state(&snap).unwrap();
        assert_eq!(m2.cpu.pc, 3);
        assert_eq!(m2.cpu.reg[0], 8);
        m2.run().unwrap();
        assert_eq!(m2.take_output(), b"8\n");
    }

    #[test]
    fn test_file_round_trip() {
        let mut m = Ls8::new();
        m.mem.ram[0] = 0b0000_0001;
        m.cpu.reg[3] = 0x2A;
        let snap = m.save_state();

        let dir = std::env::temp_dir();
        let path = dir.join("ls8_savestate_test.state");
        save_to_file(&snap, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.reg[3], 0x2A);
        assert_eq!(loaded.ram[0], 0b0000_0001);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("ls8_savestate_bad_magic.state");
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00junk").unwrap();
        let err = load_from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.contains("bad magic"), "{}", err);
    }

    #[test]
    fn test_state_path() {
        assert_eq!(state_path("demos/print8.ls8"), "demos/print8.state");
    }
}
