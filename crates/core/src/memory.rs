//! LS-8 memory subsystem.
//!
//! A single flat address space of 256 byte cells, zero-initialized and
//! never resized. Every access is range-checked: an out-of-range address
//! yields [`VmError::OutOfBounds`], never a panic, and the machine treats
//! that as a lenient, skip-the-effect condition.

use crate::{VmError, MEM_SIZE};

/// Flat 256-byte RAM.
pub struct Memory {
    pub ram: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Memory { ram: vec![0u8; MEM_SIZE] }
    }

    #[inline(always)]
    pub fn read(&self, addr: usize) -> Result<u8, VmError> {
        self.ram
            .get(addr)
            .copied()
            .ok_or(VmError::OutOfBounds { addr })
    }

    #[inline(always)]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), VmError> {
        match self.ram.get_mut(addr) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(VmError::OutOfBounds { addr }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_initialized() {
        let mem = Memory::new();
        assert_eq!(mem.ram.len(), MEM_SIZE);
        assert!(mem.ram.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_write_in_range() {
        let mut mem = Memory::new();
        mem.write(0xF3, 0x42).unwrap();
        assert_eq!(mem.read(0xF3).unwrap(), 0x42);
    }

    #[test]
    fn test_one_past_the_end_is_out_of_bounds() {
        let mut mem = Memory::new();
        assert_eq!(mem.read(256), Err(VmError::OutOfBounds { addr: 256 }));
        assert_eq!(mem.write(256, 1), Err(VmError::OutOfBounds { addr: 256 }));
        assert_eq!(mem.read(255).unwrap(), 0);
    }
}
