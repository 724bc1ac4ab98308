//! Program image parser.
//!
//! LS-8 images are plain text: each meaningful line starts with eight
//! binary digits encoding one instruction or operand byte. Lines that are
//! empty or start with `#` are comments, and anything after the digits on
//! a line (typically an inline `# ...` comment) is ignored.
//!
//! ```text
//! # print8.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

/// Parse a program image into `mem` starting at address 0.
///
/// Returns the number of bytes loaded. Any malformed line aborts the
/// load with an error naming the line.
pub fn parse_image(text: &str, mem: &mut [u8]) -> Result<usize, String> {
    let mut addr = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let digits = line
            .get(..8)
            .ok_or_else(|| format!("line {}: expected 8 binary digits, got {:?}", idx + 1, line))?;
        let byte = u8::from_str_radix(digits, 2)
            .map_err(|_| format!("line {}: invalid binary digits {:?}", idx + 1, digits))?;

        if addr >= mem.len() {
            return Err(format!("program too large: more than {} bytes", mem.len()));
        }
        mem[addr] = byte;
        addr += 1;
    }

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_print8() {
        let text = "\
# print8.ls8: load 8 into R0 and print it
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        let mut mem = [0u8; 256];
        let size = parse_image(text, &mut mem).unwrap();
        assert_eq!(size, 6);
        assert_eq!(&mem[..6], &[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]);
        assert_eq!(mem[6], 0);
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let text = "\n\n# only comments\n\n10000010\n00000000\n00000001\n";
        let mut mem = [0u8; 256];
        assert_eq!(parse_image(text, &mut mem).unwrap(), 3);
    }

    #[test]
    fn test_short_line_is_an_error() {
        let mut mem = [0u8; 256];
        let err = parse_image("1000\n", &mut mem).unwrap_err();
        assert!(err.contains("line 1"), "{}", err);
    }

    #[test]
    fn test_non_binary_digits_are_an_error() {
        let mut mem = [0u8; 256];
        assert!(parse_image("10002010\n", &mut mem).is_err());
        assert!(parse_image("deadbeef\n", &mut mem).is_err());
    }

    #[test]
    fn test_oversized_program_is_an_error() {
        let text = "00000001\n".repeat(257);
        let mut mem = [0u8; 256];
        let err = parse_image(&text, &mut mem).unwrap_err();
        assert!(err.contains("too large"), "{}", err);
    }

    #[test]
    fn test_empty_image() {
        let mut mem = [0u8; 256];
        assert_eq!(parse_image("# nothing here\n", &mut mem).unwrap(), 0);
    }
}
