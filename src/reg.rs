/// Number of general-purpose registers. Register fields are 3 bits wide, so every
/// encodable index is valid.
pub const COUNT: usize = 8;

/// Argument/return slot used by every syscall.
pub const SYSCALL: usize = 7;

const NAMES: [&str; COUNT] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"];

/// Assembler name of register `index`. Indices are masked to the register file size.
pub fn name(index: u8) -> &'static str {
    NAMES[index as usize % COUNT]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(name(0), "r0");
        assert_eq!(name(SYSCALL as u8), "r7");
        // out-of-range indices wrap like a 3-bit field would
        assert_eq!(name(9), "r1");
    }
}
