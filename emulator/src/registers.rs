//! RISC-V integer registers
//!
//! Ref: https://riscv-non-isa.github.io/riscv-elf-psabi-doc/#_register_convention
//!
//! | ABI name | X name  | Usage                                     |
//! |----------|---------|-------------------------------------------|
//! | REG_ZERO | x0      | Read always as zero                       |
//! | REG_RA   | x1      | Return address                            |
//! | REG_SP   | x2      | Stack pointer                             |
//! | REG_GP   | x3      | Global pointer                            |
//! | REG_TP   | x4      | Thread pointer                            |
//! | REG_T0   | x5      | Temporary register 0                      |
//! | REG_T1   | x6      | Temporary register 1                      |
//! | REG_T2   | x7      | Temporary register 2                      |
//! | REG_S0   | x8      | Saved register 0 / frame pointer          |
//! | REG_S1   | x9      | Saved register 1                          |
//! | REG_A0   | x10     | Function argument 0 / return value 0      |
//! | REG_A1   | x11     | Function argument 1 / return value 1      |
//! | REG_A2   | x12     | Function argument 2                       |
//! | ...      | ...     | ...                                       |
//! | REG_T6   | x31     | Temporary register 6                      |

pub const REG_COUNT: usize = 32;

pub const REG_ZERO: usize = 0;
pub const REG_RA: usize = 1;
pub const REG_SP: usize = 2;
pub const REG_GP: usize = 3;
pub const REG_TP: usize = 4;
pub const REG_T0: usize = 5;
pub const REG_T1: usize = 6;
pub const REG_T2: usize = 7;
pub const REG_S0: usize = 8;
pub const REG_S1: usize = 9;
pub const REG_A0: usize = 10;
pub const REG_A1: usize = 11;
pub const REG_A2: usize = 12;
pub const REG_A3: usize = 13;
pub const REG_A4: usize = 14;
pub const REG_A5: usize = 15;
pub const REG_A6: usize = 16;
pub const REG_A7: usize = 17;
pub const REG_T6: usize = 31;

/// ABI names indexed by register number
pub const ABI_NAMES: [&str; REG_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abi_names_match_constants() {
        assert_eq!(ABI_NAMES[REG_ZERO], "zero");
        assert_eq!(ABI_NAMES[REG_SP], "sp");
        assert_eq!(ABI_NAMES[REG_T0], "t0");
        assert_eq!(ABI_NAMES[REG_S0], "s0");
        assert_eq!(ABI_NAMES[REG_A7], "a7");
        assert_eq!(ABI_NAMES[REG_T6], "t6");
    }
}
