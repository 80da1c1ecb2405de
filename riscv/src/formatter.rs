//! Canonical text rendering of decoded instructions
//!
//! | format  | template                       |
//! |---------|--------------------------------|
//! | R       | `add x1, x2, x3`               |
//! | I, S, B | `addi x1, x2, 0x10`            |
//! | U, J    | `jal x0, 0x38`                 |
//!
//! Immediates print as 64-bit two's complement hex, so `-1` is `0xffffffffffffffff`.

use std::fmt;

use crate::instruction::{Instruction, InstructionFormat};

/// Text produced for anything the decoder could not classify
pub const UNKNOWN_MNEMONIC: &str = "unknown";

/// Render `inst` as assembly text
pub fn format(inst: &Instruction) -> String {
    inst.to_string()
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return f.write_str(UNKNOWN_MNEMONIC);
        }

        let mnemonic = self.id.mnemonic();
        match self.format() {
            Some(InstructionFormat::R) => {
                write!(f, "{mnemonic} x{}, x{}, x{}", self.reg(0), self.reg(1), self.reg(2))
            }
            Some(InstructionFormat::I | InstructionFormat::S | InstructionFormat::B) => {
                write!(f, "{mnemonic} x{}, x{}, {:#x}", self.reg(0), self.reg(1), self.imm(2))
            }
            Some(InstructionFormat::U | InstructionFormat::J) => {
                write!(f, "{mnemonic} x{}, {:#x}", self.reg(0), self.imm(1))
            }
            None => f.write_str(UNKNOWN_MNEMONIC),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_word;

    #[test]
    fn test_format_r_type() {
        // add x1, x2, x3
        assert_eq!(format(&decode_word(0x003100b3, 0)), "add x1, x2, x3");
    }

    #[test]
    fn test_format_negative_immediate() {
        // addi x1, x0, -1
        assert_eq!(format(&decode_word(0xfff00093, 0)), "addi x1, x0, 0xffffffffffffffff");
    }

    #[test]
    fn test_format_unknown() {
        assert_eq!(format(&decode_word(0xffff_ffff, 0)), UNKNOWN_MNEMONIC);
        assert_eq!(format(&Instruction::default()), UNKNOWN_MNEMONIC);
    }
}
