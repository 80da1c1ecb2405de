//! RV64I instruction decoder and formatter
//!
//! A RISC-V instruction is a little-endian 32-bit word (16-bit compressed parcels are
//! recognised but not decoded). Every word falls into one of six encoding formats:
//!
//! [0000000 | 00011 | 00010 | 000 | 00001 | 01100 | 11]
//! [funct7  | rs2   | rs1   |funct3| rd   | opcode| 11]
//!
//! - The low two bits are `11` for every 32-bit instruction, so the decoder only looks at the
//!   five bits above them (the "major opcode"). `01100` is OP, an R-type instruction.
//! - The major opcode does not identify the operation on its own. `funct3` (here `000`) narrows
//!   it to ADD or SUB and `funct7` (here `0000000`) selects ADD.
//!
//! The decoder is table driven: each major opcode maps to an [`OpcodeEntry`] holding the format
//! used to extract operands, an optional `funct3` sub-table and an optional refinement hook for
//! the opcodes whose instructions cannot be told apart by `funct3` alone.
//!
//! Decoding is total. Anything the tables do not recognise comes back as
//! [`InstructionId::Unknown`] together with the number of bytes it occupies, so a caller walking
//! a code buffer can always make progress.

pub mod decoder;
pub mod formatter;
pub mod instruction;

pub use decoder::opcode::{Opcode, OpcodeEntry};
pub use decoder::{decode, decode_word};
pub use formatter::{format, UNKNOWN_MNEMONIC};
pub use instruction::{Instruction, InstructionFlags, InstructionFormat, InstructionId};
