//! Major opcode table
//!
//! Bits [6:2] of a 32-bit instruction select an [`Opcode`]. Each opcode maps to an
//! [`OpcodeEntry`] that drives the rest of the decode.

use crate::decoder::refine;
use crate::decoder::EncodedInstruction;
use crate::instruction::{Instruction, InstructionFormat, InstructionId};

/// `funct3` sub-table, indexed by bits [14:12]
pub type Funct3Table = [Option<InstructionId>; 8];

/// Post-decode hook, may override the id or add flags
pub type RefineFn = fn(&mut Instruction, &EncodedInstruction);

/// How to finish decoding an instruction once its major opcode is known
#[derive(Copy, Clone)]
pub struct OpcodeEntry {
    /// Format used to extract the operands
    pub format: InstructionFormat,

    /// Optional `funct3` sub-table selecting the id
    pub funct3: Option<&'static Funct3Table>,

    /// Optional hook run after the format decoder and the sub-table
    pub refine: Option<RefineFn>,
}

use InstructionId::*;

const LOAD_FUNCT3: Funct3Table =
    [Some(Lb), Some(Lh), Some(Lw), Some(Ld), Some(Lbu), Some(Lhu), Some(Lwu), None];

const MISC_MEM_FUNCT3: Funct3Table = [Some(Fence), None, None, None, None, None, None, None];

const OP_IMM_FUNCT3: Funct3Table = [
    Some(Addi),
    Some(Slli),
    Some(Slti),
    Some(Sltiu),
    Some(Xori),
    Some(Srli),
    Some(Ori),
    Some(Andi),
];

const OP_IMM_32_FUNCT3: Funct3Table =
    [Some(Addiw), Some(Slliw), None, None, None, Some(Srliw), None, None];

const STORE_FUNCT3: Funct3Table = [Some(Sb), Some(Sh), Some(Sw), Some(Sd), None, None, None, None];

const OP_FUNCT3: Funct3Table =
    [Some(Add), Some(Sll), Some(Slt), Some(Sltu), Some(Xor), Some(Srl), Some(Or), Some(And)];

const OP_32_FUNCT3: Funct3Table =
    [Some(Addw), Some(Sllw), None, None, None, Some(Srlw), None, None];

const BRANCH_FUNCT3: Funct3Table =
    [Some(Beq), Some(Bne), None, None, Some(Blt), Some(Bge), Some(Bltu), Some(Bgeu)];

/// RISC-V major opcodes, bits [6:2] of a 32-bit instruction
///
/// The two low bits are always `11` for 32-bit encodings and are not part of the value.
/// An opcode generally maps to several instructions; `funct3` and `funct7` select among them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::unusual_byte_groupings)]
#[repr(u8)]
pub enum Opcode {
    /// Load instructions (lb, lh, lw, ld, lbu, lhu, lwu)
    Load = 0b00_000,

    /// Memory ordering (fence)
    MiscMem = 0b00_011,

    /// Immediate arithmetic/logic operations (addi, slti, xori, ...)
    OpImm = 0b00_100,

    /// Add upper immediate to PC (auipc)
    Auipc = 0b00_101,

    /// 32-bit immediate operations (addiw, slliw, ...)
    OpImm32 = 0b00_110,

    /// Store instructions (sb, sh, sw, sd)
    Store = 0b01_000,

    /// Register-register operations (add, sub, ...)
    Op = 0b01_100,

    /// Load upper immediate (lui)
    Lui = 0b01_101,

    /// 32-bit register operations (addw, subw, ...)
    Op32 = 0b01_110,

    /// Branch instructions (beq, bne, blt, ...)
    Branch = 0b11_000,

    /// Jump and link register (jalr)
    Jalr = 0b11_001,

    /// Jump and link (jal)
    Jal = 0b11_011,

    /// System instructions (ecall, ebreak)
    System = 0b11_100,
}

impl Opcode {
    /// Convert a 5-bit major opcode to the enum
    #[allow(clippy::unusual_byte_groupings)]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00_000 => Some(Opcode::Load),
            0b00_011 => Some(Opcode::MiscMem),
            0b00_100 => Some(Opcode::OpImm),
            0b00_101 => Some(Opcode::Auipc),
            0b00_110 => Some(Opcode::OpImm32),
            0b01_000 => Some(Opcode::Store),
            0b01_100 => Some(Opcode::Op),
            0b01_101 => Some(Opcode::Lui),
            0b01_110 => Some(Opcode::Op32),
            0b11_000 => Some(Opcode::Branch),
            0b11_001 => Some(Opcode::Jalr),
            0b11_011 => Some(Opcode::Jal),
            0b11_100 => Some(Opcode::System),
            _ => None,
        }
    }

    /// Decoding recipe for this opcode
    pub fn entry(self) -> OpcodeEntry {
        match self {
            Opcode::Load => entry(InstructionFormat::I, Some(&LOAD_FUNCT3), None),
            Opcode::MiscMem => entry(InstructionFormat::I, Some(&MISC_MEM_FUNCT3), None),
            Opcode::OpImm => {
                entry(InstructionFormat::I, Some(&OP_IMM_FUNCT3), Some(refine::op_imm))
            }
            Opcode::Auipc => entry(InstructionFormat::U, None, Some(refine::auipc)),
            Opcode::OpImm32 => {
                entry(InstructionFormat::I, Some(&OP_IMM_32_FUNCT3), Some(refine::op_imm_32))
            }
            Opcode::Store => entry(InstructionFormat::S, Some(&STORE_FUNCT3), None),
            Opcode::Op => entry(InstructionFormat::R, Some(&OP_FUNCT3), Some(refine::op)),
            Opcode::Lui => entry(InstructionFormat::U, None, Some(refine::lui)),
            Opcode::Op32 => entry(InstructionFormat::R, Some(&OP_32_FUNCT3), Some(refine::op_32)),
            Opcode::Branch => entry(InstructionFormat::B, Some(&BRANCH_FUNCT3), None),
            Opcode::Jalr => entry(InstructionFormat::I, None, Some(refine::jalr)),
            Opcode::Jal => entry(InstructionFormat::J, None, Some(refine::jal)),
            Opcode::System => entry(InstructionFormat::I, None, Some(refine::system)),
        }
    }
}

fn entry(
    format: InstructionFormat,
    funct3: Option<&'static Funct3Table>,
    refine: Option<RefineFn>,
) -> OpcodeEntry {
    OpcodeEntry { format, funct3, refine }
}
