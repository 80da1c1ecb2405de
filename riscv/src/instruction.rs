//! Structured form of a decoded instruction

use std::ops::{BitOr, BitOrAssign};

/// Operation identifiers for the supported RV64I subset
///
/// `Invalid` is the value of a freshly created [`Instruction`] and never leaves the decoder.
/// `Unknown` marks encodings the decoder could not classify.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstructionId {
    #[default]
    Invalid,
    Unknown,

    Lui,
    Auipc,
    Jal,
    Jalr,

    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,

    Lb,
    Lh,
    Lw,
    Ld,
    Lbu,
    Lhu,
    Lwu,

    Sb,
    Sh,
    Sw,
    Sd,

    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,

    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,

    Addiw,
    Slliw,
    Srliw,
    Sraiw,

    Addw,
    Subw,
    Sllw,
    Srlw,
    Sraw,

    Fence,
    Ecall,
    Ebreak,
}

impl InstructionId {
    /// Assembly mnemonic, lower case
    pub fn mnemonic(self) -> &'static str {
        match self {
            InstructionId::Invalid => "invalid",
            InstructionId::Unknown => "unknown",
            InstructionId::Lui => "lui",
            InstructionId::Auipc => "auipc",
            InstructionId::Jal => "jal",
            InstructionId::Jalr => "jalr",
            InstructionId::Beq => "beq",
            InstructionId::Bne => "bne",
            InstructionId::Blt => "blt",
            InstructionId::Bge => "bge",
            InstructionId::Bltu => "bltu",
            InstructionId::Bgeu => "bgeu",
            InstructionId::Lb => "lb",
            InstructionId::Lh => "lh",
            InstructionId::Lw => "lw",
            InstructionId::Ld => "ld",
            InstructionId::Lbu => "lbu",
            InstructionId::Lhu => "lhu",
            InstructionId::Lwu => "lwu",
            InstructionId::Sb => "sb",
            InstructionId::Sh => "sh",
            InstructionId::Sw => "sw",
            InstructionId::Sd => "sd",
            InstructionId::Addi => "addi",
            InstructionId::Slti => "slti",
            InstructionId::Sltiu => "sltiu",
            InstructionId::Xori => "xori",
            InstructionId::Ori => "ori",
            InstructionId::Andi => "andi",
            InstructionId::Slli => "slli",
            InstructionId::Srli => "srli",
            InstructionId::Srai => "srai",
            InstructionId::Add => "add",
            InstructionId::Sub => "sub",
            InstructionId::Sll => "sll",
            InstructionId::Slt => "slt",
            InstructionId::Sltu => "sltu",
            InstructionId::Xor => "xor",
            InstructionId::Srl => "srl",
            InstructionId::Sra => "sra",
            InstructionId::Or => "or",
            InstructionId::And => "and",
            InstructionId::Addiw => "addiw",
            InstructionId::Slliw => "slliw",
            InstructionId::Srliw => "srliw",
            InstructionId::Sraiw => "sraiw",
            InstructionId::Addw => "addw",
            InstructionId::Subw => "subw",
            InstructionId::Sllw => "sllw",
            InstructionId::Srlw => "srlw",
            InstructionId::Sraw => "sraw",
            InstructionId::Fence => "fence",
            InstructionId::Ecall => "ecall",
            InstructionId::Ebreak => "ebreak",
        }
    }
}

/// Bitset of per-instruction properties
///
/// Exactly one of the `*_TYPE` format bits is set on every classified instruction. It tells the
/// engine and the formatter how to read [`Instruction::operands`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstructionFlags(u16);

impl InstructionFlags {
    pub const NONE: Self = Self(0);
    /// Control transfer: the handler owns the program counter
    pub const JUMP: Self = Self(1 << 0);
    /// 16-bit parcel, not decoded
    pub const COMPRESSED: Self = Self(1 << 1);
    pub const R_TYPE: Self = Self(1 << 2);
    pub const I_TYPE: Self = Self(1 << 3);
    pub const S_TYPE: Self = Self(1 << 4);
    pub const B_TYPE: Self = Self(1 << 5);
    pub const U_TYPE: Self = Self(1 << 6);
    pub const J_TYPE: Self = Self(1 << 7);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for InstructionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for InstructionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// RISC-V instruction format types
///
/// The format fixes which bit ranges hold registers and how the immediate is assembled.
/// Operand slots after decoding:
///
/// | format | slot 0 | slot 1 | slot 2 |
/// |--------|--------|--------|--------|
/// | R      | rd     | rs1    | rs2    |
/// | I      | rd     | rs1    | imm    |
/// | S      | rs1    | rs2    | imm    |
/// | B      | rs1    | rs2    | imm    |
/// | U      | rd     | imm    |        |
/// | J      | rd     | imm    |        |
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstructionFormat {
    /// Register-register operations (add, sub, sll, ...)
    R,
    /// Immediate operations, loads, jalr and system instructions
    I,
    /// Stores
    S,
    /// Conditional branches, 13-bit signed byte offset
    B,
    /// lui and auipc
    U,
    /// jal, 21-bit signed byte offset
    J,
}

impl InstructionFormat {
    pub const ALL: [InstructionFormat; 6] = [
        InstructionFormat::R,
        InstructionFormat::I,
        InstructionFormat::S,
        InstructionFormat::B,
        InstructionFormat::U,
        InstructionFormat::J,
    ];

    /// The flag bit recording this format on an [`Instruction`]
    pub const fn flag(self) -> InstructionFlags {
        match self {
            InstructionFormat::R => InstructionFlags::R_TYPE,
            InstructionFormat::I => InstructionFlags::I_TYPE,
            InstructionFormat::S => InstructionFlags::S_TYPE,
            InstructionFormat::B => InstructionFlags::B_TYPE,
            InstructionFormat::U => InstructionFlags::U_TYPE,
            InstructionFormat::J => InstructionFlags::J_TYPE,
        }
    }

    /// Number of operand slots the format fills
    pub const fn operand_count(self) -> u8 {
        match self {
            InstructionFormat::U | InstructionFormat::J => 2,
            _ => 3,
        }
    }
}

/// A decoded instruction
///
/// Operand slots hold either a register index (0-31) or a sign-extended immediate. Which one
/// applies is determined by [`Instruction::format`], never stored per operand.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Operation identifier
    pub id: InstructionId,

    /// Byte offset the instruction was fetched from
    pub address: i64,

    /// Encoded width in bytes, 2 or 4
    pub size: u8,

    /// Format bit plus JUMP / COMPRESSED
    pub flags: InstructionFlags,

    /// Number of operand slots in use
    pub operand_count: u8,

    /// Operand slots, see [`InstructionFormat`] for the layout
    pub operands: [i64; 3],
}

impl Instruction {
    /// An unclassified instruction of the given width
    pub fn unknown(address: i64, size: u8) -> Self {
        Self { id: InstructionId::Unknown, address, size, ..Default::default() }
    }

    /// The format recorded in the flags, if any
    pub fn format(&self) -> Option<InstructionFormat> {
        InstructionFormat::ALL.into_iter().find(|format| self.flags.contains(format.flag()))
    }

    /// Register index held in `slot`
    pub fn reg(&self, slot: usize) -> usize {
        (self.operands[slot] & 0x1f) as usize
    }

    /// Immediate held in `slot`
    pub fn imm(&self, slot: usize) -> i64 {
        self.operands[slot]
    }

    pub fn is_jump(&self) -> bool {
        self.flags.contains(InstructionFlags::JUMP)
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(InstructionFlags::COMPRESSED)
    }

    /// Whether the decoder classified this instruction
    pub fn is_known(&self) -> bool {
        !matches!(self.id, InstructionId::Unknown | InstructionId::Invalid)
    }
}
