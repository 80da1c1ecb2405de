//! Refinement hooks run after the format decoder and the `funct3` sub-table

use crate::decoder::EncodedInstruction;
use crate::instruction::{Instruction, InstructionFlags, InstructionId};

const FUNCT7_BASE: u8 = 0b000_0000;
const FUNCT7_ALT: u8 = 0b010_0000;
const FUNCT6_BASE: u8 = 0b00_0000;
const FUNCT6_ALT: u8 = 0b01_0000;

const ECALL: u32 = 0x0000_0073;
const EBREAK: u32 = 0x0010_0073;

/// LUI keeps the plain 20-bit value; execution shifts it back
pub(crate) fn lui(inst: &mut Instruction, _: &EncodedInstruction) {
    inst.id = InstructionId::Lui;
    inst.operands[1] >>= 12;
}

pub(crate) fn auipc(inst: &mut Instruction, _: &EncodedInstruction) {
    inst.id = InstructionId::Auipc;
}

pub(crate) fn jal(inst: &mut Instruction, _: &EncodedInstruction) {
    inst.id = InstructionId::Jal;
}

/// JALR is only defined for funct3 = 0; the jump flag stays either way
pub(crate) fn jalr(inst: &mut Instruction, encoded: &EncodedInstruction) {
    inst.id = if encoded.funct3 == 0 { InstructionId::Jalr } else { InstructionId::Unknown };
    inst.flags |= InstructionFlags::JUMP;
}

/// 64-bit immediate shifts: 6-bit shamt, imm[11:6] selects logical or arithmetic
pub(crate) fn op_imm(inst: &mut Instruction, encoded: &EncodedInstruction) {
    let id = match (inst.id, encoded.funct6) {
        (InstructionId::Slli, FUNCT6_BASE) => InstructionId::Slli,
        (InstructionId::Srli, FUNCT6_BASE) => InstructionId::Srli,
        (InstructionId::Srli, FUNCT6_ALT) => InstructionId::Srai,
        (InstructionId::Slli | InstructionId::Srli, _) => InstructionId::Unknown,
        _ => return,
    };
    inst.id = id;
    inst.operands[2] = encoded.shamt64 as i64;
}

/// Word immediate shifts: 5-bit shamt, funct7 selects logical or arithmetic
pub(crate) fn op_imm_32(inst: &mut Instruction, encoded: &EncodedInstruction) {
    let id = match (inst.id, encoded.funct7) {
        (InstructionId::Slliw, FUNCT7_BASE) => InstructionId::Slliw,
        (InstructionId::Srliw, FUNCT7_BASE) => InstructionId::Srliw,
        (InstructionId::Srliw, FUNCT7_ALT) => InstructionId::Sraiw,
        (InstructionId::Slliw | InstructionId::Srliw, _) => InstructionId::Unknown,
        _ => return,
    };
    inst.id = id;
    inst.operands[2] = encoded.shamt32 as i64;
}

pub(crate) fn op(inst: &mut Instruction, encoded: &EncodedInstruction) {
    inst.id = match (encoded.funct7, inst.id) {
        (FUNCT7_BASE, id) => id,
        (FUNCT7_ALT, InstructionId::Add) => InstructionId::Sub,
        (FUNCT7_ALT, InstructionId::Srl) => InstructionId::Sra,
        _ => InstructionId::Unknown,
    };
}

pub(crate) fn op_32(inst: &mut Instruction, encoded: &EncodedInstruction) {
    inst.id = match (encoded.funct7, inst.id) {
        (FUNCT7_BASE, id) => id,
        (FUNCT7_ALT, InstructionId::Addw) => InstructionId::Subw,
        (FUNCT7_ALT, InstructionId::Srlw) => InstructionId::Sraw,
        _ => InstructionId::Unknown,
    };
}

/// Only the exact ECALL and EBREAK words are recognised; CSR access is out of scope
pub(crate) fn system(inst: &mut Instruction, encoded: &EncodedInstruction) {
    inst.id = match encoded.raw {
        ECALL => InstructionId::Ecall,
        EBREAK => InstructionId::Ebreak,
        _ => InstructionId::Unknown,
    };
}
