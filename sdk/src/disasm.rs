use std::fmt;

use simrv_emu::registers::ABI_NAMES;
use simrv_riscv::{decode, Instruction, InstructionFormat, UNKNOWN_MNEMONIC};

/// One decoded instruction of a code listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledInstruction {
    /// Address the bytes are loaded at
    pub address: u64,
    /// Raw encoding, 2 or 4 bytes
    pub bytes: Vec<u8>,
    pub instruction: Instruction,
}

impl DisassembledInstruction {
    /// Absolute target of a branch or `jal`
    pub fn target(&self) -> Option<u64> {
        match self.instruction.format()? {
            InstructionFormat::B => Some(self.address.wrapping_add(self.instruction.imm(2) as u64)),
            InstructionFormat::J => Some(self.address.wrapping_add(self.instruction.imm(1) as u64)),
            _ => None,
        }
    }
}

impl fmt::Display for DisassembledInstruction {
    /// `address: raw  text`, raw printed as the little-endian parcel value
    ///
    /// Unlike [`simrv_riscv::format`], registers use their ABI names and branch and jump offsets
    /// are resolved to absolute addresses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.bytes.iter().rev().fold(0u32, |acc, &byte| (acc << 8) | byte as u32);
        let width = self.bytes.len() * 2;
        write!(f, "{:8x}: {raw:0width$x}  ", self.address)?;

        let inst = &self.instruction;
        if !inst.is_known() {
            return f.write_str(UNKNOWN_MNEMONIC);
        }
        let mnemonic = inst.id.mnemonic();
        let reg = |slot: usize| ABI_NAMES[inst.reg(slot)];
        match (inst.format(), self.target()) {
            (Some(InstructionFormat::R), _) => {
                write!(f, "{mnemonic} {}, {}, {}", reg(0), reg(1), reg(2))
            }
            (Some(InstructionFormat::B), Some(target)) => {
                write!(f, "{mnemonic} {}, {}, {target:#x}", reg(0), reg(1))
            }
            (Some(InstructionFormat::J), Some(target)) => {
                write!(f, "{mnemonic} {}, {target:#x}", reg(0))
            }
            (Some(InstructionFormat::I | InstructionFormat::S), _) => {
                write!(f, "{mnemonic} {}, {}, {:#x}", reg(0), reg(1), inst.imm(2))
            }
            (Some(InstructionFormat::U), _) => {
                write!(f, "{mnemonic} {}, {:#x}", reg(0), inst.imm(1))
            }
            _ => f.write_str(UNKNOWN_MNEMONIC),
        }
    }
}

/// Decode `code` loaded at `base` into a listing
///
/// Walks the buffer with the decoder's own widths, so compressed parcels and trailing partial
/// words show up as unknown entries instead of stopping the walk.
pub fn disassemble(code: &[u8], base: u64) -> Vec<DisassembledInstruction> {
    let mut listing = Vec::with_capacity(code.len() / 4);
    let mut offset = 0usize;
    while offset < code.len() {
        let (mut instruction, size) = decode(code, offset as i64);
        let end = (offset + size as usize).min(code.len());
        instruction.address = base.wrapping_add(offset as u64) as i64;
        listing.push(DisassembledInstruction {
            address: base.wrapping_add(offset as u64),
            bytes: code[offset..end].to_vec(),
            instruction,
        });
        offset += size as usize;
    }
    listing
}
