//! Table driven decoder for 32-bit RV64I instructions
//!
//! Decoding a word takes three passes:
//!
//! 1. The format decoder of the opcode's [`OpcodeEntry`] extracts the operands and sets the
//!    format flag (plus JUMP for B and J).
//! 2. The optional `funct3` sub-table picks the instruction id.
//! 3. The optional refinement hook resolves what `funct3` cannot: `funct7` selected variants,
//!    shift amounts, the fixed ids of the U/J opcodes and the exact SYSTEM encodings.
//!
//! An id that is still [`InstructionId::Invalid`] afterwards becomes [`InstructionId::Unknown`].
pub mod opcode;
pub(crate) mod refine;

use crate::instruction::{Instruction, InstructionFlags, InstructionFormat, InstructionId};
use opcode::{Opcode, OpcodeEntry};

/// Bit masks for field extraction
const MASK1: u32 = 0b1; // 1-bit mask
const MASK3: u32 = 0b111; // 3-bit mask
const MASK4: u32 = 0b1111; // 4-bit mask
const MASK5: u32 = 0b1_1111; // 5-bit mask
const MASK6: u32 = 0b11_1111; // 6-bit mask
const MASK7: u32 = 0b111_1111; // 7-bit mask
const MASK8: u32 = 0b1111_1111; // 8-bit mask
const MASK10: u32 = 0b11_1111_1111; // 10-bit mask
const MASK12: u32 = 0b1111_1111_1111; // 12-bit mask

/// Low two bits of every 32-bit encoding
const STANDARD_QUADRANT: u8 = 0b11;

/// Decode the instruction at `offset` in `memory`
///
/// Returns the instruction and the number of bytes it occupies. Never fails:
/// - a parcel whose low two bits are not `11` is compressed and comes back as
///   [`InstructionId::Unknown`] with the COMPRESSED flag, width 2
/// - an offset outside `memory` gives `Unknown`, width 2
/// - a 32-bit word running past the end of `memory` gives `Unknown`, width 4
pub fn decode(memory: &[u8], offset: i64) -> (Instruction, u8) {
    let Some(start) = usize::try_from(offset).ok().filter(|&start| start < memory.len()) else {
        return (Instruction::unknown(offset, 2), 2);
    };

    if memory[start] & STANDARD_QUADRANT != STANDARD_QUADRANT {
        let mut inst = Instruction::unknown(offset, 2);
        inst.flags |= InstructionFlags::COMPRESSED;
        return (inst, 2);
    }

    match memory.get(start..start + 4) {
        Some(&[b0, b1, b2, b3]) => (decode_word(u32::from_le_bytes([b0, b1, b2, b3]), offset), 4),
        _ => (Instruction::unknown(offset, 4), 4),
    }
}

/// Decode a 32-bit instruction word fetched from `address`
pub fn decode_word(raw: u32, address: i64) -> Instruction {
    let encoded = EncodedInstruction::new(raw);
    let mut inst = Instruction { address, size: 4, ..Default::default() };

    let Some(entry) = encoded.opcode.map(Opcode::entry) else {
        inst.id = InstructionId::Unknown;
        return inst;
    };

    apply_entry(&mut inst, &encoded, &entry);

    if inst.id == InstructionId::Invalid {
        inst.id = InstructionId::Unknown;
    }
    inst
}

fn apply_entry(inst: &mut Instruction, encoded: &EncodedInstruction, entry: &OpcodeEntry) {
    decode_format(inst, encoded, entry.format);

    if let Some(id) = entry.funct3.and_then(|table| table[encoded.funct3 as usize]) {
        inst.id = id;
    }

    if let Some(refine) = entry.refine {
        refine(inst, encoded);
    }
}

/// Fill the operand slots for `format` and record the format flag
fn decode_format(inst: &mut Instruction, encoded: &EncodedInstruction, format: InstructionFormat) {
    let rd = encoded.rd as i64;
    let rs1 = encoded.rs1 as i64;
    let rs2 = encoded.rs2 as i64;

    inst.operands = match format {
        InstructionFormat::R => [rd, rs1, rs2],
        InstructionFormat::I => [rd, rs1, encoded.i_immediate as i64],
        InstructionFormat::S => [rs1, rs2, encoded.s_immediate as i64],
        InstructionFormat::B => [rs1, rs2, encoded.b_immediate as i64],
        InstructionFormat::U => [rd, encoded.u_immediate as i64, 0],
        InstructionFormat::J => [rd, encoded.j_immediate as i64, 0],
    };
    inst.operand_count = format.operand_count();
    inst.flags |= format.flag();

    if matches!(format, InstructionFormat::B | InstructionFormat::J) {
        inst.flags |= InstructionFlags::JUMP;
    }
}

/// Parsed fields from a 32-bit RISC-V instruction
///
/// This can be seen as a union of all of the formats; the opcode entry then picks the relevant
/// fields. Extracting everything up front keeps the format decoders and hooks trivial.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInstruction {
    /// Original 32-bit instruction word
    pub raw: u32,

    /// Major opcode (bits [6:2]) as enum, if recognised
    pub opcode: Option<Opcode>,

    /// Destination register (bits [11:7])
    pub rd: u8,

    /// Function code 3 (bits [14:12])
    pub funct3: u8,

    /// Source register 1 (bits [19:15])
    pub rs1: u8,

    /// Source register 2 (bits [24:20])
    pub rs2: u8,

    /// Function code 7 (bits [31:25])
    pub funct7: u8,

    /// Upper six bits of the I immediate (bits [31:26]), qualifies 64-bit shifts
    pub funct6: u8,

    /// I-type immediate (bits [31:20], sign-extended)
    pub i_immediate: i32,

    /// S-type immediate (split across bits [31:25] and [11:7], sign-extended)
    pub s_immediate: i32,

    /// B-type immediate (branch offset, sign-extended)
    pub b_immediate: i32,

    /// U-type immediate (bits [31:12] in place, low 12 bits zero)
    pub u_immediate: i32,

    /// J-type immediate (jump offset, sign-extended)
    pub j_immediate: i32,

    /// Shift amount for word shifts (5-bit, bits [24:20])
    pub shamt32: u8,

    /// Shift amount for RV64I shifts (6-bit, bits [25:20])
    pub shamt64: u8,
}

impl EncodedInstruction {
    /// Parse all possible fields from a 32-bit instruction
    pub fn new(raw: u32) -> Self {
        /*
        R-type | funct7 |  rs2 |  rs1 | funct3 |   rd  | opcode |
               | 31-25  |24-20 |19-15 | 14-12  | 11-7  | 6-0    |
        --------------------------------------------------------

        I-type |   imm[11:0]    |  rs1 | funct3 |   rd  | opcode |
               |   31-20        |19-15 | 14-12  | 11-7  | 6-0    |
        --------------------------------------------------------

        S-type | imm[11:5] |  rs2 |  rs1 | funct3 | imm[4:0] | opcode |
               | 31-25     |24-20 |19-15 | 14-12  | 11-7     | 6-0    |
        --------------------------------------------------------------

        B-type | imm[12] | imm[10:5] |  rs2 |  rs1 | funct3 | imm[4:1|11] | opcode |
               |   31    | 30-25     |24-20 |19-15 | 14-12  | 11-7        | 6-0    |
        ---------------------------------------------------------------------------

        U-type |                imm[31:12]                 |   rd  | opcode |
               |                31-12                      | 11-7  | 6-0    |
        --------------------------------------------------------------------

        J-type | imm[20] | imm[10:1] | imm[11] | imm[19:12] |   rd  | opcode |
               |   31    | 30-21     |   20    | 19-12      | 11-7  | 6-0    |
        --------------------------------------------------------------------
        */

        // Major opcode sits above the two quadrant bits
        let opcode = Opcode::from_bits(((raw >> 2) & MASK5) as u8);
        let rd = ((raw >> 7) & MASK5) as u8;
        let funct3 = ((raw >> 12) & MASK3) as u8;
        let rs1 = ((raw >> 15) & MASK5) as u8;
        let rs2 = ((raw >> 20) & MASK5) as u8;
        let funct7 = ((raw >> 25) & MASK7) as u8;
        let funct6 = ((raw >> 26) & MASK6) as u8;

        Self {
            raw,
            opcode,
            rd,
            funct3,
            rs1,
            rs2,
            funct7,
            funct6,
            i_immediate: Self::extract_i_immediate(raw),
            s_immediate: Self::extract_s_immediate(raw),
            b_immediate: Self::extract_b_immediate(raw),
            u_immediate: Self::extract_u_immediate(raw),
            j_immediate: Self::extract_j_immediate(raw),
            shamt32: ((raw >> 20) & MASK5) as u8,
            shamt64: ((raw >> 20) & MASK6) as u8,
        }
    }

    /// Extract I-type immediate (12-bit, sign-extended)
    fn extract_i_immediate(raw: u32) -> i32 {
        let imm = (raw >> 20) & MASK12;

        // sign-extend from 12 bits
        ((imm as i32) << 20) >> 20
    }

    /// Extract S-type immediate (12-bit split, sign-extended)
    fn extract_s_immediate(raw: u32) -> i32 {
        let imm11_5 = ((raw >> 25) & MASK7) << 5;
        let imm4_0 = (raw >> 7) & MASK5;

        let imm = imm11_5 | imm4_0;

        // sign-extend from 12 bits
        ((imm as i32) << 20) >> 20
    }

    /// Extract B-type immediate (13-bit branch offset, sign-extended)
    fn extract_b_immediate(raw: u32) -> i32 {
        let imm12 = ((raw >> 31) & MASK1) << 12;
        let imm10_5 = ((raw >> 25) & MASK6) << 5;
        let imm4_1 = ((raw >> 8) & MASK4) << 1;
        let imm11 = ((raw >> 7) & MASK1) << 11;

        let imm = imm12 | imm11 | imm10_5 | imm4_1;

        // sign-extend from 13 bits
        ((imm as i32) << 19) >> 19
    }

    /// Extract U-type immediate (upper 20 bits in place)
    fn extract_u_immediate(raw: u32) -> i32 {
        (raw & !MASK12) as i32
    }

    /// Extract J-type immediate (21-bit jump offset, sign-extended)
    fn extract_j_immediate(raw: u32) -> i32 {
        let imm20 = ((raw >> 31) & MASK1) << 20;
        let imm10_1 = ((raw >> 21) & MASK10) << 1;
        let imm11 = ((raw >> 20) & MASK1) << 11;
        let imm19_12 = ((raw >> 12) & MASK8) << 12;

        let imm = imm20 | imm19_12 | imm11 | imm10_1;

        // sign-extend from 21 bits
        ((imm as i32) << 11) >> 11
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fields() {
        // add x1, x2, x3
        let encoded = EncodedInstruction::new(0x003100b3);
        assert_eq!(encoded.opcode, Some(Opcode::Op));
        assert_eq!(encoded.rd, 1);
        assert_eq!(encoded.rs1, 2);
        assert_eq!(encoded.rs2, 3);
        assert_eq!(encoded.funct3, 0);
        assert_eq!(encoded.funct7, 0);
    }

    #[test]
    fn test_i_immediate_sign_extension() {
        assert_eq!(EncodedInstruction::extract_i_immediate(0x7ff0_0000), 2047);
        assert_eq!(EncodedInstruction::extract_i_immediate(0x8000_0000), -2048);
        assert_eq!(EncodedInstruction::extract_i_immediate(0xfff0_0000), -1);
    }

    #[test]
    fn test_s_immediate_sign_extension() {
        // imm[11:5] = 0111111, imm[4:0] = 11111
        assert_eq!(EncodedInstruction::extract_s_immediate((0x3f << 25) | (0x1f << 7)), 2047);
        // imm[11:5] = 1000000, imm[4:0] = 00000
        assert_eq!(EncodedInstruction::extract_s_immediate(0x40 << 25), -2048);
    }

    #[test]
    fn test_b_immediate_sign_extension() {
        // Only imm[12] set
        assert_eq!(EncodedInstruction::extract_b_immediate(1 << 31), -4096);
        // Every bit but imm[12] set
        let max = (0x3f << 25) | (0xf << 8) | (1 << 7);
        assert_eq!(EncodedInstruction::extract_b_immediate(max), 4094);
    }

    #[test]
    fn test_u_immediate_keeps_upper_bits() {
        assert_eq!(EncodedInstruction::extract_u_immediate(0x0003_cc37), 0x3c000);
        assert_eq!(EncodedInstruction::extract_u_immediate(0x8000_0037), i32::MIN);
        assert_eq!(EncodedInstruction::extract_u_immediate(0x7ffff_037), 0x7ffff000);
    }

    #[test]
    fn test_j_immediate_sign_extension() {
        assert_eq!(EncodedInstruction::extract_j_immediate(1 << 31), -(1 << 20));
        let max = (0x3ff << 21) | (1 << 20) | (0xff << 12);
        assert_eq!(EncodedInstruction::extract_j_immediate(max), (1 << 20) - 2);
    }

    #[test]
    fn test_decode_past_end_of_memory() {
        let memory = [0x13u8, 0x00];
        let (inst, size) = decode(&memory, 0);
        assert_eq!(size, 4);
        assert_eq!(inst.id, InstructionId::Unknown);
        assert!(!inst.is_compressed());

        let (inst, size) = decode(&memory, 7);
        assert_eq!(size, 2);
        assert_eq!(inst.id, InstructionId::Unknown);

        let (_, size) = decode(&memory, -4);
        assert_eq!(size, 2);
    }
}
