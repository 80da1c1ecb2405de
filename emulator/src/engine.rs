//! Instruction dispatch and execution
//!
//! [`step`] looks the instruction id up in the dispatch table ([`handler`]) and runs the handler.
//! Handlers validate every memory access before writing anything, so an `Err` from a handler
//! means no register, memory or pc change happened.

use simrv_riscv::{decode, Instruction, InstructionId};
use tracing::{debug, trace};

use crate::state::{MachineState, Memory};
use crate::trap::{Outcome, Trap};

/// Executes one instruction id; the engine handles the generic pc advance
pub type Handler<M> = fn(&mut MachineState<M>, &Instruction) -> Result<(), Trap>;

/// Decode the instruction at the current program counter
pub fn fetch<M: Memory>(state: &MachineState<M>) -> Instruction {
    decode(state.memory.as_ref(), state.pc).0
}

/// Execute `inst` against `state`
///
/// # Arguments
/// * `state` - Processor state to update
/// * `inst` - Decoded instruction, normally the result of [`fetch`]
///
/// # Returns
/// * `Outcome::Continue` when the instruction completed
/// * `Outcome::Trap` when it had no handler or touched memory out of range; state is unchanged
pub fn step<M: Memory>(state: &mut MachineState<M>, inst: &Instruction) -> Outcome {
    state.regs[0] = 0;

    let result = match handler::<M>(inst.id) {
        Some(execute) => execute(state, inst),
        None => Err(Trap::IllegalInstruction { id: inst.id, address: inst.address }),
    };

    let outcome = match result {
        Ok(()) => {
            trace!("0x{:08x}: {inst}", inst.address);
            if !inst.is_jump() {
                state.pc = state.pc.wrapping_add(inst.size as i64);
            }
            Outcome::Continue
        }
        Err(trap) => {
            debug!(pc = state.pc, %trap, "step trapped");
            Outcome::Trap(trap)
        }
    };

    state.regs[0] = 0;
    outcome
}

/// Dispatch table from instruction id to handler
///
/// `None` for ids without execution semantics: `Unknown`, `Invalid`, `Ecall` and `Ebreak`.
pub fn handler<M: Memory>(id: InstructionId) -> Option<Handler<M>> {
    use InstructionId::*;

    let handler: Handler<M> = match id {
        Invalid | Unknown | Ecall | Ebreak => return None,

        Lui => exec_lui,
        Auipc => exec_auipc,
        Jal => exec_jal,
        Jalr => exec_jalr,

        Beq => |s, i| branch(s, i, |a, b| a == b),
        Bne => |s, i| branch(s, i, |a, b| a != b),
        Blt => |s, i| branch(s, i, |a, b| (a as i64) < (b as i64)),
        Bge => |s, i| branch(s, i, |a, b| (a as i64) >= (b as i64)),
        Bltu => |s, i| branch(s, i, |a, b| a < b),
        Bgeu => |s, i| branch(s, i, |a, b| a >= b),

        Lb => |s, i| load(s, i, 1, |v| v as u8 as i8 as i64 as u64),
        Lh => |s, i| load(s, i, 2, |v| v as u16 as i16 as i64 as u64),
        Lw => |s, i| load(s, i, 4, |v| v as u32 as i32 as i64 as u64),
        Ld => |s, i| load(s, i, 8, |v| v),
        Lbu => |s, i| load(s, i, 1, |v| v),
        Lhu => |s, i| load(s, i, 2, |v| v),
        Lwu => |s, i| load(s, i, 4, |v| v),

        Sb => |s, i| store(s, i, 1),
        Sh => |s, i| store(s, i, 2),
        Sw => |s, i| store(s, i, 4),
        Sd => |s, i| store(s, i, 8),

        Addi => |s, i| alu_imm(s, i, |a, imm| a.wrapping_add(imm as u64)),
        Slti => |s, i| alu_imm(s, i, |a, imm| ((a as i64) < imm) as u64),
        Sltiu => |s, i| alu_imm(s, i, |a, imm| (a < imm as u64) as u64),
        Xori => |s, i| alu_imm(s, i, |a, imm| a ^ imm as u64),
        Ori => |s, i| alu_imm(s, i, |a, imm| a | imm as u64),
        Andi => |s, i| alu_imm(s, i, |a, imm| a & imm as u64),
        Slli => |s, i| alu_imm(s, i, |a, imm| sll(a, imm as u64)),
        Srli => |s, i| alu_imm(s, i, |a, imm| srl(a, imm as u64)),
        Srai => |s, i| alu_imm(s, i, |a, imm| sra(a, imm as u64)),

        Add => |s, i| alu_reg(s, i, u64::wrapping_add),
        Sub => |s, i| alu_reg(s, i, u64::wrapping_sub),
        Sll => |s, i| alu_reg(s, i, sll),
        Slt => |s, i| alu_reg(s, i, |a, b| ((a as i64) < (b as i64)) as u64),
        Sltu => |s, i| alu_reg(s, i, |a, b| (a < b) as u64),
        Xor => |s, i| alu_reg(s, i, |a, b| a ^ b),
        Srl => |s, i| alu_reg(s, i, srl),
        Sra => |s, i| alu_reg(s, i, sra),
        Or => |s, i| alu_reg(s, i, |a, b| a | b),
        And => |s, i| alu_reg(s, i, |a, b| a & b),

        Addiw => |s, i| alu_imm(s, i, |a, imm| addw(a, imm as u64)),
        Slliw => |s, i| alu_imm(s, i, |a, imm| sllw(a, imm as u64)),
        Srliw => |s, i| alu_imm(s, i, |a, imm| srlw(a, imm as u64)),
        Sraiw => |s, i| alu_imm(s, i, |a, imm| sraw(a, imm as u64)),

        Addw => |s, i| alu_reg(s, i, addw),
        Subw => |s, i| alu_reg(s, i, |a, b| sext32(a.wrapping_sub(b))),
        Sllw => |s, i| alu_reg(s, i, sllw),
        Srlw => |s, i| alu_reg(s, i, srlw),
        Sraw => |s, i| alu_reg(s, i, sraw),

        // Single hart, nothing to order
        Fence => |_, _| Ok(()),
    };
    Some(handler)
}

/// `rd <- imm << 12`, the decoder keeps the plain 20-bit value
fn exec_lui<M: Memory>(state: &mut MachineState<M>, inst: &Instruction) -> Result<(), Trap> {
    state.set_reg(inst.reg(0), (inst.imm(1) << 12) as u64);
    Ok(())
}

/// `rd <- pc + imm`, the decoder keeps the immediate already shifted
fn exec_auipc<M: Memory>(state: &mut MachineState<M>, inst: &Instruction) -> Result<(), Trap> {
    state.set_reg(inst.reg(0), state.pc.wrapping_add(inst.imm(1)) as u64);
    Ok(())
}

fn exec_jal<M: Memory>(state: &mut MachineState<M>, inst: &Instruction) -> Result<(), Trap> {
    let link = state.pc.wrapping_add(inst.size as i64);
    state.pc = state.pc.wrapping_add(inst.imm(1));
    state.set_reg(inst.reg(0), link as u64);
    Ok(())
}

fn exec_jalr<M: Memory>(state: &mut MachineState<M>, inst: &Instruction) -> Result<(), Trap> {
    // Target is computed before rd is written, rd may equal rs1
    let target = state.regs[inst.reg(1)].wrapping_add(inst.imm(2) as u64) & !1;
    let link = state.pc.wrapping_add(inst.size as i64);
    state.pc = target as i64;
    state.set_reg(inst.reg(0), link as u64);
    Ok(())
}

fn branch<M: Memory>(
    state: &mut MachineState<M>,
    inst: &Instruction,
    taken: fn(u64, u64) -> bool,
) -> Result<(), Trap> {
    let (lhs, rhs) = (state.regs[inst.reg(0)], state.regs[inst.reg(1)]);
    let offset = if taken(lhs, rhs) { inst.imm(2) } else { inst.size as i64 };
    state.pc = state.pc.wrapping_add(offset);
    Ok(())
}

fn effective_address<M: Memory>(state: &MachineState<M>, base: usize, offset: i64) -> u64 {
    state.regs[base].wrapping_add(offset as u64)
}

fn load<M: Memory>(
    state: &mut MachineState<M>,
    inst: &Instruction,
    size: u8,
    extend: fn(u64) -> u64,
) -> Result<(), Trap> {
    let address = effective_address(state, inst.reg(1), inst.imm(2));
    let value = state.load(address, size)?;
    state.set_reg(inst.reg(0), extend(value));
    Ok(())
}

fn store<M: Memory>(state: &mut MachineState<M>, inst: &Instruction, size: u8) -> Result<(), Trap> {
    let address = effective_address(state, inst.reg(0), inst.imm(2));
    let value = state.regs[inst.reg(1)];
    state.store(address, size, value)
}

fn alu_imm<M: Memory>(
    state: &mut MachineState<M>,
    inst: &Instruction,
    op: fn(u64, i64) -> u64,
) -> Result<(), Trap> {
    let value = op(state.regs[inst.reg(1)], inst.imm(2));
    state.set_reg(inst.reg(0), value);
    Ok(())
}

fn alu_reg<M: Memory>(
    state: &mut MachineState<M>,
    inst: &Instruction,
    op: fn(u64, u64) -> u64,
) -> Result<(), Trap> {
    let value = op(state.regs[inst.reg(1)], state.regs[inst.reg(2)]);
    state.set_reg(inst.reg(0), value);
    Ok(())
}

fn sll(a: u64, b: u64) -> u64 {
    a << (b & 0x3f)
}

fn srl(a: u64, b: u64) -> u64 {
    a >> (b & 0x3f)
}

fn sra(a: u64, b: u64) -> u64 {
    ((a as i64) >> (b & 0x3f)) as u64
}

/// Sign-extend the low 32 bits
fn sext32(value: u64) -> u64 {
    value as u32 as i32 as i64 as u64
}

fn addw(a: u64, b: u64) -> u64 {
    sext32(a.wrapping_add(b))
}

fn sllw(a: u64, b: u64) -> u64 {
    sext32(((a as u32) << (b & 0x1f)) as u64)
}

fn srlw(a: u64, b: u64) -> u64 {
    sext32(((a as u32) >> (b & 0x1f)) as u64)
}

fn sraw(a: u64, b: u64) -> u64 {
    ((a as i32) >> (b & 0x1f)) as i64 as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_ops_sign_extend() {
        assert_eq!(addw(0x7fff_ffff, 1), 0xffff_ffff_8000_0000);
        assert_eq!(sllw(1, 31), 0xffff_ffff_8000_0000);
        assert_eq!(srlw(0xffff_ffff_8000_0000, 31), 1);
        assert_eq!(sraw(0x8000_0000, 31), u64::MAX);
        // Only the low five bits of the shift amount count
        assert_eq!(sllw(1, 33), 2);
    }

    #[test]
    fn test_shift_amount_masking() {
        assert_eq!(sll(1, 64), 1);
        assert_eq!(srl(u64::MAX, 63), 1);
        assert_eq!(sra(1 << 63, 63), u64::MAX);
    }

    #[test]
    fn test_no_handler_for_system_and_unknown() {
        use InstructionId::*;

        for id in [Unknown, Invalid, Ecall, Ebreak] {
            assert!(handler::<Vec<u8>>(id).is_none());
        }
        assert!(handler::<Vec<u8>>(Fence).is_some());
    }
}
