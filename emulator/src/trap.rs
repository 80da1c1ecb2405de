use simrv_riscv::InstructionId;

/// Conditions that stop a step without changing machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    /// No handler for the instruction: unknown encodings and ECALL/EBREAK
    #[error("illegal instruction {id:?} at 0x{address:x}")]
    IllegalInstruction { id: InstructionId, address: i64 },

    /// Load or store outside the memory buffer
    #[error("memory access of {size} bytes at 0x{address:x} is out of range")]
    MemoryFault { address: u64, size: u8 },
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instruction completed and the program counter moved on
    Continue,
    /// The instruction was not executed
    Trap(Trap),
}

impl Outcome {
    pub fn is_trap(&self) -> bool {
        matches!(self, Outcome::Trap(_))
    }
}
