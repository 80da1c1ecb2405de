//! Host interface for the simulator
//!
//! [`Simulator`] owns the machine memory and wires the decoder, the execution engine and the ELF
//! loader together behind a small API: load an executable, step or run it, read the program
//! counter and registers, and receive bytes written to the output port.

mod config;
mod disasm;
mod simulator;

pub use config::{SimConfig, DEFAULT_MAX_STEPS, DEFAULT_MEMORY_SIZE};
pub use disasm::{disassemble, DisassembledInstruction};
pub use simulator::{RunSummary, Simulator, StopReason};

pub use simrv_emu::{registers, Outcome, Trap, OUTPUT_PORT_ADDR};
pub use simrv_loader::{LoadedImage, LoaderError};
pub use simrv_riscv::{Instruction, InstructionId};
