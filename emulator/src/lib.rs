//! * Executes decoded RV64I instructions against an explicit [`MachineState`].
//! * The state holds the program counter, the 32 general purpose registers and a host owned
//!   memory buffer. The engine never allocates, resizes or frees that buffer.
//! * One call to [`step`] executes one instruction. A step either completes or traps; a trapping
//!   step leaves the state exactly as it was, except that `x0` is always forced back to zero.
//! * Stores to [`OUTPUT_PORT_ADDR`] are delivered to the attached [`OutputSink`] instead of
//!   memory.

mod engine;
pub mod registers;
mod state;
mod trap;

pub use engine::{fetch, handler, step, Handler};
pub use state::{MachineState, Memory, OutputSink, OUTPUT_PORT_ADDR};
pub use trap::{Outcome, Trap};
