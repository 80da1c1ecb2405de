use std::path::Path;

use anyhow::Context;
use simrv_emu::registers::REG_COUNT;
use simrv_emu::{fetch, step, MachineState, Outcome, Trap};
use simrv_loader::{load_elf, LoadedImage, LoaderError};
use tracing::{debug, warn};

use crate::config::SimConfig;

/// Why [`Simulator::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The step budget ran out
    StepLimit,
    /// A step completed without moving the program counter (e.g. `jal x0, 0`)
    Stalled,
    /// A step trapped
    Trap(Trap),
}

/// Result of [`Simulator::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed during this run, trapping steps excluded
    pub steps: u64,
    /// Program counter when the run stopped
    pub pc: u64,
    pub reason: StopReason,
}

/// A single simulated processor with its own memory
#[derive(Debug)]
pub struct Simulator {
    config: SimConfig,
    state: MachineState<Vec<u8>>,
    steps: u64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulator {
    /// Simulator with zeroed memory of `config.memory_size` bytes
    pub fn new(config: SimConfig) -> Self {
        let state = MachineState::new(vec![0u8; config.memory_size]);
        Self { config, state, steps: 0 }
    }

    /// Load an ELF executable
    ///
    /// Memory and registers are cleared and the `.text` section is installed. On error the
    /// simulator is left exactly as it was.
    pub fn load(&mut self, binary: &[u8]) -> Result<(), LoaderError> {
        let image = load_elf(binary, self.state.capacity())?;
        self.load_image(&image)
    }

    /// Read and load an ELF executable from disk
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let binary =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        self.load(&binary).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Install an already parsed image, see [`Simulator::load`]
    pub fn load_image(&mut self, image: &LoadedImage) -> Result<(), LoaderError> {
        image.fits(self.state.capacity())?;
        self.reset();
        image.install(&mut self.state)
    }

    /// Zero memory and registers, `pc = 0`; the output callback stays attached
    pub fn reset(&mut self) {
        self.state.memory.fill(0);
        self.state.regs = [0; REG_COUNT];
        self.state.pc = 0;
        self.steps = 0;
    }

    /// Current program counter
    pub fn pc(&self) -> u64 {
        self.state.pc as u64
    }

    /// Value of register `index`, `None` outside 0..32
    pub fn register(&self, index: usize) -> Option<u64> {
        self.state.regs.get(index).copied()
    }

    pub fn registers(&self) -> &[u64; REG_COUNT] {
        &self.state.regs
    }

    pub fn memory(&self) -> &[u8] {
        &self.state.memory
    }

    /// Direct access to the machine state, for hosts that poke registers or memory
    pub fn state_mut(&mut self) -> &mut MachineState<Vec<u8>> {
        &mut self.state
    }

    /// Total steps completed since the last load or reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Call `callback(byte, address)` for every store to the output port
    pub fn on_output(&mut self, callback: impl FnMut(u8, u64) + 'static) {
        self.state.set_output(callback);
    }

    /// The instruction at the program counter, without executing it
    pub fn current_instruction(&self) -> simrv_riscv::Instruction {
        fetch(&self.state)
    }

    /// Fetch, decode and execute one instruction
    pub fn step(&mut self) -> Outcome {
        let inst = fetch(&self.state);
        let outcome = step(&mut self.state, &inst);
        if outcome == Outcome::Continue {
            self.steps += 1;
        }
        outcome
    }

    /// Step until a trap, a stalled program counter or `max_steps` completed steps
    pub fn run(&mut self, max_steps: u64) -> RunSummary {
        let mut steps = 0;
        let reason = loop {
            if steps >= max_steps {
                break StopReason::StepLimit;
            }
            let pc = self.state.pc;
            match self.step() {
                Outcome::Trap(trap) => break StopReason::Trap(trap),
                Outcome::Continue => steps += 1,
            }
            if self.state.pc == pc {
                break StopReason::Stalled;
            }
        };

        let summary = RunSummary { steps, pc: self.pc(), reason };
        match reason {
            StopReason::Trap(trap) => warn!(steps, "run stopped by trap: {trap}"),
            _ => debug!(steps, ?reason, "run finished at pc 0x{:x}", summary.pc),
        }
        summary
    }

    /// [`Simulator::run`] with the configured step budget
    pub fn run_to_completion(&mut self) -> RunSummary {
        self.run(self.config.max_steps)
    }
}
