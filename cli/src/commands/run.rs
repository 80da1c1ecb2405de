use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use simrv_sdk::registers::{REG_T0, REG_T1, REG_T2};
use simrv_sdk::{
    RunSummary, SimConfig, Simulator, StopReason, DEFAULT_MAX_STEPS, DEFAULT_MEMORY_SIZE,
};
use tracing::{info, warn};

// Structure representing the 'run' subcommand
#[derive(clap::Args)]
#[command(about = "Run an ELF executable", long_about = None)]
pub struct RunCmd {
    /// Path to the RV64 ELF executable
    pub elf: PathBuf,

    /// Stop after this many executed instructions
    #[clap(long, env = "SIMRV_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: u64,

    /// Size of the simulated memory in bytes
    #[clap(long, env = "SIMRV_MEMORY_SIZE", default_value_t = DEFAULT_MEMORY_SIZE)]
    pub memory_size: usize,

    /// Log t0, t1 and t2 after every step
    #[clap(long)]
    pub trace_regs: bool,
}

impl RunCmd {
    pub fn run(&self) -> Result<()> {
        let config = SimConfig { memory_size: self.memory_size, max_steps: self.max_steps };
        let mut sim = Simulator::new(config);
        sim.load_file(&self.elf)?;
        sim.on_output(|byte, _address| {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = stdout.write_all(&[byte]).and_then(|_| stdout.flush()) {
                warn!("failed to write program output: {err}");
            }
        });
        info!("running {} from pc 0x{:x}", self.elf.display(), sim.pc());

        let summary =
            if self.trace_regs { self.run_traced(&mut sim) } else { sim.run_to_completion() };

        match summary.reason {
            StopReason::Trap(trap) => {
                bail!("trap after {} steps at pc 0x{:x}: {trap}", summary.steps, summary.pc)
            }
            StopReason::StepLimit => {
                info!("step limit of {} reached at pc 0x{:x}", self.max_steps, summary.pc)
            }
            StopReason::Stalled => {
                info!("program halted after {} steps at pc 0x{:x}", summary.steps, summary.pc)
            }
        }
        Ok(())
    }

    /// Single step through the program, logging the temporaries after each instruction
    fn run_traced(&self, sim: &mut Simulator) -> RunSummary {
        let mut steps = 0;
        loop {
            if steps >= self.max_steps {
                return RunSummary { steps, pc: sim.pc(), reason: StopReason::StepLimit };
            }
            let summary = sim.run(1);
            steps += summary.steps;
            let regs = sim.registers();
            info!(
                "pc=0x{:x} t0=0x{:x} t1=0x{:x} t2=0x{:x}",
                summary.pc, regs[REG_T0], regs[REG_T1], regs[REG_T2]
            );
            if summary.reason != StopReason::StepLimit {
                return RunSummary { steps, ..summary };
            }
        }
    }
}
