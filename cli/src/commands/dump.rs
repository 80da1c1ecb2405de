use std::path::PathBuf;

use anyhow::{Context, Result};
use simrv_sdk::disassemble;

// Structure representing the 'dump' subcommand
#[derive(clap::Args)]
#[command(about = "Disassemble the .text section of an ELF executable", long_about = None)]
pub struct DumpCmd {
    /// Path to the RV64 ELF executable
    pub elf: PathBuf,
}

impl DumpCmd {
    pub fn run(&self) -> Result<()> {
        let binary = std::fs::read(&self.elf)
            .with_context(|| format!("Failed to read {}", self.elf.display()))?;
        let image = simrv_loader::parse_elf(&binary)
            .with_context(|| format!("Failed to parse {}", self.elf.display()))?;

        println!(
            "entry 0x{:x}, .text at 0x{:x} ({} bytes)",
            image.entry,
            image.address,
            image.code.len()
        );
        for line in disassemble(&image.code, image.address) {
            println!("{line}");
        }
        Ok(())
    }
}
