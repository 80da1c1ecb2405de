//! ELF loader
//!
//! Only the `.text` section of a RISC-V ELF64 executable is loaded: its bytes are copied to the
//! section address in machine memory and the program counter is set to the ELF entry point.
//! Validation happens before anything is copied, so a failed load leaves memory untouched.

use goblin::elf::header::{EI_CLASS, ELFCLASS64, ELFMAG, EM_RISCV, ET_EXEC, SELFMAG};
use goblin::elf::section_header::SHT_NOBITS;
use goblin::elf::Elf;
use simrv_emu::{MachineState, Memory};
use tracing::debug;

/// Name of the only section the loader copies
pub const TEXT_SECTION: &str = ".text";

/// Loader errors, one per validation stage
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Bad magic, not 64-bit, or structurally broken
    #[error("invalid ELF64 image: {0}")]
    Format(String),

    /// Valid ELF64 but not a RISC-V executable
    #[error("unsupported target: e_type {e_type}, e_machine {e_machine}")]
    UnsupportedTarget { e_type: u16, e_machine: u16 },

    #[error("no .text section")]
    MissingSection,

    /// `.text` does not fit in machine memory
    #[error(".text at 0x{address:x} ({size} bytes) exceeds memory capacity of {capacity} bytes")]
    Overflow { address: u64, size: u64, capacity: usize },
}

/// The `.text` bytes of an executable and where they go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// ELF entry point, becomes the program counter
    pub entry: u64,

    /// Section address, where `code` is copied
    pub address: u64,

    /// Section contents
    pub code: Vec<u8>,
}

impl LoadedImage {
    /// Check that the image fits in `capacity` bytes of memory
    pub fn fits(&self, capacity: usize) -> Result<(), LoaderError> {
        let size = self.code.len() as u64;
        match self.address.checked_add(size) {
            Some(end) if end <= capacity as u64 => Ok(()),
            _ => Err(LoaderError::Overflow { address: self.address, size, capacity }),
        }
    }

    /// Copy the code into `state` memory and point the program counter at the entry
    pub fn install<M: Memory>(&self, state: &mut MachineState<M>) -> Result<(), LoaderError> {
        self.fits(state.capacity())?;

        let start = self.address as usize;
        state.memory.as_mut()[start..start + self.code.len()].copy_from_slice(&self.code);
        state.pc = self.entry as i64;

        debug!(
            "installed {TEXT_SECTION}: {} bytes at 0x{:x}, pc 0x{:x}",
            self.code.len(),
            self.address,
            self.entry
        );
        Ok(())
    }
}

/// Validate `binary` and extract its `.text` section
///
/// # Returns
/// * `Err(LoaderError::Format)` on a bad magic, a 32-bit class, a malformed file or more than
///   one `.text` section
/// * `Err(LoaderError::UnsupportedTarget)` unless the file is an `ET_EXEC` for `EM_RISCV`
/// * `Err(LoaderError::MissingSection)` when there is no `.text`
pub fn parse_elf(binary: &[u8]) -> Result<LoadedImage, LoaderError> {
    check_ident(binary)?;

    let elf = Elf::parse(binary).map_err(|err| LoaderError::Format(err.to_string()))?;

    let (e_type, e_machine) = (elf.header.e_type, elf.header.e_machine);
    if e_type != ET_EXEC || e_machine != EM_RISCV {
        return Err(LoaderError::UnsupportedTarget { e_type, e_machine });
    }

    let mut text_sections = elf
        .section_headers
        .iter()
        .filter(|section| elf.shdr_strtab.get_at(section.sh_name) == Some(TEXT_SECTION));
    let section = text_sections.next().ok_or(LoaderError::MissingSection)?;
    if text_sections.next().is_some() {
        return Err(LoaderError::Format(format!("more than one {TEXT_SECTION} section")));
    }
    if section.sh_type == SHT_NOBITS {
        return Err(LoaderError::Format(format!("{TEXT_SECTION} has no file contents")));
    }

    let code = section_bytes(binary, section.sh_offset, section.sh_size).ok_or_else(|| {
        LoaderError::Format(format!("{TEXT_SECTION} contents lie outside the file"))
    })?;

    Ok(LoadedImage { entry: elf.header.e_entry, address: section.sh_addr, code: code.to_vec() })
}

/// [`parse_elf`] followed by a capacity check
pub fn load_elf(binary: &[u8], capacity: usize) -> Result<LoadedImage, LoaderError> {
    let image = parse_elf(binary)?;
    image.fits(capacity)?;

    debug!(
        capacity,
        "loaded {TEXT_SECTION}: {} bytes at 0x{:x}, entry 0x{:x}",
        image.code.len(),
        image.address,
        image.entry
    );
    Ok(image)
}

/// Magic and class are checked up front so 32-bit files fail with a format error
fn check_ident(binary: &[u8]) -> Result<(), LoaderError> {
    if binary.get(..SELFMAG) != Some(&ELFMAG[..]) {
        return Err(LoaderError::Format("bad magic".to_string()));
    }
    if binary.get(EI_CLASS) != Some(&ELFCLASS64) {
        return Err(LoaderError::Format("not a 64-bit ELF".to_string()));
    }
    Ok(())
}

fn section_bytes(binary: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(size).ok()?)?;
    binary.get(start..end)
}
