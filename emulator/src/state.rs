use std::fmt;
use std::ops::Range;

use tracing::trace;

use crate::registers::REG_COUNT;
use crate::trap::Trap;

/// Single memory mapped output address; stores here go to the [`OutputSink`]
pub const OUTPUT_PORT_ADDR: u64 = 0x10000;

/// Access widths in bytes, anything else faults
const ACCESS_WIDTHS: [u8; 4] = [1, 2, 4, 8];

/// Byte buffer the engine can run against
///
/// Implemented for anything that exposes a mutable byte slice, so hosts can hand in an owned
/// `Vec<u8>`, a fixed array or a borrowed `&mut [u8]`.
pub trait Memory: AsRef<[u8]> + AsMut<[u8]> {}

impl<T: AsRef<[u8]> + AsMut<[u8]> + ?Sized> Memory for T {}

/// Receiver for bytes written to [`OUTPUT_PORT_ADDR`]
pub trait OutputSink {
    /// Called with the low byte of the stored value and the store address
    fn write_byte(&mut self, byte: u8, address: u64);
}

impl<F: FnMut(u8, u64)> OutputSink for F {
    fn write_byte(&mut self, byte: u8, address: u64) {
        (self)(byte, address)
    }
}

/// Processor state: program counter, registers and memory
pub struct MachineState<M> {
    /// Program counter, not required to stay inside memory
    pub pc: i64,

    /// General purpose registers, `regs[0]` reads as zero after every step
    pub regs: [u64; REG_COUNT],

    /// Host owned memory, fixed capacity
    pub memory: M,

    /// Output port receiver
    output: Option<Box<dyn OutputSink>>,
}

impl<M: Memory> MachineState<M> {
    /// State with zeroed registers and `pc = 0`
    pub fn new(memory: M) -> Self {
        Self { pc: 0, regs: [0; REG_COUNT], memory, output: None }
    }

    /// Attach an output sink, replacing any previous one
    pub fn set_output(&mut self, sink: impl OutputSink + 'static) {
        self.output = Some(Box::new(sink));
    }

    /// Memory capacity in bytes
    pub fn capacity(&self) -> usize {
        self.memory.as_ref().len()
    }

    /// Write a register, writes to `x0` are discarded
    pub fn set_reg(&mut self, index: usize, value: u64) {
        if index != 0 {
            self.regs[index] = value;
        }
    }

    /// Little-endian read of `size` bytes (1, 2, 4 or 8)
    ///
    /// Any other width is a [`Trap::MemoryFault`].
    pub fn load(&self, address: u64, size: u8) -> Result<u64, Trap> {
        let range = self.range(address, size)?;
        let mut bytes = [0u8; 8];
        bytes[..size as usize].copy_from_slice(&self.memory.as_ref()[range]);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Little-endian write of the low `size` bytes of `value`
    ///
    /// A store to [`OUTPUT_PORT_ADDR`] hands the low byte to the output sink and leaves memory
    /// untouched, whatever the store width.
    pub fn store(&mut self, address: u64, size: u8, value: u64) -> Result<(), Trap> {
        if address == OUTPUT_PORT_ADDR && ACCESS_WIDTHS.contains(&size) {
            match self.output.as_mut() {
                Some(sink) => sink.write_byte(value as u8, address),
                None => trace!(byte = value as u8, "output port store without a sink"),
            }
            return Ok(());
        }

        let range = self.range(address, size)?;
        self.memory.as_mut()[range].copy_from_slice(&value.to_le_bytes()[..size as usize]);
        Ok(())
    }

    fn range(&self, address: u64, size: u8) -> Result<Range<usize>, Trap> {
        let start = usize::try_from(address).ok();
        match start.and_then(|start| start.checked_add(size as usize).map(|end| start..end)) {
            Some(range) if ACCESS_WIDTHS.contains(&size) && range.end <= self.capacity() => {
                Ok(range)
            }
            _ => Err(Trap::MemoryFault { address, size }),
        }
    }
}

impl<M: Memory> fmt::Debug for MachineState<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineState")
            .field("pc", &self.pc)
            .field("regs", &self.regs)
            .field("capacity", &self.capacity())
            .field("output", &self.output.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_load_store_little_endian() {
        let mut state = MachineState::new(vec![0u8; 16]);
        state.store(4, 4, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(&state.memory[4..8], &[0x88, 0x77, 0x66, 0x55]);
        assert_eq!(state.load(4, 2).unwrap(), 0x7788);
        assert_eq!(state.load(4, 8).unwrap(), 0x5566_7788);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut state = MachineState::new([0u8; 8]);
        assert_eq!(state.load(7, 2), Err(Trap::MemoryFault { address: 7, size: 2 }));
        let fault = Trap::MemoryFault { address: u64::MAX, size: 1 };
        assert_eq!(state.store(u64::MAX, 1, 0), Err(fault));
        assert_eq!(state.memory, [0u8; 8]);
        assert!(state.load(0, 8).is_ok());
    }

    #[test]
    fn test_unsupported_width_faults() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&written);
        let mut state = MachineState::new(vec![0u8; 32]);
        state.set_output(move |byte: u8, _address: u64| sink.borrow_mut().push(byte));
        for size in [0, 3, 9, 16] {
            assert_eq!(state.load(0, size), Err(Trap::MemoryFault { address: 0, size }));
            assert_eq!(state.store(8, size, u64::MAX), Err(Trap::MemoryFault { address: 8, size }));
            assert_eq!(
                state.store(OUTPUT_PORT_ADDR, size, 0x41),
                Err(Trap::MemoryFault { address: OUTPUT_PORT_ADDR, size })
            );
        }
        assert!(state.memory.iter().all(|&byte| byte == 0));
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn test_borrowed_memory() {
        let mut buffer = [0u8; 4];
        {
            let mut state = MachineState::new(&mut buffer[..]);
            state.store(1, 1, 0xab).unwrap();
        }
        assert_eq!(buffer, [0, 0xab, 0, 0]);
    }

    #[test]
    fn test_x0_write_discarded() {
        let mut state = MachineState::new(vec![0u8; 4]);
        state.set_reg(0, 7);
        state.set_reg(1, 7);
        assert_eq!(state.regs[0], 0);
        assert_eq!(state.regs[1], 7);
    }
}
