//! Access to the memory-mapped registers of the trace components.
//!
//! All component drivers go through a [`MemoryInterface`], which lets the
//! same code drive the registers of the running chip ([`Mmio`]), a debug
//! probe attached to a target, or a register file double in tests.

use core::marker::PhantomData;

use crate::Error;

/// Width of a single register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessWidth {
    /// 8-bit access.
    U8,
    /// 16-bit access.
    U16,
    /// 32-bit access.
    U32,
}

impl AccessWidth {
    /// Number of bytes transferred by an access of this width.
    pub fn bytes(self) -> usize {
        match self {
            AccessWidth::U8 => 1,
            AccessWidth::U16 => 2,
            AccessWidth::U32 => 4,
        }
    }
}

impl core::fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-bit", self.bytes() * 8)
    }
}

/// An interface to be implemented for anything that gives access to the
/// trace component registers.
///
/// Accesses are performed in program order and must not be merged or
/// reordered, the components react to every single write.
pub trait MemoryInterface {
    /// Read a 32bit word at `address`.
    fn read_word_32(&mut self, address: u64) -> Result<u32, Error>;

    /// Write a 32bit word at `address`.
    fn write_word_32(&mut self, address: u64, data: u32) -> Result<(), Error>;

    /// Write a 16bit word at `address`.
    ///
    /// Only the stimulus ports accept sub-word writes.
    fn write_word_16(&mut self, address: u64, data: u16) -> Result<(), Error>;

    /// Write an 8bit word at `address`.
    fn write_word_8(&mut self, address: u64, data: u8) -> Result<(), Error>;

    /// Flush any outstanding writes.
    ///
    /// Interfaces which batch accesses must complete them here. The default does nothing.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Direct volatile access to the registers of the chip this code runs on.
///
/// Addresses are used as physical pointers, so this is only meaningful on the
/// Cortex-M core whose trace components are being configured.
pub struct Mmio {
    _not_send_or_sync: PhantomData<*mut ()>,
}

impl Mmio {
    /// Creates the register access handle.
    ///
    /// # Safety
    ///
    /// Every address later passed to this interface must be a valid,
    /// naturally aligned device register of the running chip. Only one
    /// handle must be used at a time, the trace components have no
    /// protection against interleaved read-modify-write sequences.
    pub unsafe fn new() -> Self {
        Self {
            _not_send_or_sync: PhantomData,
        }
    }
}

impl MemoryInterface for Mmio {
    fn read_word_32(&mut self, address: u64) -> Result<u32, Error> {
        // SAFETY: validity of the address is guaranteed by the caller of `Mmio::new`.
        Ok(unsafe { (address as usize as *const u32).read_volatile() })
    }

    fn write_word_32(&mut self, address: u64, data: u32) -> Result<(), Error> {
        // SAFETY: see `read_word_32`.
        unsafe { (address as usize as *mut u32).write_volatile(data) };
        Ok(())
    }

    fn write_word_16(&mut self, address: u64, data: u16) -> Result<(), Error> {
        // SAFETY: see `read_word_32`.
        unsafe { (address as usize as *mut u16).write_volatile(data) };
        Ok(())
    }

    fn write_word_8(&mut self, address: u64, data: u8) -> Result<(), Error> {
        // SAFETY: see `read_word_32`.
        unsafe { (address as usize as *mut u8).write_volatile(data) };
        Ok(())
    }
}
