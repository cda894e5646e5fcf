//! Typed views of the trace component registers.

use crate::component::Component;
use crate::{Error, MemoryInterface};

/// A memory mapped register of a trace component, for instance DWT_CTRL or ITM_TCR.
pub trait MemoryMappedRegister: Clone + From<u32> + Into<u32> + Sized + core::fmt::Debug {
    /// Offset of the register from the base address of its component.
    const ADDRESS_OFFSET: u64;
    /// The register's name.
    const NAME: &'static str;
}

/// Loading and storing of registers relative to the component they belong to.
pub trait DebugComponentInterface: MemoryMappedRegister {
    /// Reads the register of `component`.
    fn load(component: &Component, interface: &mut dyn MemoryInterface) -> Result<Self, Error> {
        Ok(Self::from(component.read_reg(
            interface,
            Self::ADDRESS_OFFSET,
        )?))
    }

    /// Reads the register of the replicated `unit`, units are 16 bytes apart.
    fn load_unit(
        component: &Component,
        interface: &mut dyn MemoryInterface,
        unit: usize,
    ) -> Result<Self, Error> {
        Ok(Self::from(component.read_reg(
            interface,
            Self::ADDRESS_OFFSET + 16 * unit as u64,
        )?))
    }

    /// Writes the register of `component`.
    fn store(&self, component: &Component, interface: &mut dyn MemoryInterface) -> Result<(), Error> {
        let value: u32 = self.clone().into();
        tracing::debug!("{} {} <- {:#010x}", component.kind(), Self::NAME, value);
        component.write_reg(interface, Self::ADDRESS_OFFSET, value)
    }

    /// Writes the register of the replicated `unit`, units are 16 bytes apart.
    fn store_unit(
        &self,
        component: &Component,
        interface: &mut dyn MemoryInterface,
        unit: usize,
    ) -> Result<(), Error> {
        let value: u32 = self.clone().into();
        tracing::debug!("{} {}{} <- {:#010x}", component.kind(), Self::NAME, unit, value);
        component.write_reg(interface, Self::ADDRESS_OFFSET + 16 * unit as u64, value)
    }
}

/// Declares a 32-bit register with `bitfield` accessors and its location
/// within the owning component.
macro_rules! memory_mapped_bitfield_register {
    (
        $(#[$outer:meta])*
        pub struct $name:ident(u32);
        $offset:expr, $reg_name:expr,
        impl From;
        $($fields:tt)*
    ) => {
        bitfield::bitfield! {
            $(#[$outer])*
            #[derive(Copy, Clone, PartialEq, Eq)]
            pub struct $name(u32);
            impl Debug;
            $($fields)*
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl $crate::register::MemoryMappedRegister for $name {
            const ADDRESS_OFFSET: u64 = $offset;
            const NAME: &'static str = $reg_name;
        }
    };
}

pub(crate) use memory_mapped_bitfield_register;
