//! The CoreSight trace components of an ARMv7-M core.
//!
//! Reference: ARMv7-M Architecture Reference Manual, chapter C1 "ARMv7-M Debug".

pub mod dcb;
pub mod dwt;
pub mod itm;
pub mod tpiu;

use serde::{Deserialize, Serialize};

use crate::register::DebugComponentInterface;
use crate::{Error, MemoryInterface};
use dcb::Demcr;
pub use dwt::{ComparatorConfig, CycleTap, Dwt, DwtCapabilities, DwtConfig, SyncTap};
pub use itm::{
    GlobalTimestampFrequency, Itm, ItmConfig, LocalTimestampPrescaler, PortMask, PortWait,
    StimulusWriter, ITM_ENABLE_STIMULUS_PORTS_ALL,
};
pub use tpiu::{Tpiu, TpiuConfig, TpiuProtocol};

/// Key which unlocks write access to a component through its lock access register.
pub const UNLOCK_KEY: u32 = 0xC5AC_CE55;

/// Offset of the lock access register, identical for all CoreSight components.
pub(crate) const REGISTER_OFFSET_LAR: u64 = 0xFB0;

/// The kind of a trace component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralType {
    /// Debug Control Block
    Dcb,
    /// Data Watchpoint and Trace unit
    Dwt,
    /// Instrumentation Trace Macrocell
    Itm,
    /// Trace Port Interface Unit
    Tpiu,
}

impl core::fmt::Display for PeripheralType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            PeripheralType::Dcb => "DCB",
            PeripheralType::Dwt => "DWT",
            PeripheralType::Itm => "ITM",
            PeripheralType::Tpiu => "TPIU",
        })
    }
}

/// A trace component located at a fixed base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    kind: PeripheralType,
    base_address: u64,
}

impl Component {
    /// Creates a component of `kind` whose registers start at `base_address`.
    pub fn new(kind: PeripheralType, base_address: u64) -> Self {
        Self { kind, base_address }
    }

    /// The kind of this component.
    pub fn kind(&self) -> PeripheralType {
        self.kind
    }

    /// The base address of this component.
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    /// Reads the 32-bit register at `offset` from the component base.
    pub fn read_reg(&self, interface: &mut dyn MemoryInterface, offset: u64) -> Result<u32, Error> {
        interface.read_word_32(self.base_address + offset)
    }

    /// Writes the 32-bit register at `offset` from the component base.
    pub fn write_reg(
        &self,
        interface: &mut dyn MemoryInterface,
        offset: u64,
        value: u32,
    ) -> Result<(), Error> {
        interface.write_word_32(self.base_address + offset, value)
    }
}

/// Base addresses of the trace components of a device.
///
/// The defaults are the architectural addresses of the ARMv7-M private
/// peripheral bus, which almost every Cortex-M3/M4/M7 uses. Parts that place
/// a component elsewhere override the matching field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentMap {
    /// Debug Control Block, holding DEMCR.
    pub dcb: u64,
    /// Instrumentation Trace Macrocell.
    pub itm: u64,
    /// Data Watchpoint and Trace unit.
    pub dwt: u64,
    /// Trace Port Interface Unit.
    pub tpiu: u64,
}

impl ComponentMap {
    /// Returns the component of type `kind`.
    pub fn component(&self, kind: PeripheralType) -> Component {
        let base_address = match kind {
            PeripheralType::Dcb => self.dcb,
            PeripheralType::Dwt => self.dwt,
            PeripheralType::Itm => self.itm,
            PeripheralType::Tpiu => self.tpiu,
        };
        Component::new(kind, base_address)
    }
}

impl Default for ComponentMap {
    fn default() -> Self {
        Self {
            dcb: 0xE000_EDF0,
            itm: 0xE000_0000,
            dwt: 0xE000_1000,
            tpiu: 0xE004_0000,
        }
    }
}

/// Sets TRCENA in DEMCR, which enables the DWT and ITM.
pub fn enable_tracing(
    interface: &mut dyn MemoryInterface,
    components: &ComponentMap,
) -> Result<(), Error> {
    let dcb = components.component(PeripheralType::Dcb);
    let mut demcr = Demcr::load(&dcb, interface)?;
    demcr.set_trcena(true);
    demcr.store(&dcb, interface)
}

/// Clears TRCENA in DEMCR, which stops all trace generation.
pub fn disable_tracing(
    interface: &mut dyn MemoryInterface,
    components: &ComponentMap,
) -> Result<(), Error> {
    let dcb = components.component(PeripheralType::Dcb);
    let mut demcr = Demcr::load(&dcb, interface)?;
    demcr.set_trcena(false);
    demcr.store(&dcb, interface)
}

/// Writes the unlock key to the lock access register of `component`.
pub(crate) fn unlock(component: &Component, interface: &mut dyn MemoryInterface) -> Result<(), Error> {
    tracing::trace!("Unlocking {}", component.kind());
    component.write_reg(interface, REGISTER_OFFSET_LAR, UNLOCK_KEY)
}
