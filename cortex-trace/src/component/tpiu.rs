//! Trace Port Interface Unit.
//!
//! The TPIU takes the ITM (and ETM) output and drives it off-chip, either on
//! a parallel trace port or on the single SWO pin.
//!
//! Reference: ARMv7-M Architecture Reference Manual, chapter C1.10

use serde::{Deserialize, Serialize};

use super::{enable_tracing, Component, ComponentMap, PeripheralType};
use crate::register::{memory_mapped_bitfield_register, DebugComponentInterface};
use crate::{ConfigError, Error, MemoryInterface};

/// Output protocol of the trace port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TpiuProtocol {
    /// Parallel trace port with 1 to 32 data lines, see [`TpiuConfig::trace_port_width`].
    Parallel = 0,
    /// Manchester encoded SWO, the receiver detects the data rate.
    SwoManchester = 1,
    /// UART (NRZ) encoded SWO, the receiver must use the exact baud rate.
    #[default]
    SwoUart = 2,
}

/// TPIU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TpiuConfig {
    /// Selected protocol.
    ///
    /// Not every part implements every protocol, refer to the vendor documentation.
    pub protocol: TpiuProtocol,
    /// Wrap the output in formatter frames.
    ///
    /// Each frame carries the trace bus ID of its source, which is required
    /// when more than one source (e.g. ITM and ETM) shares the port. Without
    /// formatting the raw ITM stream is output.
    pub formatting_enabled: bool,
    /// Divider of the trace clock for the SWO protocols.
    ///
    /// `baud rate = trace clock / swo_prescaler`
    pub swo_prescaler: u32,
    /// Number of data lines used by the parallel protocol.
    pub trace_port_width: u8,
}

impl Default for TpiuConfig {
    fn default() -> Self {
        Self {
            protocol: TpiuProtocol::SwoUart,
            formatting_enabled: false,
            swo_prescaler: 1,
            trace_port_width: 1,
        }
    }
}

impl TpiuConfig {
    /// Creates a single wire configuration that outputs `baud` from a trace clock of `trace_clock` Hz.
    ///
    /// A zero `baud` yields a prescaler of zero, which [`Self::validate`] rejects.
    pub fn swo(protocol: TpiuProtocol, trace_clock: u32, baud: u32) -> Self {
        Self {
            protocol,
            swo_prescaler: trace_clock.checked_div(baud).unwrap_or(0),
            ..Default::default()
        }
    }

    /// The value written to the asynchronous clock prescaler register.
    pub fn prescaler_word(&self) -> u32 {
        self.swo_prescaler.wrapping_sub(1)
    }

    /// The one-hot value written to the current port size register.
    ///
    /// Widths outside of 1..=32 yield no set bit.
    pub fn port_size_word(&self) -> u32 {
        match self.trace_port_width {
            0 => 0,
            width => 1u32.checked_shl(u32::from(width) - 1).unwrap_or(0),
        }
    }

    /// Checks that every value fits the register fields it is written to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=8192).contains(&self.swo_prescaler) {
            return Err(ConfigError::SwoPrescaler(self.swo_prescaler));
        }
        if !(1..=32).contains(&self.trace_port_width) {
            return Err(ConfigError::TracePortWidth(self.trace_port_width));
        }
        Ok(())
    }
}

const REGISTER_OFFSET_TPIU_SSPSR: u64 = 0x0;
const REGISTER_OFFSET_TPIU_CSPSR: u64 = 0x4;
const REGISTER_OFFSET_TPIU_ACPR: u64 = 0x10;
const REGISTER_OFFSET_TPIU_SPPR: u64 = 0xF0;

/// Driver of the Trace Port Interface Unit, which sets how the trace stream leaves the chip.
pub struct Tpiu<'a> {
    components: ComponentMap,
    interface: &'a mut dyn MemoryInterface,
}

impl<'a> Tpiu<'a> {
    /// Create a new TPIU interface from a register interface and the component addresses.
    pub fn new(interface: &'a mut dyn MemoryInterface, components: &ComponentMap) -> Self {
        Tpiu {
            components: *components,
            interface,
        }
    }

    fn component(&self) -> Component {
        self.components.component(PeripheralType::Tpiu)
    }

    /// Applies `config`.
    ///
    /// Prescaler, protocol and port size are overwritten, the formatter
    /// register is updated in place so only its continuous formatting bit changes.
    pub fn setup(&mut self, config: &TpiuConfig) -> Result<(), Error> {
        enable_tracing(self.interface, &self.components)?;

        self.set_prescaler(config.prescaler_word())?;
        self.set_pin_protocol(config.protocol)?;
        self.set_port_size(config.port_size_word())?;
        self.set_continuous_formatting(config.formatting_enabled)
    }

    /// Set the port size of the TPIU, one bit per supported width.
    pub fn set_port_size(&mut self, value: u32) -> Result<(), Error> {
        tracing::debug!("TPIU CSPSR <- {:#010x}", value);
        self.component()
            .write_reg(self.interface, REGISTER_OFFSET_TPIU_CSPSR, value)
    }

    /// Set the prescaler of the TPIU.
    pub fn set_prescaler(&mut self, value: u32) -> Result<(), Error> {
        tracing::debug!("TPIU ACPR <- {:#010x}", value);
        self.component()
            .write_reg(self.interface, REGISTER_OFFSET_TPIU_ACPR, value)
    }

    /// Set the TPIU protocol.
    pub fn set_pin_protocol(&mut self, protocol: TpiuProtocol) -> Result<(), Error> {
        tracing::debug!("TPIU SPPR <- {:?}", protocol);
        self.component()
            .write_reg(self.interface, REGISTER_OFFSET_TPIU_SPPR, protocol as u32)
    }

    /// Set or clear EnFCont, leaving the other formatter bits as they are.
    pub fn set_continuous_formatting(&mut self, enabled: bool) -> Result<(), Error> {
        let component = self.component();
        let mut ffcr = Ffcr::load(&component, self.interface)?;
        ffcr.set_enfcont(enabled);
        ffcr.store(&component, self.interface)
    }

    /// Reads the port sizes supported by the TPIU, one bit per width.
    pub fn supported_port_sizes(&mut self) -> Result<u32, Error> {
        self.component()
            .read_reg(self.interface, REGISTER_OFFSET_TPIU_SSPSR)
    }
}

memory_mapped_bitfield_register! {
    /// Formatter and Flush Control Register, TPIU_FFCR
    pub struct Ffcr(u32);
    0x304, "TPIU/FFCR",
    impl From;
    pub trigin, set_trigin: 8;
    pub enfcont, set_enfcont: 1;
}

impl DebugComponentInterface for Ffcr {}
