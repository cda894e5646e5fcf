//! Interface with the DWT (data watchpoint and trace) unit.
//!
//! This unit counts cycles and events, samples the program counter, traces
//! exception entry and exit, and can monitor specific memory locations for
//! read / write access. All of its packets leave the chip through the ITM,
//! so [`ItmConfig::forward_dwt`](super::ItmConfig::forward_dwt) must be set
//! for them to show up in the trace stream.
//!
//! See ARMv7-M architecture reference manual C1.8 for some additional
//! info about this stuff.

use serde::{Deserialize, Serialize};

use super::{enable_tracing, unlock, ComponentMap, PeripheralType};
use crate::register::{memory_mapped_bitfield_register, DebugComponentInterface};
use crate::{ConfigError, Error, MemoryInterface};

/// Number of comparators this driver can address.
pub const MAX_COMPARATORS: u8 = 4;

/// Interval of the ITM synchronization packets, as a tap on CYCCNT.
///
/// See ARMv7-M Architecture Reference Manual, section C1.8.3 "CYCCNT cycle counter and related timers".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTap {
    /// No synchronization packets.
    #[default]
    Disabled = 0,
    /// Synchronization packet whenever CYCCNT\[24\] changes.
    Tap24 = 1,
    /// Synchronization packet whenever CYCCNT\[26\] changes.
    Tap26 = 2,
    /// Synchronization packet whenever CYCCNT\[28\] changes.
    Tap28 = 3,
}

/// Tap on CYCCNT that clocks the POSTCNT counter used for PC sampling and event counter packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleTap {
    /// POSTCNT runs at processor clock / 64.
    #[default]
    Tap6 = 0,
    /// POSTCNT runs at processor clock / 1024.
    Tap10 = 1,
}

/// DWT configuration.
///
/// Check with the vendor documentation which of the features are implemented,
/// nothing here is checked against the capabilities of the part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwtConfig {
    /// Enable the folded instruction counter event.
    pub folded_instruction_counter_event: bool,
    /// Enable the load/store unit counter event.
    pub lsu_counter_event: bool,
    /// Enable the sleep counter event.
    pub sleep_counter_event: bool,
    /// Enable the exception overhead counter event.
    pub exception_overhead_counter_event: bool,
    /// Enable the cycles-per-instruction counter event.
    pub cpi_counter_event: bool,
    /// Emit a packet on every exception entry, exit and return.
    pub exception_trace: bool,
    /// Periodically emit the current program counter.
    pub pc_sampling: bool,
    /// Interval of the ITM synchronization packets.
    pub sync_tap: SyncTap,
    /// Clock of the PC sampling and event counter packets.
    pub cycle_tap: CycleTap,
    /// Divider applied after the cycle tap, 1 to 16.
    ///
    /// `sample rate = POSTCNT clock / sampling_prescaler`
    pub sampling_prescaler: u8,
}

impl Default for DwtConfig {
    fn default() -> Self {
        Self {
            folded_instruction_counter_event: false,
            lsu_counter_event: false,
            sleep_counter_event: false,
            exception_overhead_counter_event: false,
            cpi_counter_event: false,
            exception_trace: false,
            pc_sampling: false,
            sync_tap: SyncTap::Disabled,
            cycle_tap: CycleTap::Tap6,
            sampling_prescaler: 1,
        }
    }
}

impl DwtConfig {
    /// Computes the DWT_CTRL word for this configuration.
    ///
    /// The cycle counter is always enabled, the synchronization and sampling taps are derived from it.
    pub fn control_word(&self) -> Ctrl {
        let mut ctrl = Ctrl(0);
        ctrl.set_foldevtena(self.folded_instruction_counter_event);
        ctrl.set_lsuevtena(self.lsu_counter_event);
        ctrl.set_sleepevtena(self.sleep_counter_event);
        ctrl.set_excevtena(self.exception_overhead_counter_event);
        ctrl.set_cpievtena(self.cpi_counter_event);
        ctrl.set_exctrcena(self.exception_trace);
        ctrl.set_pcsamplena(self.pc_sampling);
        ctrl.set_synctap(self.sync_tap as u8);
        ctrl.set_cyctap(self.cycle_tap == CycleTap::Tap10);
        // POSTPRESET holds the divider minus one.
        ctrl.set_postpreset(self.sampling_prescaler.wrapping_sub(1));
        ctrl.set_cyccntena(true);
        ctrl
    }

    /// Checks that every value fits the register fields it is written to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.sampling_prescaler) {
            return Err(ConfigError::SamplingPrescaler(self.sampling_prescaler));
        }
        Ok(())
    }
}

/// A data watchpoint, as listed in a trace configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Comparator to use, 0 to 3.
    pub index: u8,
    /// Base address of the watched range.
    pub address: u32,
    /// Number of low address bits ignored by the comparison.
    pub ignore_bits: u8,
    /// Emit the accessed data address instead of the program counter.
    pub emit_range: bool,
    /// Comparator function, see [`function`] for common values.
    pub function: u8,
}

impl ComparatorConfig {
    /// Checks that the comparator exists and the range is representable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index >= MAX_COMPARATORS {
            return Err(ConfigError::ComparatorIndex(self.index));
        }
        if self.ignore_bits > 31 {
            return Err(ConfigError::IgnoreBits {
                index: self.index,
                ignore_bits: self.ignore_bits,
            });
        }
        let ignored = (1u32 << self.ignore_bits) - 1;
        if self.address & ignored != 0 {
            return Err(ConfigError::UnalignedComparator {
                index: self.index,
                address: self.address,
                ignore_bits: self.ignore_bits,
            });
        }
        if self.function > 0xF {
            return Err(ConfigError::ComparatorFunction {
                index: self.index,
                function: self.function,
            });
        }
        Ok(())
    }
}

/// Common DWT_FUNCTION values, ARMv7-M Architecture Reference Manual table C1-14.
///
/// The meaning of a value depends on `emit_range` and on the implemented
/// features of the part, these assume address comparison without data value
/// or cycle count matching.
pub mod function {
    /// Comparator disabled.
    pub const DISABLED: u8 = 0b0000;
    /// Emit the PC (or the data address with `emit_range`) on any match.
    pub const EMIT_PC: u8 = 0b0001;
    /// Emit the data value on read or write.
    pub const EMIT_DATA_VALUE: u8 = 0b0010;
    /// Emit the PC and the data value on read or write.
    pub const EMIT_PC_AND_DATA_VALUE: u8 = 0b0011;
    /// Watchpoint on a PC match.
    pub const WATCHPOINT_PC: u8 = 0b0100;
    /// Watchpoint on a read access.
    pub const WATCHPOINT_READ: u8 = 0b0101;
    /// Watchpoint on a write access.
    pub const WATCHPOINT_WRITE: u8 = 0b0110;
    /// Watchpoint on a read or write access.
    pub const WATCHPOINT_ACCESS: u8 = 0b0111;
    /// Emit the data value on a read access.
    pub const DATA_VALUE_READ: u8 = 0b1100;
    /// Emit the data value on a write access.
    pub const DATA_VALUE_WRITE: u8 = 0b1101;
}

/// Features of the DWT reported by its control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwtCapabilities {
    /// Number of implemented comparators.
    pub comparators: u8,
    /// Sampling and exception trace packets are supported.
    pub trace_sampling: bool,
    /// Comparators can trigger external (ETM) events.
    pub external_trigger: bool,
    /// CYCCNT is implemented.
    pub cycle_counter: bool,
    /// The profiling counters are implemented.
    pub profiling_counters: bool,
}

/// A struct representing a DWT unit on target.
pub struct Dwt<'a> {
    components: ComponentMap,
    interface: &'a mut dyn MemoryInterface,
}

impl<'a> Dwt<'a> {
    /// Creates a new DWT component representation.
    pub fn new(interface: &'a mut dyn MemoryInterface, components: &ComponentMap) -> Self {
        Dwt {
            components: *components,
            interface,
        }
    }

    fn component(&self) -> super::Component {
        self.components.component(PeripheralType::Dwt)
    }

    /// Unlocks register write access.
    pub fn unlock(&mut self) -> Result<(), Error> {
        unlock(&self.component(), self.interface)
    }

    /// Applies `config`, replacing the whole control register.
    ///
    /// Enables global tracing and unlocks the unit first. Nothing is validated,
    /// out-of-range values are truncated to their register fields.
    pub fn setup(&mut self, config: &DwtConfig) -> Result<(), Error> {
        enable_tracing(self.interface, &self.components)?;
        self.unlock()?;
        config.control_word().store(&self.component(), self.interface)
    }

    /// Reads the features implemented by this DWT and logs them.
    pub fn capabilities(&mut self) -> Result<DwtCapabilities, Error> {
        let ctrl = Ctrl::load(&self.component(), self.interface)?;
        let capabilities = DwtCapabilities {
            comparators: ctrl.numcomp(),
            trace_sampling: !ctrl.notrcpkt(),
            external_trigger: !ctrl.noexttrig(),
            cycle_counter: !ctrl.nocyccnt(),
            profiling_counters: !ctrl.noprfcnt(),
        };

        tracing::info!("DWT info:");
        tracing::info!("  number of comparators available: {}", capabilities.comparators);
        tracing::info!("  trace sampling support: {}", capabilities.trace_sampling);
        tracing::info!("  compare match support: {}", capabilities.external_trigger);
        tracing::info!("  cyccnt support: {}", capabilities.cycle_counter);
        tracing::info!("  performance counter support: {}", capabilities.profiling_counters);

        Ok(capabilities)
    }

    /// Arms comparator `index` to watch `address`.
    ///
    /// The lowest `ignore_bits` address bits are masked from the comparison,
    /// so a 32-bit variable is watched with `ignore_bits = 2`. With `emit_range`
    /// the emitted packets carry the data address, otherwise the PC of the access.
    ///
    /// The number of comparators is vendor specific and not checked. Indices
    /// above 3 are ignored.
    pub fn enable_comparator(
        &mut self,
        index: u8,
        address: u32,
        ignore_bits: u8,
        emit_range: bool,
        function: u8,
    ) -> Result<(), Error> {
        if index >= MAX_COMPARATORS {
            tracing::trace!("Ignoring enable of nonexistent comparator {}", index);
            return Ok(());
        }
        let unit = index as usize;
        let component = self.component();

        let mut function_reg = Function(0);
        function_reg.set_function(function);
        function_reg.set_emitrange(emit_range);

        Comp(address).store_unit(&component, self.interface, unit)?;
        Mask(u32::from(ignore_bits)).store_unit(&component, self.interface, unit)?;
        function_reg.store_unit(&component, self.interface, unit)
    }

    /// Arms the comparator described by `config`.
    pub fn enable_comparator_config(&mut self, config: &ComparatorConfig) -> Result<(), Error> {
        self.enable_comparator(
            config.index,
            config.address,
            config.ignore_bits,
            config.emit_range,
            config.function,
        )
    }

    /// Disables comparator `index`.
    ///
    /// Only the function register is cleared, address and mask keep their
    /// values. Indices above 3 are ignored.
    pub fn disable_comparator(&mut self, index: u8) -> Result<(), Error> {
        if index >= MAX_COMPARATORS {
            tracing::trace!("Ignoring disable of nonexistent comparator {}", index);
            return Ok(());
        }
        Function(0).store_unit(&self.component(), self.interface, index as usize)
    }

    /// Reads the free-running cycle counter.
    pub fn cycle_count(&mut self) -> Result<u32, Error> {
        Ok(Cyccnt::load(&self.component(), self.interface)?.count())
    }

    /// Read the program counter sample register for the PC value.
    ///
    /// This is an optional DWT component, so your DWT may not implement
    /// it. An implementation that doesn't include this component returns
    /// zero.
    ///
    /// The PC value is `!0` if the processor is in a debug state or another
    /// state that disables the DWT.
    pub fn read_pcsr(&mut self) -> Result<u32, Error> {
        Ok(Pcsr::load(&self.component(), self.interface)?.eiasample())
    }
}

memory_mapped_bitfield_register! {
    /// Control register, DWT_CTRL
    pub struct Ctrl(u32);
    0x00, "DWT/CTRL",
    impl From;
    pub u8, numcomp, _: 31, 28;
    pub notrcpkt, _: 27;
    pub noexttrig, _: 26;
    pub nocyccnt, _: 25;
    pub noprfcnt, _: 24;
    pub cycevtena, set_cycevtena: 22;
    pub foldevtena, set_foldevtena: 21;
    pub lsuevtena, set_lsuevtena: 20;
    pub sleepevtena, set_sleepevtena: 19;
    pub excevtena, set_excevtena: 18;
    pub cpievtena, set_cpievtena: 17;
    pub exctrcena, set_exctrcena: 16;
    pub pcsamplena, set_pcsamplena: 12;
    /// 00 Disabled. No Synchronization packets.
    /// 01 Synchronization counter tap at CYCCNT\[24\].
    /// 10 Synchronization counter tap at CYCCNT\[26\].
    /// 11 Synchronization counter tap at CYCCNT\[28\].
    pub u8, synctap, set_synctap: 11, 10;
    pub cyctap, set_cyctap: 9;
    pub u8, postinit, set_postinit: 8, 5;
    pub u8, postpreset, set_postpreset: 4, 1;
    pub cyccntena, set_cyccntena: 0;
}

impl DebugComponentInterface for Ctrl {}

memory_mapped_bitfield_register! {
    /// Cycle Count register, DWT_CYCCNT
    pub struct Cyccnt(u32);
    0x04, "DWT/CYCCNT",
    impl From;
    pub u32, count, _: 31, 0;
}

impl DebugComponentInterface for Cyccnt {}

memory_mapped_bitfield_register! {
    /// Program Counter Sample register, DWT_PCSR
    pub struct Pcsr(u32);
    0x1C, "DWT/PCSR",
    impl From;
    pub u32, eiasample, _: 31, 0;
}

impl DebugComponentInterface for Pcsr {}

memory_mapped_bitfield_register! {
    /// Comparator registers, DWT_COMPn
    pub struct Comp(u32);
    0x20, "DWT/COMP",
    impl From;
    pub u32, comp, set_comp: 31, 0;
}

impl DebugComponentInterface for Comp {}

memory_mapped_bitfield_register! {
    /// Comparator Mask registers, DWT_MASKn
    pub struct Mask(u32);
    0x24, "DWT/MASK",
    impl From;
    pub u32, mask, set_mask: 4, 0;
}

impl DebugComponentInterface for Mask {}

memory_mapped_bitfield_register! {
    /// Comparator Function registers, DWT_FUNCTIONn
    pub struct Function(u32);
    0x28, "DWT/FUNCTION",
    impl From;
    pub matched, _: 24;
    pub u8, datavaddr1, set_datavaddr1: 19, 16;
    pub u8, datavaddr0, set_datavaddr0: 15, 12;
    /// 00 Byte.
    /// 01 Halfword.
    /// 10 Word.
    pub u8, datavsize, set_datavsize: 11, 10;
    pub lnk1ena, _: 9;
    pub datavmatch, set_datavmatch: 8;
    pub cycmatch, set_cycmatch: 7;
    pub emitrange, set_emitrange: 5;
    pub u8, function, set_function: 3, 0;
}

impl DebugComponentInterface for Function {}
