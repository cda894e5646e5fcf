//! Module for using the ITM.
//!
//! ITM = Instrumentation Trace Macrocell
//!
//! The ITM emits user data written to its 32 stimulus ports, forwards the
//! DWT packets and generates timestamp and synchronization packets.
//!
//! Reference: ARMv7-M Architecture Reference Manual, chapter C1.7

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{enable_tracing, unlock, Component, ComponentMap, PeripheralType};
use crate::register::{memory_mapped_bitfield_register, DebugComponentInterface};
use crate::{ConfigError, Error, MemoryInterface};

/// Port enable mask with all stimulus ports enabled.
pub const ITM_ENABLE_STIMULUS_PORTS_ALL: u32 = 0xFFFF_FFFF;

/// How often global timestamps are generated.
///
/// See ARMv7-M Architecture Reference Manual, section C1.7.1, "Timestamp support".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalTimestampFrequency {
    /// No global timestamps.
    #[default]
    Disabled = 0,
    /// Timestamp whenever bit 7 of the global timestamp counter changes.
    Position7 = 1,
    /// Timestamp whenever bit 13 of the global timestamp counter changes.
    Position13 = 2,
    /// Timestamp after every packet if the output FIFO is empty.
    IfOutputFifoEmpty = 3,
}

/// Prescaler of the local timestamp clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalTimestampPrescaler {
    /// Local timestamps count the reference clock directly.
    #[default]
    NoPrescaling = 0,
    /// Divide the reference clock by 4.
    DivideBy4 = 1,
    /// Divide the reference clock by 16.
    DivideBy16 = 2,
    /// Divide the reference clock by 64.
    DivideBy64 = 3,
}

/// What [`Itm::setup`] writes to the trace enable register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMask {
    /// Enable all 32 stimulus ports and ignore
    /// [`ItmConfig::enabled_stimulus_ports`].
    ///
    /// This is what deployed configurations have always received.
    #[default]
    EnableAll,
    /// Write [`ItmConfig::enabled_stimulus_ports`] to the trace enable register.
    Apply,
}

/// ITM configuration.
///
/// Check with the vendor documentation which capabilities are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItmConfig {
    /// ATB ID of the ITM.
    ///
    /// Shows up in the TPIU frames when
    /// [`TpiuConfig::formatting_enabled`](super::TpiuConfig::formatting_enabled) is set
    /// and tells the ITM data apart from other trace sources. The receiver needs to know it.
    pub trace_bus_id: u8,
    /// How often absolute timestamps are generated.
    pub global_timestamp_frequency: GlobalTimestampFrequency,
    /// Clock divider of the delta timestamps.
    pub local_timestamp_prescaler: LocalTimestampPrescaler,
    /// Generate local (delta) timestamp packets.
    pub enable_local_timestamp: bool,
    /// Forward the DWT packets.
    ///
    /// Required for PC sampling, exception trace and data watchpoints, not
    /// needed if the stimulus ports are all that is used.
    pub forward_dwt: bool,
    /// Emit periodic synchronization packets, the interval is configured
    /// with [`DwtConfig::sync_tap`](super::DwtConfig::sync_tap).
    pub enable_sync_packet: bool,
    /// One bit per stimulus port, set bits enable the port.
    ///
    /// Only written to the hardware with [`PortMask::Apply`].
    pub enabled_stimulus_ports: u32,
    /// Whether [`Self::enabled_stimulus_ports`] is applied.
    pub port_mask: PortMask,
}

impl Default for ItmConfig {
    fn default() -> Self {
        Self {
            trace_bus_id: 1,
            global_timestamp_frequency: GlobalTimestampFrequency::Disabled,
            local_timestamp_prescaler: LocalTimestampPrescaler::NoPrescaling,
            enable_local_timestamp: false,
            forward_dwt: false,
            enable_sync_packet: false,
            enabled_stimulus_ports: ITM_ENABLE_STIMULUS_PORTS_ALL,
            port_mask: PortMask::EnableAll,
        }
    }
}

impl ItmConfig {
    /// Computes the ITM_TCR word for this configuration, with the ITM enabled.
    pub fn control_word(&self) -> Tcr {
        let mut tcr = Tcr(0);
        tcr.set_tracebusid(self.trace_bus_id);
        tcr.set_gtsfreq(self.global_timestamp_frequency as u8);
        tcr.set_tsprescale(self.local_timestamp_prescaler as u8);
        tcr.set_txena(self.forward_dwt);
        tcr.set_syncena(self.enable_sync_packet);
        tcr.set_tsena(self.enable_local_timestamp);
        tcr.set_itmena(true);
        tcr
    }

    /// The value written to the trace enable register.
    pub fn trace_enable_word(&self) -> u32 {
        match self.port_mask {
            PortMask::EnableAll => ITM_ENABLE_STIMULUS_PORTS_ALL,
            PortMask::Apply => self.enabled_stimulus_ports,
        }
    }

    /// Checks that every value fits the register fields it is written to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trace_bus_id > 0x7F {
            return Err(ConfigError::TraceBusId(self.trace_bus_id));
        }
        Ok(())
    }
}

/// How a stimulus write waits for the port FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortWait {
    /// Spin until the port accepts data, without any limit.
    ///
    /// A trace sink that never drains blocks the caller forever.
    #[default]
    Spin,
    /// Poll the port at most this many times, then fail with
    /// [`Error::PortTimeout`].
    Bounded(u32),
}

/// A struct representing the ITM unit on target.
pub struct Itm<'a> {
    components: ComponentMap,
    interface: &'a mut dyn MemoryInterface,
    wait: PortWait,
}

impl<'a> Itm<'a> {
    /// Creates a new ITM component representation which spins on busy ports.
    pub fn new(interface: &'a mut dyn MemoryInterface, components: &ComponentMap) -> Self {
        Itm {
            components: *components,
            interface,
            wait: PortWait::Spin,
        }
    }

    /// Replaces the way stimulus writes wait for a busy port.
    pub fn with_wait(mut self, wait: PortWait) -> Self {
        self.wait = wait;
        self
    }

    fn component(&self) -> Component {
        self.components.component(PeripheralType::Itm)
    }

    fn stimulus_address(&self, port: u8) -> u64 {
        self.component().base_address() + 4 * u64::from(port)
    }

    /// Unlocks register write access.
    pub fn unlock(&mut self) -> Result<(), Error> {
        unlock(&self.component(), self.interface)
    }

    /// Applies `config`.
    ///
    /// Enables global tracing, unlocks the unit, replaces the control register
    /// and then writes the trace enable register according to
    /// [`ItmConfig::port_mask`].
    pub fn setup(&mut self, config: &ItmConfig) -> Result<(), Error> {
        enable_tracing(self.interface, &self.components)?;
        self.unlock()?;

        let component = self.component();
        config.control_word().store(&component, self.interface)?;
        Ter(config.trace_enable_word()).store(&component, self.interface)
    }

    /// Returns true if the ITM is enabled and `port` is enabled in the trace enable register.
    ///
    /// Ports outside of 0..=31 are never enabled.
    pub fn is_port_enabled(&mut self, port: u8) -> Result<bool, Error> {
        let component = self.component();
        if !Tcr::load(&component, self.interface)?.itmena() {
            return Ok(false);
        }
        let Some(bit) = 1u32.checked_shl(u32::from(port)) else {
            return Ok(false);
        };
        Ok(Ter::load(&component, self.interface)?.ports() & bit != 0)
    }

    /// Restricts stimulus port groups to privileged code.
    ///
    /// Bit `n` of `groups` covers ports `8n..8n + 8`. Must be called after
    /// [`Self::unlock`] or [`Self::setup`].
    pub fn set_privileged_ports(&mut self, groups: u8) -> Result<(), Error> {
        let mut tpr = Tpr(0);
        tpr.set_privmask(groups);
        tpr.store(&self.component(), self.interface)
    }

    /// Returns true while the ITM is processing packets.
    pub fn is_busy(&mut self) -> Result<bool, Error> {
        Ok(Tcr::load(&self.component(), self.interface)?.busy())
    }

    /// Waits until the FIFO slot of `port` is free, a read of zero means it is full.
    fn wait_ready(&mut self, port: u8) -> Result<(), Error> {
        let address = self.stimulus_address(port);
        match self.wait {
            PortWait::Spin => {
                while self.interface.read_word_32(address)? == 0 {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            PortWait::Bounded(polls) => {
                for _ in 0..polls {
                    if self.interface.read_word_32(address)? != 0 {
                        return Ok(());
                    }
                    core::hint::spin_loop();
                }
                tracing::warn!("Stimulus port {} still busy after {} polls", port, polls);
                Err(Error::PortTimeout { port, polls })
            }
        }
    }

    /// Writes an 8-bit value to `port`.
    ///
    /// Nothing is written if the port is disabled.
    pub fn write_u8(&mut self, port: u8, value: u8) -> Result<(), Error> {
        if !self.is_port_enabled(port)? {
            return Ok(());
        }
        self.wait_ready(port)?;
        self.interface
            .write_word_8(self.stimulus_address(port), value)
    }

    /// Writes a 16-bit value to `port`.
    ///
    /// Nothing is written if the port is disabled.
    pub fn write_u16(&mut self, port: u8, value: u16) -> Result<(), Error> {
        if !self.is_port_enabled(port)? {
            return Ok(());
        }
        self.wait_ready(port)?;
        self.interface
            .write_word_16(self.stimulus_address(port), value)
    }

    /// Writes a 32-bit value to `port`.
    ///
    /// Nothing is written if the port is disabled.
    pub fn write_u32(&mut self, port: u8, value: u32) -> Result<(), Error> {
        if !self.is_port_enabled(port)? {
            return Ok(());
        }
        self.wait_ready(port)?;
        self.interface
            .write_word_32(self.stimulus_address(port), value)
    }

    /// Writes `buffer` to `port` using the largest transfers possible.
    ///
    /// Whole words go first, then one half-word and finally the remaining
    /// byte. Multi-byte transfers carry the bytes in native memory order.
    /// Nothing is written if the port is disabled.
    pub fn write_buffer(&mut self, port: u8, buffer: &[u8]) -> Result<(), Error> {
        let mut written = 0;
        self.emit_buffer(port, buffer, &mut written)
    }

    /// Like [`Self::write_buffer`], counting the bytes handed to the port in `written`.
    ///
    /// On error `written` tells how much of `buffer` already went out.
    fn emit_buffer(&mut self, port: u8, buffer: &[u8], written: &mut usize) -> Result<(), Error> {
        if !self.is_port_enabled(port)? {
            return Ok(());
        }
        let address = self.stimulus_address(port);

        let mut words = buffer.chunks_exact(4);
        for word in &mut words {
            self.wait_ready(port)?;
            self.interface
                .write_word_32(address, u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))?;
            *written += 4;
        }

        let bytes = match words.remainder() {
            [first, second, tail @ ..] => {
                self.wait_ready(port)?;
                self.interface
                    .write_word_16(address, u16::from_ne_bytes([*first, *second]))?;
                *written += 2;
                tail
            }
            rest => rest,
        };

        for byte in bytes {
            self.wait_ready(port)?;
            self.interface.write_word_8(address, *byte)?;
            *written += 1;
        }

        tracing::trace!("Wrote {} bytes to stimulus port {}", buffer.len(), port);
        Ok(())
    }

    /// Returns a writer which sends everything to `port`.
    ///
    /// It implements [`core::fmt::Write`], and `std::io::Write` with the `std` feature.
    pub fn port(&mut self, port: u8) -> StimulusWriter<'_, 'a> {
        StimulusWriter { itm: self, port }
    }
}

/// Writes data to a single stimulus port, see [`Itm::port`].
pub struct StimulusWriter<'i, 'a> {
    itm: &'i mut Itm<'a>,
    port: u8,
}

impl fmt::Write for StimulusWriter<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.itm
            .write_buffer(self.port, s.as_bytes())
            .map_err(|_| fmt::Error)
    }
}

#[cfg(feature = "std")]
impl std::io::Write for StimulusWriter<'_, '_> {
    /// Fails only if nothing was written. A timeout after some transfers
    /// reports the bytes that went out.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut written = 0;
        match self.itm.emit_buffer(self.port, buf, &mut written) {
            Ok(()) => Ok(buf.len()),
            Err(error) if written == 0 => Err(std::io::Error::other(error)),
            Err(error) => {
                tracing::debug!("Partial write of {} bytes: {}", written, error);
                Ok(written)
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.itm.interface.flush().map_err(std::io::Error::other)
    }
}

memory_mapped_bitfield_register! {
    /// Trace Enable Register, ITM_TER
    pub struct Ter(u32);
    0xE00, "ITM/TER",
    impl From;
    pub u32, ports, set_ports: 31, 0;
}

impl DebugComponentInterface for Ter {}

memory_mapped_bitfield_register! {
    /// Trace Privilege Register, ITM_TPR
    pub struct Tpr(u32);
    0xE40, "ITM/TPR",
    impl From;
    /// One bit per group of 8 stimulus ports, set bits restrict the group to privileged code.
    pub u8, privmask, set_privmask: 3, 0;
}

impl DebugComponentInterface for Tpr {}

memory_mapped_bitfield_register! {
    /// Trace Control Register, ITM_TCR
    pub struct Tcr(u32);
    0xE80, "ITM/TCR",
    impl From;
    pub busy, _: 23;
    /// 7 bits trace bus ID
    pub u8, tracebusid, set_tracebusid: 22, 16;
    pub u8, gtsfreq, set_gtsfreq: 11, 10;
    pub u8, tsprescale, set_tsprescale: 9, 8;
    pub swoena, set_swoena: 4;
    /// Forwarding of DWT packets
    pub txena, set_txena: 3;
    pub syncena, set_syncena: 2;
    pub tsena, set_tsena: 1;
    pub itmena, set_itmena: 0;
}

impl DebugComponentInterface for Tcr {}

#[cfg(test)]
mod test {
    use std::fmt;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::{
        GlobalTimestampFrequency, Itm, ItmConfig, LocalTimestampPrescaler, PortMask, PortWait,
    };
    use crate::component::ComponentMap;
    use crate::test::{Access, MockMemory};
    use crate::{AccessWidth, Error};

    const ITM_TER: u64 = 0xE000_0E00;
    const ITM_TCR: u64 = 0xE000_0E80;
    const ITM_LAR: u64 = 0xE000_0FB0;
    const DEMCR: u64 = 0xE000_EDFC;

    fn stim(port: u64) -> u64 {
        0xE000_0000 + 4 * port
    }

    /// ITM enabled, all ports enabled, every port ready.
    fn enabled_itm() -> MockMemory {
        let mut memory = MockMemory::new();
        memory.set_word(ITM_TCR, 1);
        memory.set_word(ITM_TER, 0xFFFF_FFFF);
        for port in 0..32 {
            memory.hold(stim(port), 1);
        }
        memory
    }

    fn stimulus_writes(memory: &MockMemory, port: u64) -> Vec<Access> {
        memory
            .writes()
            .into_iter()
            .filter(|access| access.address() == stim(port))
            .collect()
    }

    #[test]
    fn control_word_encoding() {
        let config = ItmConfig {
            trace_bus_id: 0x13,
            global_timestamp_frequency: GlobalTimestampFrequency::Position13,
            local_timestamp_prescaler: LocalTimestampPrescaler::DivideBy64,
            enable_local_timestamp: true,
            forward_dwt: true,
            enable_sync_packet: true,
            ..Default::default()
        };

        assert_eq!(
            u32::from(config.control_word()),
            (0x13 << 16) | (2 << 10) | (3 << 8) | (1 << 3) | (1 << 2) | (1 << 1) | 1
        );
    }

    #[test]
    fn control_word_always_enables_itm() {
        let config = ItmConfig {
            trace_bus_id: 0,
            ..Default::default()
        };
        assert_eq!(u32::from(config.control_word()), 1);
    }

    #[test]
    fn setup_writes_control_and_enables_all_ports() {
        let mut memory = MockMemory::new();
        let config = ItmConfig {
            enabled_stimulus_ports: 0x0000_0003,
            ..Default::default()
        };

        Itm::new(&mut memory, &ComponentMap::default())
            .setup(&config)
            .unwrap();

        assert_eq!(
            memory.writes(),
            vec![
                Access::write(DEMCR, AccessWidth::U32, 0x0100_0000),
                Access::write(ITM_LAR, AccessWidth::U32, 0xC5AC_CE55),
                Access::write(ITM_TCR, AccessWidth::U32, 0x0001_0001),
                Access::write(ITM_TER, AccessWidth::U32, 0xFFFF_FFFF),
            ]
        );
    }

    #[test_case(0x0000_0000)]
    #[test_case(0x8000_0001)]
    #[test_case(0xFFFF_FFFF)]
    fn setup_ignores_port_mask_by_default(ports: u32) {
        let mut memory = MockMemory::new();
        let config = ItmConfig {
            enabled_stimulus_ports: ports,
            ..Default::default()
        };

        Itm::new(&mut memory, &ComponentMap::default())
            .setup(&config)
            .unwrap();

        assert_eq!(memory.word(ITM_TER), 0xFFFF_FFFF);
    }

    #[test]
    fn setup_applies_port_mask_on_request() {
        let mut memory = MockMemory::new();
        let config = ItmConfig {
            enabled_stimulus_ports: 0x0000_0005,
            port_mask: PortMask::Apply,
            ..Default::default()
        };

        Itm::new(&mut memory, &ComponentMap::default())
            .setup(&config)
            .unwrap();

        assert_eq!(memory.word(ITM_TER), 0x0000_0005);
    }

    #[test]
    fn setup_is_idempotent() {
        let config = ItmConfig {
            forward_dwt: true,
            ..Default::default()
        };

        let mut once = MockMemory::new();
        Itm::new(&mut once, &ComponentMap::default())
            .setup(&config)
            .unwrap();

        let mut twice = MockMemory::new();
        let mut itm = Itm::new(&mut twice, &ComponentMap::default());
        itm.setup(&config).unwrap();
        itm.setup(&config).unwrap();

        assert_eq!(once.words(), twice.words());
    }

    #[test]
    fn port_enable_requires_master_enable() {
        let mut memory = MockMemory::new();
        memory.set_word(ITM_TCR, 0);
        memory.set_word(ITM_TER, 0xFFFF_FFFF);

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        for port in 0..32 {
            assert!(!itm.is_port_enabled(port).unwrap());
        }
    }

    #[test]
    fn port_enable_follows_mask_bits() {
        let mut memory = MockMemory::new();
        memory.set_word(ITM_TCR, 1);
        memory.set_word(ITM_TER, 0xA5A5_0F0F);

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        for port in 0..32u8 {
            let expected = 0xA5A5_0F0Fu32 & (1 << port) != 0;
            assert_eq!(itm.is_port_enabled(port).unwrap(), expected, "port {port}");
        }
        assert!(!itm.is_port_enabled(32).unwrap());
    }

    #[test]
    fn disabled_port_write_is_a_no_op() {
        let mut memory = enabled_itm();
        memory.set_word(ITM_TER, 0xFFFF_FFFE);

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        itm.write_u8(0, 1).unwrap();
        itm.write_u16(0, 1).unwrap();
        itm.write_u32(0, 1).unwrap();
        itm.write_buffer(0, b"hello").unwrap();

        assert!(memory.writes().is_empty());
    }

    #[test]
    fn writes_use_requested_width() {
        let mut memory = enabled_itm();

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        itm.write_u8(3, 0xAB).unwrap();
        itm.write_u16(3, 0xABCD).unwrap();
        itm.write_u32(3, 0xDEAD_BEEF).unwrap();

        assert_eq!(
            stimulus_writes(&memory, 3),
            vec![
                Access::write(stim(3), AccessWidth::U8, 0xAB),
                Access::write(stim(3), AccessWidth::U16, 0xABCD),
                Access::write(stim(3), AccessWidth::U32, 0xDEAD_BEEF),
            ]
        );
    }

    #[test]
    fn write_spins_until_port_is_ready() {
        let mut memory = enabled_itm();
        memory.script_reads(stim(1), [0, 0, 0]);

        Itm::new(&mut memory, &ComponentMap::default())
            .write_u32(1, 42)
            .unwrap();

        let polls = memory
            .accesses()
            .iter()
            .filter(|access| matches!(access, Access::Read { address, .. } if *address == stim(1)))
            .count();
        assert_eq!(polls, 4);
        assert_eq!(
            stimulus_writes(&memory, 1),
            vec![Access::write(stim(1), AccessWidth::U32, 42)]
        );
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut memory = enabled_itm();
        memory.hold(stim(2), 0);

        let result = Itm::new(&mut memory, &ComponentMap::default())
            .with_wait(PortWait::Bounded(5))
            .write_u8(2, 1);

        assert!(matches!(result, Err(Error::PortTimeout { port: 2, polls: 5 })));
        assert!(stimulus_writes(&memory, 2).is_empty());
    }

    #[test]
    fn bounded_wait_succeeds_when_port_drains() {
        let mut memory = enabled_itm();
        memory.script_reads(stim(2), [0, 0]);

        Itm::new(&mut memory, &ComponentMap::default())
            .with_wait(PortWait::Bounded(3))
            .write_u8(2, 7)
            .unwrap();

        assert_eq!(
            stimulus_writes(&memory, 2),
            vec![Access::write(stim(2), AccessWidth::U8, 7)]
        );
    }

    #[test]
    fn seven_byte_buffer_uses_word_halfword_and_byte() {
        let mut memory = enabled_itm();

        Itm::new(&mut memory, &ComponentMap::default())
            .write_buffer(0, &[1, 2, 3, 4, 5, 6, 7])
            .unwrap();

        let port_accesses: Vec<Access> = memory
            .accesses()
            .iter()
            .copied()
            .filter(|access| access.address() == stim(0))
            .collect();

        assert_eq!(
            port_accesses,
            vec![
                Access::read(stim(0), 1),
                Access::write(stim(0), AccessWidth::U32, u32::from_ne_bytes([1, 2, 3, 4])),
                Access::read(stim(0), 1),
                Access::write(stim(0), AccessWidth::U16, u32::from(u16::from_ne_bytes([5, 6]))),
                Access::read(stim(0), 1),
                Access::write(stim(0), AccessWidth::U8, 7),
            ]
        );
    }

    #[test_case(0, &[]; "empty")]
    #[test_case(1, &[AccessWidth::U8]; "single byte")]
    #[test_case(3, &[AccessWidth::U16, AccessWidth::U8]; "three bytes")]
    #[test_case(8, &[AccessWidth::U32, AccessWidth::U32]; "two words")]
    #[test_case(10, &[AccessWidth::U32, AccessWidth::U32, AccessWidth::U16]; "two words and a halfword")]
    fn buffer_chunking(len: usize, widths: &[AccessWidth]) {
        let mut memory = enabled_itm();
        let buffer = vec![0x55; len];

        Itm::new(&mut memory, &ComponentMap::default())
            .write_buffer(9, &buffer)
            .unwrap();

        let written: Vec<AccessWidth> = stimulus_writes(&memory, 9)
            .iter()
            .filter_map(Access::width)
            .collect();
        assert_eq!(written, widths);
    }

    #[test]
    fn io_write_goes_to_selected_port() {
        let mut memory = enabled_itm();

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        write!(itm.port(4), "hi!").unwrap();

        assert_eq!(
            stimulus_writes(&memory, 4),
            vec![
                Access::write(stim(4), AccessWidth::U16, u32::from(u16::from_ne_bytes(*b"hi"))),
                Access::write(stim(4), AccessWidth::U8, u32::from(b'!')),
            ]
        );
    }

    #[test]
    fn privileged_ports_write_tpr() {
        let mut memory = MockMemory::new();

        Itm::new(&mut memory, &ComponentMap::default())
            .set_privileged_ports(0x1F)
            .unwrap();

        assert_eq!(
            memory.writes(),
            vec![Access::write(0xE000_0E40, AccessWidth::U32, 0xF)]
        );
    }

    #[test_case(0x0080_0001, true; "busy")]
    #[test_case(0x0000_0001, false; "idle")]
    fn busy_flag_is_read_from_tcr(tcr: u32, busy: bool) {
        let mut memory = MockMemory::new();
        memory.set_word(ITM_TCR, tcr);

        assert_eq!(
            Itm::new(&mut memory, &ComponentMap::default())
                .is_busy()
                .unwrap(),
            busy
        );
    }

    #[test]
    fn io_write_reports_bytes_sent_before_timeout() {
        let mut memory = enabled_itm();
        memory.hold(stim(0), 0);
        memory.script_reads(stim(0), [1]);

        let mut itm =
            Itm::new(&mut memory, &ComponentMap::default()).with_wait(PortWait::Bounded(3));
        let written = itm.port(0).write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        assert_eq!(written, 4);
        assert_eq!(
            stimulus_writes(&memory, 0),
            vec![Access::write(
                stim(0),
                AccessWidth::U32,
                u32::from_ne_bytes([1, 2, 3, 4])
            )]
        );
    }

    #[test]
    fn io_write_fails_when_nothing_was_sent() {
        let mut memory = enabled_itm();
        memory.hold(stim(0), 0);

        let mut itm =
            Itm::new(&mut memory, &ComponentMap::default()).with_wait(PortWait::Bounded(3));
        let result = itm.port(0).write(&[1, 2, 3, 4]);

        assert!(result.is_err());
        assert!(stimulus_writes(&memory, 0).is_empty());
    }

    #[test]
    fn fmt_write_formats_into_port() {
        let mut memory = enabled_itm();

        let mut itm = Itm::new(&mut memory, &ComponentMap::default());
        fmt::Write::write_fmt(&mut itm.port(5), format_args!("{}", 42)).unwrap();

        assert_eq!(
            stimulus_writes(&memory, 5),
            vec![Access::write(
                stim(5),
                AccessWidth::U16,
                u32::from(u16::from_ne_bytes(*b"42"))
            )]
        );
    }
}
