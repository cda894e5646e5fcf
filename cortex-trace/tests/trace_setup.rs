use cortex_trace::component::{Dwt, Itm, PortWait};
use cortex_trace::test::{Access, MockMemory};
use cortex_trace::{AccessWidth, ConfigError, Error, TraceConfig};
use pretty_assertions::assert_eq;

const SWO_CONFIG: &str = "
tpiu:
  protocol: swo_uart
  swo_prescaler: 36
itm:
  trace_bus_id: 1
  forward_dwt: true
  enable_sync_packet: true
dwt:
  exception_trace: true
  sync_tap: tap24
comparators:
  - index: 0
    address: 0x20000100
    ignore_bits: 2
    function: 6
";

const DEMCR: u64 = 0xE000_EDFC;

fn write(address: u64, value: u32) -> Access {
    Access::write(address, AccessWidth::U32, value)
}

#[test]
fn swo_config_is_written_in_bring_up_order() {
    let config = TraceConfig::from_yaml_str(SWO_CONFIG).unwrap();
    config.validate().unwrap();

    let mut memory = MockMemory::new();
    config.apply(&mut memory).unwrap();

    assert_eq!(
        memory.writes(),
        vec![
            // TPIU
            write(DEMCR, 0x0100_0000),
            write(0xE004_0010, 35),
            write(0xE004_00F0, 2),
            write(0xE004_0004, 1),
            write(0xE004_0304, 0),
            // ITM
            write(DEMCR, 0x0100_0000),
            write(0xE000_0FB0, 0xC5AC_CE55),
            write(0xE000_0E80, 0x0001_000D),
            write(0xE000_0E00, 0xFFFF_FFFF),
            // DWT
            write(DEMCR, 0x0100_0000),
            write(0xE000_1FB0, 0xC5AC_CE55),
            write(0xE000_1000, 0x0001_0401),
            // Comparator 0
            write(0xE000_1020, 0x2000_0100),
            write(0xE000_1024, 2),
            write(0xE000_1028, 6),
        ]
    );
    assert_eq!(memory.flushes(), 1);
}

#[test]
fn printing_after_setup_reaches_the_stimulus_port() {
    let config = TraceConfig::from_yaml_str(SWO_CONFIG).unwrap();
    let mut memory = MockMemory::new();
    config.apply(&mut memory).unwrap();
    memory.hold(0xE000_0000, 1);

    let mut itm = Itm::new(&mut memory, &config.components).with_wait(PortWait::Bounded(16));
    itm.write_buffer(0, b"boot\n").unwrap();

    let stimulus: Vec<Access> = memory
        .writes()
        .into_iter()
        .filter(|access| access.address() == 0xE000_0000)
        .collect();
    assert_eq!(
        stimulus,
        vec![
            write(0xE000_0000, u32::from_ne_bytes(*b"boot")),
            Access::write(0xE000_0000, AccessWidth::U8, u32::from(b'\n')),
        ]
    );
}

#[test]
fn relocated_components_from_yaml() {
    let config = TraceConfig::from_yaml_str(
        "components:\n  dwt: 0x50001000\ndwt:\n  pc_sampling: true\n  sampling_prescaler: 16\n",
    )
    .unwrap();

    let mut memory = MockMemory::new();
    config.apply(&mut memory).unwrap();

    assert_eq!(memory.word(0x5000_1FB0), 0xC5AC_CE55);
    assert_eq!(memory.word(0x5000_1000), (1 << 12) | (15 << 1) | 1);
    assert_eq!(memory.word(0xE000_1000), 0);

    let mut dwt = Dwt::new(&mut memory, &config.components);
    dwt.disable_comparator(1).unwrap();
    assert_eq!(memory.writes().last().copied(), Some(write(0x5000_1038, 0)));
}

#[test]
fn invalid_values_are_reported_by_validation_only() {
    let config = TraceConfig::from_yaml_str("itm:\n  trace_bus_id: 200\n").unwrap();

    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::TraceBusId(200)))
    ));

    let mut memory = MockMemory::new();
    config.apply(&mut memory).unwrap();
    assert_eq!(memory.word(0xE000_0E80), ((200 & 0x7F) << 16) | 1);
}
