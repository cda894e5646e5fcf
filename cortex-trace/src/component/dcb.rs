//! Debug Control Block registers used by the trace setup.

use crate::register::{memory_mapped_bitfield_register, DebugComponentInterface};

memory_mapped_bitfield_register! {
    /// Debug Exception and Monitor Control Register, DEMCR (see armv7-M Architecture Reference Manual C1.6.5)
    pub struct Demcr(u32);
    0x0C, "DEMCR",
    impl From;
    /// Global enable for DWT and ITM features
    pub trcena, set_trcena: 24;
}

impl DebugComponentInterface for Demcr {}
