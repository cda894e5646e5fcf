//! # Trace setup for ARM Cortex-M
//!
//! Configures the three components that make up the instrumentation trace
//! pipeline of an ARMv7-M core:
//!
//! - the [DWT](component::Dwt), which counts cycles, samples the PC, traces
//!   exceptions and watches memory ranges,
//! - the [ITM](component::Itm), which forwards DWT packets, generates
//!   timestamps and emits user data written to its stimulus ports,
//! - the [TPIU](component::Tpiu), which selects how the trace stream leaves
//!   the chip (parallel port, Manchester or UART encoded SWO).
//!
//! Every operation goes through a [`MemoryInterface`], either [`Mmio`] on the
//! running core or anything else that can reach the registers. Decoding of
//! the emitted trace stream is left to the host side receiver.
//!
//! # Examples
//!
//! ## Printing over SWO
//!
//! ```no_run
//! # use cortex_trace::Error;
//! use cortex_trace::component::{ComponentMap, Itm, ItmConfig, Tpiu, TpiuConfig, TpiuProtocol};
//! use cortex_trace::Mmio;
//! use std::io::Write;
//!
//! // Trace clock and pins must already be configured.
//! let mut memory = unsafe { Mmio::new() };
//! let components = ComponentMap::default();
//!
//! Tpiu::new(&mut memory, &components)
//!     .setup(&TpiuConfig::swo(TpiuProtocol::SwoUart, 72_000_000, 2_000_000))?;
//!
//! let mut itm = Itm::new(&mut memory, &components);
//! itm.setup(&ItmConfig::default())?;
//! writeln!(itm.port(0), "Hello, world!").unwrap();
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Applying a configuration file
//!
//! ```no_run
//! # use cortex_trace::Error;
//! use cortex_trace::{Mmio, TraceConfig};
//!
//! let config = TraceConfig::from_yaml_reader(std::fs::File::open("trace.yaml").unwrap())?;
//! config.apply_checked(&mut unsafe { Mmio::new() })?;
//! # Ok::<(), Error>(())
//! ```
//!
//! ## On the core itself
//!
//! Without the default `std` feature the crate is `no_std` and allocation free.
//! YAML configuration and `std::io::Write` are unavailable, stimulus ports are
//! written with [`core::fmt::Write`].
//!
//! ```ignore
//! use core::fmt::Write;
//! use cortex_trace::component::{ComponentMap, Itm, ItmConfig};
//! use cortex_trace::Mmio;
//!
//! let mut memory = unsafe { Mmio::new() };
//! let mut itm = Itm::new(&mut memory, &ComponentMap::default());
//! itm.setup(&ItmConfig::default()).ok();
//! write!(itm.port(0), "boot {}", 1).ok();
//! ```
//!
//! # Concurrency
//!
//! The components are chip-wide state without any locking. Setups perform
//! read-modify-write sequences and stimulus writes poll before they write, so
//! callers must keep concurrent contexts (interrupt handlers, other threads)
//! from using the same component at the same time.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod component;
#[cfg(feature = "std")]
pub mod config;
mod error;
pub mod memory;
pub mod register;


pub use crate::component::{
    disable_tracing, enable_tracing, Dwt, DwtConfig, Itm, ItmConfig, Tpiu, TpiuConfig,
};
#[cfg(feature = "std")]
pub use crate::config::TraceConfig;
pub use crate::error::{ConfigError, Error};
pub use crate::memory::{AccessWidth, MemoryInterface, Mmio};
