use crate::memory::AccessWidth;

/// The error type of all trace component operations.
#[derive(Debug, docsplay::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// A {width} access at {address:#010x} failed.
    Memory {
        /// Absolute address of the access.
        address: u64,
        /// Width of the access.
        width: AccessWidth,
        /// What the memory interface reported.
        #[cfg(feature = "std")]
        #[source]
        source: anyhow::Error,
    },

    /// Stimulus port {port} was not ready after {polls} polls.
    PortTimeout {
        /// The stimulus port that stayed busy.
        port: u8,
        /// Number of readiness polls performed.
        polls: u32,
    },

    /// The trace configuration is invalid.
    Config(#[cfg_attr(feature = "std", source)] ConfigError),

    /// The trace configuration could not be parsed.
    #[cfg(feature = "std")]
    Yaml(#[from] serde_yaml::Error),

    /// {0}
    #[cfg(feature = "std")]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Error::Config(error)
    }
}

/// A configuration value the hardware cannot represent.
///
/// Only produced by the explicit `validate` methods, the setup operations pass values through unchecked.
#[derive(Debug, docsplay::Display, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ConfigError {
    /// Sampling prescaler {0} is outside of 1..=16.
    SamplingPrescaler(u8),
    /// SWO prescaler {0} is outside of 1..=8192.
    SwoPrescaler(u32),
    /// Trace port width {0} is outside of 1..=32.
    TracePortWidth(u8),
    /// Trace bus ID {0:#x} does not fit into 7 bits.
    TraceBusId(u8),
    /// Comparator {0} does not exist, at most 4 comparators are supported.
    ComparatorIndex(u8),
    /// Comparator {index} ignores {ignore_bits} address bits, at most 31 are possible.
    IgnoreBits {
        /// Comparator index.
        index: u8,
        /// Requested number of ignored bits.
        ignore_bits: u8,
    },
    /// Comparator {index} address {address:#010x} is not aligned to its {ignore_bits} ignored bits.
    UnalignedComparator {
        /// Comparator index.
        index: u8,
        /// Requested base address.
        address: u32,
        /// Requested number of ignored bits.
        ignore_bits: u8,
    },
    /// Comparator {index} function code {function:#x} does not fit into 4 bits.
    ComparatorFunction {
        /// Comparator index.
        index: u8,
        /// Requested function code.
        function: u8,
    },
}
