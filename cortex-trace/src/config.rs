//! Complete trace setups, loadable from YAML.
//!
//! ```yaml
//! tpiu:
//!   protocol: swo_uart
//!   swo_prescaler: 36
//! itm:
//!   trace_bus_id: 1
//!   forward_dwt: true
//!   enable_sync_packet: true
//! dwt:
//!   exception_trace: true
//!   sync_tap: tap24
//! comparators:
//!   - index: 0
//!     address: 0x20000100
//!     ignore_bits: 2
//!     function: 6
//! ```

use serde::{Deserialize, Serialize};

use crate::component::{
    ComparatorConfig, ComponentMap, Dwt, DwtConfig, Itm, ItmConfig, Tpiu, TpiuConfig,
};
use crate::{Error, MemoryInterface};

/// The configuration of all trace components of a device.
///
/// Components without a section are left untouched by [`TraceConfig::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Where the components are located.
    pub components: ComponentMap,
    /// Output port configuration.
    pub tpiu: Option<TpiuConfig>,
    /// Instrumentation trace configuration.
    pub itm: Option<ItmConfig>,
    /// Data watchpoint and trace configuration.
    pub dwt: Option<DwtConfig>,
    /// Comparators armed after the DWT is configured.
    pub comparators: Vec<ComparatorConfig>,
}

impl TraceConfig {
    /// Parses a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a configuration from a YAML reader, e.g. an open file.
    pub fn from_yaml_reader(reader: impl std::io::Read) -> Result<Self, Error> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Checks all sections, reporting the first value that does not fit its register.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(tpiu) = &self.tpiu {
            tpiu.validate()?;
        }
        if let Some(itm) = &self.itm {
            itm.validate()?;
        }
        if let Some(dwt) = &self.dwt {
            dwt.validate()?;
        }
        for comparator in &self.comparators {
            comparator.validate()?;
        }
        Ok(())
    }

    /// Configures the components in bring-up order: TPIU, ITM, DWT and then the comparators.
    ///
    /// Clocks and pin multiplexing of the trace port must already be set up.
    pub fn apply(&self, interface: &mut dyn MemoryInterface) -> Result<(), Error> {
        if let Some(tpiu) = &self.tpiu {
            tracing::debug!("Configuring TPIU: {:?}", tpiu);
            Tpiu::new(interface, &self.components).setup(tpiu)?;
        }
        if let Some(itm) = &self.itm {
            tracing::debug!("Configuring ITM: {:?}", itm);
            Itm::new(interface, &self.components).setup(itm)?;
        }
        if let Some(dwt) = &self.dwt {
            tracing::debug!("Configuring DWT: {:?}", dwt);
            Dwt::new(interface, &self.components).setup(dwt)?;
        }
        if !self.comparators.is_empty() {
            let mut dwt = Dwt::new(interface, &self.components);
            for comparator in &self.comparators {
                dwt.enable_comparator_config(comparator)?;
            }
        }
        interface.flush()
    }

    /// Validates the configuration and applies it if it is valid.
    pub fn apply_checked(&self, interface: &mut dyn MemoryInterface) -> Result<(), Error> {
        self.validate()?;
        self.apply(interface)
    }
}
