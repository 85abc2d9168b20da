#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use toml_config::TomlConfig;

use crate::core::device::LimiterDevice;
use crate::core::threshold::DEFAULT_SENSITIVITY;
use crate::core::CalculationSettings;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive, Validate};
use serde::{Deserialize, Serialize};

/// Calculation settings after file values and command-line overrides are merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub sensitivity: f64,
    pub smart: bool,
    pub device: LimiterDevice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            smart: true,
            device: LimiterDevice::Dbu,
        }
    }
}

impl Settings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            sensitivity: config.calculation.sensitivity,
            smart: config.calculation.smart,
            device: config.calculation.device,
        }
    }

    pub fn with_overrides(
        mut self,
        sensitivity: Option<f64>,
        smart: Option<bool>,
        device: Option<LimiterDevice>,
    ) -> Self {
        if let Some(sensitivity) = sensitivity {
            self.sensitivity = sensitivity;
        }
        if let Some(smart) = smart {
            self.smart = smart;
        }
        if let Some(device) = device {
            self.device = device;
        }
        self
    }
}

impl CalculationSettings for Settings {
    fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    fn smart(&self) -> bool {
        self.smart
    }

    fn device(&self) -> LimiterDevice {
        self.device
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_positive("sensitivity", self.sensitivity)
    }
}
