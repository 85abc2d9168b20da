use crate::adapters::EquipmentCatalog;
use crate::config::Settings;
use crate::core::device::LimiterDevice;
use crate::domain::model::{Amplifier, AmplifierRecord, Speaker, SpeakerRecord};
use crate::utils::error::{LimiterError, Result};
use crate::utils::validation::{validate_one_of, validate_positive, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub calculation: CalculationConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub amplifiers: Vec<AmplifierRecord>,
    #[serde(default)]
    pub speakers: Vec<SpeakerRecord>,
}

/// `[calculation]` table; missing keys fall back to `Settings::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    pub sensitivity: f64,
    pub smart: bool,
    pub device: LimiterDevice,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        let Settings {
            sensitivity,
            smart,
            device,
        } = Settings::default();
        Self {
            sensitivity,
            smart,
            device,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// Load and parse a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replace `${VAR_NAME}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LimiterError::Config {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive("calculation.sensitivity", self.calculation.sensitivity)?;

        if let Some(level) = self.log_level() {
            validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }

        // Surfaces equipment invariant violations before anything is computed.
        self.catalog()?;

        Ok(())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// Build the in-memory catalog from the `[[amplifiers]]` and `[[speakers]]` tables.
    pub fn catalog(&self) -> Result<EquipmentCatalog> {
        let amplifiers = self
            .amplifiers
            .iter()
            .cloned()
            .map(Amplifier::try_from)
            .collect::<Result<Vec<_>>>()?;
        let speakers = self
            .speakers
            .iter()
            .cloned()
            .map(Speaker::try_from)
            .collect::<Result<Vec<_>>>()?;
        EquipmentCatalog::from_parts(amplifiers, speakers)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
