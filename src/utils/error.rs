use crate::domain::model::{EquipmentKind, Tap};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LimiterError {
    #[error("{amplifier} does not support the {tap} tap")]
    AmplifierTapUnsupported { amplifier: String, tap: Tap },

    #[error("{speaker} is rated {rated}Ω and cannot be driven at {requested}Ω")]
    SpeakerImpedanceExceeded {
        speaker: String,
        rated: u32,
        requested: u32,
    },

    #[error("Unknown {kind} reference: {reference}")]
    UnknownReference {
        kind: EquipmentKind,
        reference: String,
    },

    #[error("Invalid calculator input: {field} = {value}")]
    InvalidCalculatorInput { field: &'static str, value: f64 },

    #[error("Invalid spec for '{reference}': {reason}")]
    InvalidSpec { reference: String, reason: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Compatibility,
    Lookup,
    Calculation,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LimiterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AmplifierTapUnsupported { .. } | Self::SpeakerImpedanceExceeded { .. } => {
                ErrorCategory::Compatibility
            }
            Self::UnknownReference { .. } => ErrorCategory::Lookup,
            Self::InvalidCalculatorInput { .. } => ErrorCategory::Calculation,
            Self::InvalidSpec { .. } | Self::Csv(_) | Self::Serialization(_) => ErrorCategory::Data,
            Self::InvalidConfigValue { .. } | Self::Config { .. } | Self::Toml(_) => {
                ErrorCategory::Configuration
            }
            Self::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // A non-standard pairing is a "custom" state, not a failure.
            ErrorCategory::Compatibility => ErrorSeverity::Low,
            ErrorCategory::Lookup | ErrorCategory::Configuration => ErrorSeverity::Medium,
            // Reaching the formulas with bad numbers means validation was skipped upstream.
            ErrorCategory::Calculation | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AmplifierTapUnsupported { .. } => {
                "Pick one of the taps the amplifier supports (see `list`)"
            }
            Self::SpeakerImpedanceExceeded { .. } => {
                "Use a tap at or below the speaker's rated impedance, or enter the values in custom mode"
            }
            Self::UnknownReference { .. } => "Check the reference against the catalog (see `list`)",
            Self::InvalidCalculatorInput { .. } => {
                "Impedance, powers and sensitivity must all be strictly positive"
            }
            Self::InvalidSpec { .. } => "Fix the equipment entry in the catalog file",
            Self::InvalidConfigValue { .. } | Self::Config { .. } | Self::Toml(_) => {
                "Check the configuration file syntax and values"
            }
            Self::Io(_) => "Check that the file exists and is readable/writable",
            Self::Serialization(_) | Self::Csv(_) => "Check the output destination",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Compatibility => format!("Custom configuration: {}", self),
            ErrorCategory::Lookup => format!("Not found: {}", self),
            ErrorCategory::Calculation => format!("Cannot compute threshold: {}", self),
            ErrorCategory::Data => format!("Bad equipment data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LimiterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_errors_are_low_severity() {
        let err = LimiterError::AmplifierTapUnsupported {
            amplifier: "t.amp TSA 4-1300".to_string(),
            tap: Tap::Ohm2,
        };
        assert_eq!(err.category(), ErrorCategory::Compatibility);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().starts_with("Custom configuration"));
    }

    #[test]
    fn calculator_input_is_loud() {
        let err = LimiterError::InvalidCalculatorInput {
            field: "impedance",
            value: 0.0,
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.to_string(), "Invalid calculator input: impedance = 0");
    }

    #[test]
    fn io_errors_are_critical() {
        let err: LimiterError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
