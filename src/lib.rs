pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::EquipmentCatalog;
pub use crate::app::{LimiterOutcome, LimiterSession};
pub use crate::config::{Settings, TomlConfig};
pub use crate::core::threshold::{compute_threshold, ThresholdInput, ThresholdReport};
pub use crate::core::validator::{validate, EffectiveLoad};
pub use crate::domain::model::{Amplifier, Baffle, PowerRating, Speaker, Tap, TapPowers};
pub use crate::domain::ports::EquipmentRepository;
pub use crate::utils::error::{LimiterError, Result};
