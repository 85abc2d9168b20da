pub mod device;
pub mod gain;
pub mod quantize;
pub mod threshold;
pub mod validator;

pub use crate::domain::model::{Amplifier, Baffle, PowerRating, Speaker, Tap, TapPowers};
pub use crate::domain::ports::{CalculationSettings, EquipmentRepository};
pub use crate::utils::error::Result;
