use crate::core::device::LimiterDevice;
use crate::domain::model::{Amplifier, Speaker};
use crate::utils::error::Result;

/// Read-only lookup over loaded equipment specs.
///
/// Implementations own the data; callers only ever borrow it. A miss is
/// `LimiterError::UnknownReference`, never a panic.
pub trait EquipmentRepository: Send + Sync {
    fn amplifier(&self, reference: &str) -> Result<&Amplifier>;
    fn speaker(&self, reference: &str) -> Result<&Speaker>;

    /// All amplifiers, ordered by reference.
    fn amplifiers(&self) -> Box<dyn Iterator<Item = &Amplifier> + '_>;
    /// All speakers, ordered by reference.
    fn speakers(&self) -> Box<dyn Iterator<Item = &Speaker> + '_>;
}

/// Calculation settings, whichever layer they come from (file, flags).
pub trait CalculationSettings: Send + Sync {
    /// Volts for 0 dBu.
    fn sensitivity(&self) -> f64;
    /// Apply the smart-limiter derating factors.
    fn smart(&self) -> bool;
    fn device(&self) -> LimiterDevice;
}
