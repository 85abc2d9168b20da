//! RMS limiter threshold.
//!
//! In an amplifier, `P = U² / R` so `U = sqrt(P * R)`, and
//! `U_out = U_in * 10^(gain / 20)`. With `dBu = 20 * log10(U / 0.775)` the
//! input level that drives the output to `U_out` is
//! `dBu_in = 20 * log10(U_out / 0.775) - gain`.
//!
//! The threshold is computed once from the speaker's power and once from the
//! amplifier's, and the lower of the two is kept so both are protected.

use crate::core::quantize::{quantize, quantize_threshold, Quantized, Rounding};
use crate::domain::model::Baffle;
use crate::utils::error::{LimiterError, Result};
use crate::utils::validation::is_strictly_positive;
use serde::Serialize;

/// Reference voltage for 0 dBu.
pub const DEFAULT_SENSITIVITY: f64 = 0.775;

/// Smart-limiter derating for open baffles.
pub const BAFFLE_FACTOR_OPEN: f64 = 1.5625;
/// Smart-limiter derating for closed (sealed) baffles.
pub const BAFFLE_FACTOR_CLOSED: f64 = 2.34375;
/// Smart-limiter derating applied to the amplifier rating.
pub const AMPLI_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdInput {
    /// Working impedance in ohms.
    pub impedance: f64,
    pub baffle: Baffle,
    /// Speaker AES power at `impedance`, in watts.
    pub speaker_power: f64,
    /// Amplifier voltage gain in dB.
    pub ampli_gain: f64,
    /// Amplifier RMS power at `impedance`, in watts.
    pub ampli_power: f64,
    /// Volts for 0 dBu.
    pub sensitivity: f64,
    pub smart: bool,
}

impl ThresholdInput {
    /// Input with the default 0.775 V sensitivity and smart mode on.
    pub fn new(
        impedance: f64,
        baffle: Baffle,
        speaker_power: f64,
        ampli_gain: f64,
        ampli_power: f64,
    ) -> Self {
        Self {
            impedance,
            baffle,
            speaker_power,
            ampli_gain,
            ampli_power,
            sensitivity: DEFAULT_SENSITIVITY,
            smart: true,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_smart(mut self, smart: bool) -> Self {
        self.smart = smart;
        self
    }

    fn check(&self) -> Result<()> {
        require_positive("impedance", self.impedance)?;
        require_positive("speaker_power", self.speaker_power)?;
        require_positive("ampli_power", self.ampli_power)?;
        require_positive("sensitivity", self.sensitivity)?;
        if !self.ampli_gain.is_finite() {
            return Err(LimiterError::InvalidCalculatorInput {
                field: "ampli_gain",
                value: self.ampli_gain,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdReport {
    /// Highest safe RMS voltage for the speaker, volts (2 decimals).
    pub speaker_max_voltage: Quantized,
    /// Highest safe RMS voltage for the amplifier, volts (2 decimals).
    pub ampli_max_voltage: Quantized,
    /// Limiter threshold in dBu (1 decimal).
    pub threshold_dbu: Quantized,
    /// Unquantized threshold derived from the speaker alone.
    pub speaker_threshold: f64,
    /// Unquantized threshold derived from the amplifier alone.
    pub ampli_threshold: f64,
}

impl ThresholdReport {
    /// The stricter of the two component thresholds, before quantization.
    pub fn raw_threshold(&self) -> f64 {
        self.speaker_threshold.min(self.ampli_threshold)
    }

    /// Which device sets the threshold.
    pub fn limited_by_speaker(&self) -> bool {
        self.speaker_threshold <= self.ampli_threshold
    }
}

pub fn baffle_factor(baffle: Baffle, smart: bool) -> f64 {
    match (smart, baffle) {
        (false, _) => 1.0,
        (true, Baffle::Open) => BAFFLE_FACTOR_OPEN,
        (true, Baffle::Closed) => BAFFLE_FACTOR_CLOSED,
    }
}

pub fn ampli_factor(smart: bool) -> f64 {
    if smart {
        AMPLI_FACTOR
    } else {
        1.0
    }
}

/// RMS voltage across `impedance` when it dissipates `power`.
pub fn rms_voltage(power: f64, impedance: f64) -> f64 {
    (power * impedance).sqrt()
}

/// `voltage` expressed in dB relative to `sensitivity`.
pub fn volts_to_dbu(voltage: f64, sensitivity: f64) -> f64 {
    20.0 * (voltage / sensitivity).log10()
}

pub fn compute_threshold(input: &ThresholdInput) -> Result<ThresholdReport> {
    input.check()?;

    let baffle_factor = baffle_factor(input.baffle, input.smart);
    let ampli_factor = ampli_factor(input.smart);

    let speaker_max_voltage = rms_voltage(input.speaker_power / baffle_factor, input.impedance);
    let speaker_threshold =
        volts_to_dbu(speaker_max_voltage, input.sensitivity) - input.ampli_gain;

    let ampli_max_voltage = rms_voltage(input.ampli_power / ampli_factor, input.impedance);
    let ampli_threshold = volts_to_dbu(ampli_max_voltage, input.sensitivity) - input.ampli_gain;

    let threshold = speaker_threshold.min(ampli_threshold);

    // Extreme magnitudes overflow the voltages or their fixed-point units.
    let speaker_max_voltage = quantize(speaker_max_voltage, 2, Rounding::HalfEven).ok_or(
        LimiterError::InvalidCalculatorInput {
            field: "speaker_power",
            value: input.speaker_power,
        },
    )?;
    let ampli_max_voltage = quantize(ampli_max_voltage, 2, Rounding::HalfEven).ok_or(
        LimiterError::InvalidCalculatorInput {
            field: "ampli_power",
            value: input.ampli_power,
        },
    )?;
    let threshold_dbu =
        quantize_threshold(threshold, 1).ok_or(LimiterError::InvalidCalculatorInput {
            field: "threshold",
            value: threshold,
        })?;

    Ok(ThresholdReport {
        speaker_max_voltage,
        ampli_max_voltage,
        threshold_dbu,
        speaker_threshold,
        ampli_threshold,
    })
}

fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if is_strictly_positive(value) {
        Ok(())
    } else {
        Err(LimiterError::InvalidCalculatorInput { field, value })
    }
}
