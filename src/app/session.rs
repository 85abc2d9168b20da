use crate::core::device::DeviceThreshold;
use crate::core::threshold::{compute_threshold, ThresholdInput, ThresholdReport};
use crate::core::validator::{validate, EffectiveLoad};
use crate::core::{Baffle, CalculationSettings, EquipmentRepository, Tap};
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt;

/// Result of one threshold request, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct LimiterOutcome {
    /// `None` for custom (hand-entered) computations.
    pub speaker: Option<String>,
    pub amplifier: Option<String>,
    pub load: Option<EffectiveLoad>,
    pub input: ThresholdInput,
    pub report: ThresholdReport,
    pub device: DeviceThreshold,
}

impl fmt::Display for LimiterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.input.smart { "smart limiter" } else { "plain" };
        match (&self.speaker, &self.amplifier, &self.load) {
            (Some(speaker), Some(amplifier), Some(load)) => writeln!(
                f,
                "{} on {} @ {} ({})",
                speaker, amplifier, load.tap, mode
            )?,
            _ => writeln!(f, "[Custom] {}Ω ({})", self.input.impedance, mode)?,
        }
        writeln!(f, "  baffle:              {}", self.input.baffle)?;
        writeln!(f, "  speaker power:       {} W AES", self.input.speaker_power)?;
        writeln!(f, "  amplifier gain:      {} dB", self.input.ampli_gain)?;
        writeln!(f, "  amplifier power:     {} W RMS", self.input.ampli_power)?;
        writeln!(f, "  speaker max voltage: {} V", self.report.speaker_max_voltage)?;
        writeln!(f, "  ampli max voltage:   {} V", self.report.ampli_max_voltage)?;
        let limit = if self.report.limited_by_speaker() {
            "speaker"
        } else {
            "amplifier"
        };
        write!(
            f,
            "  threshold:           {} ({}, limited by {})",
            self.device, self.device.device, limit
        )
    }
}

/// Ties a repository to the calculation settings for the life of a run.
pub struct LimiterSession<R: EquipmentRepository, C: CalculationSettings> {
    pub(crate) repository: R,
    pub(crate) settings: C,
}

impl<R: EquipmentRepository, C: CalculationSettings> LimiterSession<R, C> {
    pub fn new(repository: R, settings: C) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &C {
        &self.settings
    }

    /// Threshold for catalog equipment at `tap`.
    pub fn compute(&self, speaker_ref: &str, ampli_ref: &str, tap: Tap) -> Result<LimiterOutcome> {
        let speaker = self.repository.speaker(speaker_ref)?;
        let ampli = self.repository.amplifier(ampli_ref)?;

        let load = validate(speaker, ampli, tap)?;
        tracing::debug!(
            "Validated {} on {} @ {}: {} W effective, {} W amplifier",
            speaker.reference(),
            ampli.reference(),
            tap,
            load.effective_power,
            load.ampli_power_at_tap
        );

        let input = load.threshold_input(self.settings.sensitivity(), self.settings.smart());
        let mut outcome = self.evaluate(input)?;
        outcome.speaker = Some(speaker.reference().to_string());
        outcome.amplifier = Some(ampli.reference().to_string());
        outcome.load = Some(load);
        Ok(outcome)
    }

    /// Threshold for hand-entered values. Only the numeric preconditions apply.
    pub fn custom(&self, input: ThresholdInput) -> Result<LimiterOutcome> {
        tracing::debug!("Custom computation: {:?}", input);
        self.evaluate(input)
    }

    /// Input built from the raw custom values and the session settings.
    pub fn custom_input(
        &self,
        impedance: f64,
        baffle: Baffle,
        speaker_power: f64,
        ampli_gain: f64,
        ampli_power: f64,
    ) -> ThresholdInput {
        ThresholdInput::new(impedance, baffle, speaker_power, ampli_gain, ampli_power)
            .with_sensitivity(self.settings.sensitivity())
            .with_smart(self.settings.smart())
    }

    fn evaluate(&self, input: ThresholdInput) -> Result<LimiterOutcome> {
        let report = compute_threshold(&input)?;
        let device = self.settings.device().threshold(&report)?;
        tracing::debug!(
            "Speaker threshold {:.3} dBu, amplifier threshold {:.3} dBu -> {}",
            report.speaker_threshold,
            report.ampli_threshold,
            device
        );

        Ok(LimiterOutcome {
            speaker: None,
            amplifier: None,
            load: None,
            input,
            report,
            device,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::EquipmentCatalog;
    use crate::config::Settings;
    use crate::core::device::LimiterDevice;
    use crate::core::{Amplifier, Speaker, TapPowers};
    use crate::utils::error::LimiterError;

    fn session(settings: Settings) -> LimiterSession<EquipmentCatalog, Settings> {
        let catalog = EquipmentCatalog::from_parts(
            [Amplifier::new(
                "Admark K420",
                41.0,
                TapPowers::from_pairs(&[(Tap::Ohm8, 4200), (Tap::Ohm4, 3400)]),
                Some(4),
            )
            .unwrap()],
            [Speaker::new("MTH", 8, 1600, "40-200", Baffle::Closed).unwrap()],
        )
        .unwrap();
        LimiterSession::new(catalog, settings)
    }

    #[test]
    fn compute_from_catalog() {
        let outcome = session(Settings::default())
            .compute("MTH", "Admark K420", Tap::Ohm8)
            .unwrap();
        assert_eq!(outcome.report.threshold_dbu.to_string(), "-1.5");
        assert_eq!(outcome.device.to_string(), "-1.5 dBu");
        assert_eq!(outcome.load.unwrap().effective_power, 1600);
        assert!(outcome.to_string().starts_with("MTH on Admark K420 @ 8Ω"));
    }

    #[test]
    fn settings_drive_mode_and_device() {
        let settings = Settings {
            smart: false,
            device: LimiterDevice::Dcx2496Top,
            ..Settings::default()
        };
        let outcome = session(settings).compute("MTH", "Admark K420", Tap::Ohm8).unwrap();
        assert_eq!(outcome.report.threshold_dbu.to_string(), "2.2");
        assert_eq!(outcome.device.to_string(), "-16.0 dB");
    }

    #[test]
    fn unknown_reference_surfaces() {
        let err = session(Settings::default())
            .compute("F221", "Admark K420", Tap::Ohm4)
            .unwrap_err();
        assert!(matches!(err, LimiterError::UnknownReference { .. }));
    }

    #[test]
    fn custom_mode_skips_compatibility_rules() {
        let session = session(Settings::default());
        // A 16 ohm load is not a catalog tap, but custom mode accepts it.
        let input = session.custom_input(16.0, Baffle::Open, 300.0, 26.0, 500.0);
        let outcome = session.custom(input).unwrap();
        assert!(outcome.speaker.is_none());
        assert!(outcome.to_string().starts_with("[Custom] 16Ω"));
    }
}
