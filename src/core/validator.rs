use crate::core::threshold::ThresholdInput;
use crate::domain::model::{Amplifier, Baffle, PowerRating, Speaker, Tap};
use crate::utils::error::{LimiterError, Result};
use serde::Serialize;

/// A speaker/amplifier pairing that passed validation at one tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveLoad {
    pub tap: Tap,
    /// Numeric load in ohms implied by `tap`.
    pub impedance: u32,
    /// Speaker AES power scaled to `impedance`, in watts.
    pub effective_power: u64,
    pub ampli_power_at_tap: u32,
    pub ampli_gain: f64,
    pub baffle: Baffle,
}

impl EffectiveLoad {
    pub fn threshold_input(&self, sensitivity: f64, smart: bool) -> ThresholdInput {
        ThresholdInput {
            impedance: f64::from(self.impedance),
            baffle: self.baffle,
            speaker_power: self.effective_power as f64,
            ampli_gain: self.ampli_gain,
            ampli_power: f64::from(self.ampli_power_at_tap),
            sensitivity,
            smart,
        }
    }
}

/// Check that `speaker` may be driven by `ampli` at `tap`.
///
/// The amplifier is checked first, so an unsupported tap is reported even
/// when the speaker would also reject it.
pub fn validate(speaker: &Speaker, ampli: &Amplifier, tap: Tap) -> Result<EffectiveLoad> {
    let ampli_power_at_tap = match ampli.power_at(tap) {
        PowerRating::Supported(watts) => watts,
        PowerRating::Unsupported => {
            return Err(LimiterError::AmplifierTapUnsupported {
                amplifier: ampli.reference().to_string(),
                tap,
            })
        }
    };

    let impedance = tap.ohms();
    if impedance > speaker.impedance() {
        return Err(LimiterError::SpeakerImpedanceExceeded {
            speaker: speaker.reference().to_string(),
            rated: speaker.impedance(),
            requested: impedance,
        });
    }

    Ok(EffectiveLoad {
        tap,
        impedance,
        effective_power: effective_power(speaker, impedance),
        ampli_power_at_tap,
        ampli_gain: ampli.gain(),
        baffle: speaker.baffle(),
    })
}

/// AES power scales inversely with load: half the impedance, twice the watts.
/// Rounded to the nearest watt, halves away from zero. A `u32` rating scaled
/// by at most four always fits.
pub fn effective_power(speaker: &Speaker, impedance: u32) -> u64 {
    let scaled =
        f64::from(speaker.power()) * f64::from(speaker.impedance()) / f64::from(impedance);
    scaled.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TapPowers;

    fn speaker(impedance: u32, power: u32) -> Speaker {
        Speaker::new("test speaker", impedance, power, "40-200", Baffle::Closed).unwrap()
    }

    fn ampli(pairs: &[(Tap, u32)]) -> Amplifier {
        Amplifier::new("test ampli", 41.0, TapPowers::from_pairs(pairs), Some(2)).unwrap()
    }

    #[test]
    fn rated_tap_keeps_rated_power() {
        let load = validate(&speaker(8, 1600), &ampli(&[(Tap::Ohm8, 4200)]), Tap::Ohm8).unwrap();
        assert_eq!(load.effective_power, 1600);
        assert_eq!(load.ampli_power_at_tap, 4200);
        assert_eq!(load.impedance, 8);
        assert_eq!(load.ampli_gain, 41.0);
        assert_eq!(load.baffle, Baffle::Closed);
    }

    #[test]
    fn lower_tap_scales_power_up() {
        let amp = ampli(&[(Tap::Ohm4, 1300), (Tap::Ohm2, 2000)]);
        let spk = speaker(8, 500);
        assert_eq!(validate(&spk, &amp, Tap::Ohm4).unwrap().effective_power, 1000);
        assert_eq!(validate(&spk, &amp, Tap::Ohm2).unwrap().effective_power, 2000);
    }

    #[test]
    fn bridged_tap_uses_base_impedance() {
        let amp = ampli(&[(Tap::Ohm4Bridged, 2600)]);
        let load = validate(&speaker(8, 700), &amp, Tap::Ohm4Bridged).unwrap();
        assert_eq!(load.impedance, 4);
        assert_eq!(load.effective_power, 1400);
        assert_eq!(load.ampli_power_at_tap, 2600);
    }

    #[test]
    fn unsupported_tap_is_reported() {
        let err = validate(&speaker(4, 900), &ampli(&[(Tap::Ohm8, 800)]), Tap::Ohm4).unwrap_err();
        assert!(matches!(
            err,
            LimiterError::AmplifierTapUnsupported { tap: Tap::Ohm4, .. }
        ));
    }

    #[test]
    fn tap_above_speaker_rating_is_rejected() {
        let err = validate(&speaker(4, 900), &ampli(&[(Tap::Ohm8, 800)]), Tap::Ohm8).unwrap_err();
        assert!(matches!(
            err,
            LimiterError::SpeakerImpedanceExceeded {
                rated: 4,
                requested: 8,
                ..
            }
        ));
    }

    #[test]
    fn amplifier_check_runs_first() {
        // Both rules fail here; the amplifier one wins.
        let err = validate(&speaker(4, 900), &ampli(&[(Tap::Ohm4, 800)]), Tap::Ohm8Bridged)
            .unwrap_err();
        assert!(matches!(err, LimiterError::AmplifierTapUnsupported { .. }));
    }

    #[test]
    fn scaled_power_beyond_u32_is_kept() {
        let spk = speaker(8, u32::MAX);
        let load = validate(&spk, &ampli(&[(Tap::Ohm2, 4000)]), Tap::Ohm2).unwrap();
        assert_eq!(load.effective_power, u64::from(u32::MAX) * 4);
    }

    #[test]
    fn threshold_input_carries_the_load() {
        let load = validate(&speaker(8, 1600), &ampli(&[(Tap::Ohm8, 4200)]), Tap::Ohm8).unwrap();
        let input = load.threshold_input(0.775, false);
        assert_eq!(input.impedance, 8.0);
        assert_eq!(input.speaker_power, 1600.0);
        assert_eq!(input.ampli_power, 4200.0);
        assert!(!input.smart);
    }
}
