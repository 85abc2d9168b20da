use crate::utils::error::{LimiterError, Result};
use crate::utils::validation::is_strictly_positive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const OHM: char = '\u{03A9}';

/// Speaker nominal impedances the catalog accepts.
pub const NOMINAL_IMPEDANCES: [u32; 3] = [2, 4, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentKind {
    Amplifier,
    Speaker,
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amplifier => f.write_str("amplifier"),
            Self::Speaker => f.write_str("speaker"),
        }
    }
}

/// Selectable amplifier output setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tap {
    #[serde(rename = "8Ω", alias = "8")]
    Ohm8,
    #[serde(rename = "4Ω", alias = "4")]
    Ohm4,
    #[serde(rename = "2Ω", alias = "2")]
    Ohm2,
    #[serde(rename = "8Ω-bridged", alias = "8 (bridge)")]
    Ohm8Bridged,
    #[serde(rename = "4Ω-bridged", alias = "4 (bridge)")]
    Ohm4Bridged,
}

impl Tap {
    pub const ALL: [Tap; 5] = [
        Tap::Ohm8,
        Tap::Ohm4,
        Tap::Ohm2,
        Tap::Ohm8Bridged,
        Tap::Ohm4Bridged,
    ];

    /// Numeric load implied by the tap. Bridged taps share their base value.
    pub fn ohms(self) -> u32 {
        match self {
            Tap::Ohm8 | Tap::Ohm8Bridged => 8,
            Tap::Ohm4 | Tap::Ohm4Bridged => 4,
            Tap::Ohm2 => 2,
        }
    }

    pub fn is_bridged(self) -> bool {
        matches!(self, Tap::Ohm8Bridged | Tap::Ohm4Bridged)
    }

    fn index(self) -> usize {
        match self {
            Tap::Ohm8 => 0,
            Tap::Ohm4 => 1,
            Tap::Ohm2 => 2,
            Tap::Ohm8Bridged => 3,
            Tap::Ohm4Bridged => 4,
        }
    }
}

impl fmt::Display for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bridged() {
            write!(f, "{}{}-bridged", self.ohms(), OHM)
        } else {
            write!(f, "{}{}", self.ohms(), OHM)
        }
    }
}

impl FromStr for Tap {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .replace([OHM, '\u{2126}'], "")
            .replace("ohms", "")
            .replace("ohm", "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let (base, bridged) = match normalized.strip_suffix("(bridge)") {
            Some(base) => (base, true),
            None => match normalized
                .strip_suffix("-bridged")
                .or_else(|| normalized.strip_suffix("-bridge"))
            {
                Some(base) => (base, true),
                None => (normalized.as_str(), false),
            },
        };

        match (base, bridged) {
            ("8", false) => Ok(Tap::Ohm8),
            ("4", false) => Ok(Tap::Ohm4),
            ("2", false) => Ok(Tap::Ohm2),
            ("8", true) => Ok(Tap::Ohm8Bridged),
            ("4", true) => Ok(Tap::Ohm4Bridged),
            _ => Err(LimiterError::InvalidConfigValue {
                field: "tap".to_string(),
                value: s.to_string(),
                reason: "Valid taps: 8Ω, 4Ω, 2Ω, 8Ω-bridged, 4Ω-bridged".to_string(),
            }),
        }
    }
}

/// RMS rating of one amplifier tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum PowerRating {
    Supported(u32),
    Unsupported,
}

impl PowerRating {
    pub fn watts(self) -> Option<u32> {
        match self {
            PowerRating::Supported(watts) => Some(watts),
            PowerRating::Unsupported => None,
        }
    }
}

impl From<Option<u32>> for PowerRating {
    fn from(value: Option<u32>) -> Self {
        value.map_or(PowerRating::Unsupported, PowerRating::Supported)
    }
}

impl From<PowerRating> for Option<u32> {
    fn from(value: PowerRating) -> Self {
        value.watts()
    }
}

/// Power rating for every tap; always total over `Tap::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapPowers {
    #[serde(rename = "8Ω", alias = "8", default = "unsupported")]
    ohm8: PowerRating,
    #[serde(rename = "4Ω", alias = "4", default = "unsupported")]
    ohm4: PowerRating,
    #[serde(rename = "2Ω", alias = "2", default = "unsupported")]
    ohm2: PowerRating,
    #[serde(rename = "8Ω-bridged", alias = "8 (bridge)", default = "unsupported")]
    ohm8_bridged: PowerRating,
    #[serde(rename = "4Ω-bridged", alias = "4 (bridge)", default = "unsupported")]
    ohm4_bridged: PowerRating,
}

fn unsupported() -> PowerRating {
    PowerRating::Unsupported
}

impl TapPowers {
    pub fn new(ratings: [PowerRating; 5]) -> Self {
        let [ohm8, ohm4, ohm2, ohm8_bridged, ohm4_bridged] = ratings;
        Self {
            ohm8,
            ohm4,
            ohm2,
            ohm8_bridged,
            ohm4_bridged,
        }
    }

    /// Only the listed taps are supported, everything else is `Unsupported`.
    pub fn from_pairs(pairs: &[(Tap, u32)]) -> Self {
        let mut ratings = [PowerRating::Unsupported; 5];
        for &(tap, watts) in pairs {
            ratings[tap.index()] = PowerRating::Supported(watts);
        }
        Self::new(ratings)
    }

    pub fn get(&self, tap: Tap) -> PowerRating {
        match tap {
            Tap::Ohm8 => self.ohm8,
            Tap::Ohm4 => self.ohm4,
            Tap::Ohm2 => self.ohm2,
            Tap::Ohm8Bridged => self.ohm8_bridged,
            Tap::Ohm4Bridged => self.ohm4_bridged,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tap, PowerRating)> + '_ {
        Tap::ALL.into_iter().map(move |tap| (tap, self.get(tap)))
    }

    pub fn supported(&self) -> impl Iterator<Item = (Tap, u32)> + '_ {
        self.iter()
            .filter_map(|(tap, rating)| rating.watts().map(|watts| (tap, watts)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Baffle {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSED", alias = "SEALED", alias = "CLOSED/SEALED")]
    Closed,
}

impl fmt::Display for Baffle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Baffle::Open => f.write_str("OPEN"),
            Baffle::Closed => f.write_str("CLOSED"),
        }
    }
}

impl FromStr for Baffle {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Baffle::Open),
            "CLOSED" | "SEALED" | "CLOSED/SEALED" => Ok(Baffle::Closed),
            _ => Err(LimiterError::InvalidConfigValue {
                field: "baffle".to_string(),
                value: s.to_string(),
                reason: "Valid baffles: OPEN, CLOSED".to_string(),
            }),
        }
    }
}

/// Raw catalog shape, checked by `Amplifier::new` on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmplifierRecord {
    pub reference: String,
    pub gain: f64,
    pub power: TapPowers,
    #[serde(default)]
    pub outputs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AmplifierRecord", into = "AmplifierRecord")]
pub struct Amplifier {
    reference: String,
    gain: f64,
    power: TapPowers,
    outputs: Option<u32>,
}

impl Amplifier {
    pub fn new(
        reference: impl Into<String>,
        gain: f64,
        power: TapPowers,
        outputs: Option<u32>,
    ) -> Result<Self> {
        let reference = reference.into();
        let invalid = |reason: String| LimiterError::InvalidSpec {
            reference: reference.clone(),
            reason,
        };

        if reference.trim().is_empty() {
            return Err(invalid("reference cannot be empty".to_string()));
        }
        if !is_strictly_positive(gain) {
            return Err(invalid(format!("gain must be positive, got {}", gain)));
        }
        if let Some((tap, _)) = power.supported().find(|&(_, watts)| watts == 0) {
            return Err(invalid(format!("power at {} must be positive", tap)));
        }
        if power.supported().next().is_none() {
            return Err(invalid("at least one tap must be supported".to_string()));
        }
        if outputs == Some(0) {
            return Err(invalid("outputs must be positive when known".to_string()));
        }

        Ok(Self {
            reference,
            gain,
            power,
            outputs,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn power(&self) -> &TapPowers {
        &self.power
    }

    pub fn power_at(&self, tap: Tap) -> PowerRating {
        self.power.get(tap)
    }

    pub fn outputs(&self) -> Option<u32> {
        self.outputs
    }

    pub fn supported_taps(&self) -> Vec<Tap> {
        self.power.supported().map(|(tap, _)| tap).collect()
    }
}

impl TryFrom<AmplifierRecord> for Amplifier {
    type Error = LimiterError;

    fn try_from(record: AmplifierRecord) -> Result<Self> {
        Amplifier::new(record.reference, record.gain, record.power, record.outputs)
    }
}

impl From<Amplifier> for AmplifierRecord {
    fn from(ampli: Amplifier) -> Self {
        Self {
            reference: ampli.reference,
            gain: ampli.gain,
            power: ampli.power,
            outputs: ampli.outputs,
        }
    }
}

impl fmt::Display for Amplifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reference)?;
        writeln!(f, "  gain: {}dB", self.gain)?;
        for (tap, rating) in self.power.iter() {
            match rating {
                PowerRating::Supported(watts) => writeln!(f, "  power ({}): {}W", tap, watts)?,
                PowerRating::Unsupported => writeln!(f, "  power ({}): Missing", tap)?,
            }
        }
        match self.outputs {
            Some(outputs) => write!(f, "  outputs: {}", outputs),
            None => write!(f, "  outputs: Missing"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerRecord {
    pub reference: String,
    pub impedance: u32,
    pub power: u32,
    #[serde(default)]
    pub response: String,
    pub baffle: Baffle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpeakerRecord", into = "SpeakerRecord")]
pub struct Speaker {
    reference: String,
    impedance: u32,
    power: u32,
    response: String,
    baffle: Baffle,
}

impl Speaker {
    pub fn new(
        reference: impl Into<String>,
        impedance: u32,
        power: u32,
        response: impl Into<String>,
        baffle: Baffle,
    ) -> Result<Self> {
        let reference = reference.into();
        let invalid = |reason: String| LimiterError::InvalidSpec {
            reference: reference.clone(),
            reason,
        };

        if reference.trim().is_empty() {
            return Err(invalid("reference cannot be empty".to_string()));
        }
        if !NOMINAL_IMPEDANCES.contains(&impedance) {
            return Err(invalid(format!(
                "impedance must be 2, 4 or 8 ohms, got {}",
                impedance
            )));
        }
        if power == 0 {
            return Err(invalid("AES power must be positive".to_string()));
        }

        Ok(Self {
            reference,
            impedance,
            power,
            response: response.into(),
            baffle,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn impedance(&self) -> u32 {
        self.impedance
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn frequency_response(&self) -> &str {
        &self.response
    }

    pub fn baffle(&self) -> Baffle {
        self.baffle
    }
}

impl TryFrom<SpeakerRecord> for Speaker {
    type Error = LimiterError;

    fn try_from(record: SpeakerRecord) -> Result<Self> {
        Speaker::new(
            record.reference,
            record.impedance,
            record.power,
            record.response,
            record.baffle,
        )
    }
}

impl From<Speaker> for SpeakerRecord {
    fn from(speaker: Speaker) -> Self {
        Self {
            reference: speaker.reference,
            impedance: speaker.impedance,
            power: speaker.power,
            response: speaker.response,
            baffle: speaker.baffle,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reference)?;
        writeln!(f, "  impedance: {}{}", self.impedance, OHM)?;
        writeln!(f, "  power ({}{}): {}W", self.impedance, OHM, self.power)?;
        writeln!(f, "  frequency response: {} Hz", self.frequency_response())?;
        write!(f, "  baffle: {}", self.baffle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tsa_4_1300() -> Amplifier {
        Amplifier::new(
            "t.amp TSA 4-1300",
            32.0,
            TapPowers::from_pairs(&[(Tap::Ohm8, 800), (Tap::Ohm4, 1300)]),
            Some(4),
        )
        .unwrap()
    }

    #[test]
    fn tap_parses_historical_spellings() {
        assert_eq!("8".parse::<Tap>().unwrap(), Tap::Ohm8);
        assert_eq!("4Ω".parse::<Tap>().unwrap(), Tap::Ohm4);
        assert_eq!("2 ohm".parse::<Tap>().unwrap(), Tap::Ohm2);
        assert_eq!("8 (bridge)".parse::<Tap>().unwrap(), Tap::Ohm8Bridged);
        assert_eq!("4Ω-bridged".parse::<Tap>().unwrap(), Tap::Ohm4Bridged);
        assert!("16".parse::<Tap>().is_err());
        assert!("2 (bridge)".parse::<Tap>().is_err());
    }

    #[test]
    fn tap_display_round_trips() {
        for tap in Tap::ALL {
            assert_eq!(tap.to_string().parse::<Tap>().unwrap(), tap);
        }
        assert_eq!(Tap::Ohm8Bridged.to_string(), "8Ω-bridged");
        // The ohm sign U+2126 is accepted on input too.
        assert_eq!("4\u{2126}".parse::<Tap>().unwrap(), Tap::Ohm4);
    }

    #[test]
    fn tap_display_matches_serde_key() {
        for tap in Tap::ALL {
            assert_eq!(format!("\"{}\"", tap), serde_json::to_string(&tap).unwrap());
        }
    }

    #[test]
    fn speaker_card_lists_response() {
        let card = Speaker::new("MTH", 8, 1600, "40-200", Baffle::Closed)
            .unwrap()
            .to_string();
        assert!(card.contains("impedance: 8Ω"));
        assert!(card.contains("frequency response: 40-200 Hz"));
    }

    #[test]
    fn bridged_taps_share_base_impedance() {
        assert_eq!(Tap::Ohm8Bridged.ohms(), Tap::Ohm8.ohms());
        assert_eq!(Tap::Ohm4Bridged.ohms(), Tap::Ohm4.ohms());
    }

    #[test]
    fn supported_taps_skip_missing_ratings() {
        let ampli = tsa_4_1300();
        assert_eq!(ampli.supported_taps(), vec![Tap::Ohm8, Tap::Ohm4]);
        assert_eq!(ampli.power_at(Tap::Ohm2), PowerRating::Unsupported);
        assert_eq!(ampli.power_at(Tap::Ohm4).watts(), Some(1300));
    }

    #[test]
    fn amplifier_needs_a_supported_tap() {
        let err = Amplifier::new("empty", 32.0, TapPowers::from_pairs(&[]), None).unwrap_err();
        assert!(matches!(err, LimiterError::InvalidSpec { .. }));
    }

    #[test]
    fn amplifier_rejects_zero_watt_tap_and_bad_gain() {
        let zero = TapPowers::from_pairs(&[(Tap::Ohm8, 0)]);
        assert!(Amplifier::new("zero", 32.0, zero, None).is_err());

        let ok = TapPowers::from_pairs(&[(Tap::Ohm8, 500)]);
        assert!(Amplifier::new("neg", -1.0, ok, None).is_err());
        assert!(Amplifier::new("nan", f64::NAN, ok, None).is_err());
        assert!(Amplifier::new("outs", 32.0, ok, Some(0)).is_err());
    }

    #[test]
    fn speaker_rejects_non_nominal_impedance() {
        assert!(Speaker::new("MTH", 8, 1500, "40-200", Baffle::Closed).is_ok());
        assert!(Speaker::new("odd", 6, 1500, "", Baffle::Closed).is_err());
        assert!(Speaker::new("silent", 8, 0, "", Baffle::Open).is_err());
        assert!(Speaker::new("  ", 8, 100, "", Baffle::Open).is_err());
    }

    #[test]
    fn amplifier_deserializes_legacy_json() {
        let json = r#"{
            "reference": "Admark K420",
            "gain": 41,
            "power": { "8": 2000, "4": 3400, "2": 4760, "8 (bridge)": 6800 },
            "outputs": 4
        }"#;
        let ampli: Amplifier = serde_json::from_str(json).unwrap();
        assert_eq!(ampli.power_at(Tap::Ohm8Bridged).watts(), Some(6800));
        assert_eq!(ampli.power_at(Tap::Ohm4Bridged), PowerRating::Unsupported);
        assert_eq!(ampli.outputs(), Some(4));
    }

    #[test]
    fn invalid_amplifier_json_is_rejected() {
        let json = r#"{ "reference": "broken", "gain": 41, "power": {} }"#;
        assert!(serde_json::from_str::<Amplifier>(json).is_err());
    }

    #[test]
    fn speaker_accepts_sealed_alias() {
        let json = r#"{ "reference": "F221", "impedance": 4, "power": 2000,
                        "response": "35-150", "baffle": "SEALED" }"#;
        let speaker: Speaker = serde_json::from_str(json).unwrap();
        assert_eq!(speaker.baffle(), Baffle::Closed);
    }

    #[test]
    fn amplifier_card_marks_missing_taps() {
        let card = tsa_4_1300().to_string();
        assert!(card.contains("power (4Ω): 1300W"));
        assert!(card.contains("power (2Ω): Missing"));
        assert!(card.ends_with("outputs: 4"));
    }
}
