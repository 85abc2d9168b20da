use crate::domain::model::{Amplifier, EquipmentKind, Speaker};
use crate::domain::ports::EquipmentRepository;
use crate::utils::error::{LimiterError, Result};
use std::collections::BTreeMap;

/// In-memory equipment specs keyed by reference.
///
/// Filled once at start-up and then only read. The caller owns the catalog
/// and passes it by reference to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct EquipmentCatalog {
    amplifiers: BTreeMap<String, Amplifier>,
    speakers: BTreeMap<String, Speaker>,
}

impl EquipmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        amplifiers: impl IntoIterator<Item = Amplifier>,
        speakers: impl IntoIterator<Item = Speaker>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for ampli in amplifiers {
            catalog.insert_amplifier(ampli)?;
        }
        for speaker in speakers {
            catalog.insert_speaker(speaker)?;
        }
        Ok(catalog)
    }

    pub fn insert_amplifier(&mut self, ampli: Amplifier) -> Result<()> {
        if self.amplifiers.contains_key(ampli.reference()) {
            return Err(duplicate(EquipmentKind::Amplifier, ampli.reference()));
        }
        self.amplifiers.insert(ampli.reference().to_string(), ampli);
        Ok(())
    }

    pub fn insert_speaker(&mut self, speaker: Speaker) -> Result<()> {
        if self.speakers.contains_key(speaker.reference()) {
            return Err(duplicate(EquipmentKind::Speaker, speaker.reference()));
        }
        self.speakers.insert(speaker.reference().to_string(), speaker);
        Ok(())
    }

    pub fn amplifier_count(&self) -> usize {
        self.amplifiers.len()
    }

    pub fn speaker_count(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplifiers.is_empty() && self.speakers.is_empty()
    }
}

fn duplicate(kind: EquipmentKind, reference: &str) -> LimiterError {
    LimiterError::InvalidSpec {
        reference: reference.to_string(),
        reason: format!("duplicate {} reference", kind),
    }
}

impl EquipmentRepository for EquipmentCatalog {
    fn amplifier(&self, reference: &str) -> Result<&Amplifier> {
        self.amplifiers
            .get(reference)
            .ok_or_else(|| LimiterError::UnknownReference {
                kind: EquipmentKind::Amplifier,
                reference: reference.to_string(),
            })
    }

    fn speaker(&self, reference: &str) -> Result<&Speaker> {
        self.speakers
            .get(reference)
            .ok_or_else(|| LimiterError::UnknownReference {
                kind: EquipmentKind::Speaker,
                reference: reference.to_string(),
            })
    }

    fn amplifiers(&self) -> Box<dyn Iterator<Item = &Amplifier> + '_> {
        Box::new(self.amplifiers.values())
    }

    fn speakers(&self) -> Box<dyn Iterator<Item = &Speaker> + '_> {
        Box::new(self.speakers.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Baffle, Tap, TapPowers};

    fn catalog() -> EquipmentCatalog {
        EquipmentCatalog::from_parts(
            [
                Amplifier::new(
                    "t.amp TSA 4-1300",
                    32.0,
                    TapPowers::from_pairs(&[(Tap::Ohm8, 800), (Tap::Ohm4, 1300)]),
                    Some(4),
                )
                .unwrap(),
                Amplifier::new(
                    "Admark K420",
                    41.0,
                    TapPowers::from_pairs(&[(Tap::Ohm8, 2000), (Tap::Ohm4, 3400)]),
                    None,
                )
                .unwrap(),
            ],
            [Speaker::new("MTH", 8, 1500, "40-200", Baffle::Closed).unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn lookup_by_reference() {
        let catalog = catalog();
        assert_eq!(catalog.amplifier("Admark K420").unwrap().gain(), 41.0);
        assert_eq!(catalog.speaker("MTH").unwrap().power(), 1500);
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let catalog = catalog();
        let err = catalog.speaker("F221").unwrap_err();
        assert!(matches!(
            err,
            LimiterError::UnknownReference {
                kind: EquipmentKind::Speaker,
                ..
            }
        ));
        assert!(catalog.amplifier("MTH").is_err());
    }

    #[test]
    fn iteration_is_sorted_by_reference() {
        let catalog = catalog();
        let refs: Vec<&str> = catalog.amplifiers().map(|a| a.reference()).collect();
        assert_eq!(refs, vec!["Admark K420", "t.amp TSA 4-1300"]);
    }

    #[test]
    fn duplicate_reference_is_rejected() {
        let mut catalog = catalog();
        let again = Speaker::new("MTH", 8, 1200, "", Baffle::Open).unwrap();
        assert!(catalog.insert_speaker(again).is_err());
        assert_eq!(catalog.speaker_count(), 1);
    }
}
