use crate::app::session::LimiterSession;
use crate::core::{CalculationSettings, EquipmentRepository, Tap};
use crate::utils::error::{LimiterError, Result};
use serde::Serialize;
use std::io::Write;

/// One speaker/amplifier/tap combination of the threshold table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub amplifier: String,
    pub speaker: String,
    pub tap: String,
    /// `ok`, or `custom` when the pairing is not a standard configuration.
    pub status: &'static str,
    pub effective_power: Option<u64>,
    pub ampli_power: Option<u32>,
    pub speaker_max_voltage: Option<String>,
    pub ampli_max_voltage: Option<String>,
    pub threshold: Option<String>,
    pub unit: Option<&'static str>,
    pub reason: Option<String>,
}

impl<R: EquipmentRepository, C: CalculationSettings> LimiterSession<R, C> {
    /// Every amplifier x speaker x supported tap, in reference order.
    ///
    /// Incompatible pairings become `custom` rows instead of aborting the
    /// table; any other error does abort.
    pub fn matrix(&self) -> Result<Vec<MatrixRow>> {
        let mut rows = Vec::new();

        for ampli in self.repository.amplifiers() {
            let taps: Vec<Tap> = ampli.supported_taps();
            for speaker in self.repository.speakers() {
                for &tap in &taps {
                    let row = match self.compute(speaker.reference(), ampli.reference(), tap) {
                        Ok(outcome) => MatrixRow {
                            amplifier: ampli.reference().to_string(),
                            speaker: speaker.reference().to_string(),
                            tap: tap.to_string(),
                            status: "ok",
                            effective_power: outcome.load.map(|load| load.effective_power),
                            ampli_power: outcome.load.map(|load| load.ampli_power_at_tap),
                            speaker_max_voltage: Some(
                                outcome.report.speaker_max_voltage.to_string(),
                            ),
                            ampli_max_voltage: Some(outcome.report.ampli_max_voltage.to_string()),
                            threshold: Some(outcome.device.value.to_string()),
                            unit: Some(outcome.device.unit),
                            reason: None,
                        },
                        Err(
                            err @ (LimiterError::SpeakerImpedanceExceeded { .. }
                            | LimiterError::AmplifierTapUnsupported { .. }),
                        ) => MatrixRow {
                            amplifier: ampli.reference().to_string(),
                            speaker: speaker.reference().to_string(),
                            tap: tap.to_string(),
                            status: "custom",
                            effective_power: None,
                            ampli_power: ampli.power_at(tap).watts(),
                            speaker_max_voltage: None,
                            ampli_max_voltage: None,
                            threshold: None,
                            unit: None,
                            reason: Some(err.to_string()),
                        },
                        Err(err) => return Err(err),
                    };
                    rows.push(row);
                }
            }
        }

        tracing::info!("Computed {} threshold combinations", rows.len());
        Ok(rows)
    }
}

pub fn write_csv<W: Write>(rows: &[MatrixRow], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
