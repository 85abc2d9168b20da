//! Threshold scales of common hardware limiters.
//!
//! The dBu threshold is what a generic RMS limiter expects. Some processors
//! take a threshold on their own relative scale instead; these offsets come
//! from the Hornplans calculator sheet.

use crate::core::quantize::{quantize_threshold, Quantized};
use crate::core::threshold::ThresholdReport;
use crate::utils::error::{LimiterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Headroom the T.Racks DS2/DS4 keeps below the dBu threshold.
const TRACKS_OFFSET_DB: f64 = -2.5;
/// Behringer DCX2496 limiter scale sits 22 dB below dBu.
const DCX_REFERENCE_DB: f64 = -22.0;
const DCX_SUB_MARGIN_DB: f64 = 1.5;
const DCX_TOP_MARGIN_DB: f64 = 3.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimiterDevice {
    #[default]
    Dbu,
    #[serde(rename = "tracks-ds24")]
    TRacksDs24,
    #[serde(rename = "dcx2496-sub")]
    Dcx2496Sub,
    #[serde(rename = "dcx2496-top")]
    Dcx2496Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceThreshold {
    pub device: LimiterDevice,
    pub value: Quantized,
    pub unit: &'static str,
}

impl fmt::Display for DeviceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl LimiterDevice {
    pub const ALL: [LimiterDevice; 4] = [
        LimiterDevice::Dbu,
        LimiterDevice::TRacksDs24,
        LimiterDevice::Dcx2496Sub,
        LimiterDevice::Dcx2496Top,
    ];

    pub fn unit(self) -> &'static str {
        match self {
            LimiterDevice::Dbu => "dBu",
            _ => "dB",
        }
    }

    /// Convert a computed report to this device's scale.
    pub fn threshold(self, report: &ThresholdReport) -> Result<DeviceThreshold> {
        let raw = report.raw_threshold();
        let (shifted, places) = match self {
            LimiterDevice::Dbu => {
                return Ok(DeviceThreshold {
                    device: self,
                    value: report.threshold_dbu,
                    unit: self.unit(),
                })
            }
            LimiterDevice::TRacksDs24 => (raw + TRACKS_OFFSET_DB, 0),
            LimiterDevice::Dcx2496Sub => (raw + DCX_REFERENCE_DB + DCX_SUB_MARGIN_DB, 1),
            LimiterDevice::Dcx2496Top => (raw + DCX_REFERENCE_DB + DCX_TOP_MARGIN_DB, 1),
        };
        let value = quantize_threshold(shifted, places).ok_or(
            LimiterError::InvalidCalculatorInput {
                field: "threshold",
                value: shifted,
            },
        )?;
        Ok(DeviceThreshold {
            device: self,
            value,
            unit: self.unit(),
        })
    }
}

impl fmt::Display for LimiterDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimiterDevice::Dbu => "dBu",
            LimiterDevice::TRacksDs24 => "T.Racks DS2/4",
            LimiterDevice::Dcx2496Sub => "DCX2496 SUB",
            LimiterDevice::Dcx2496Top => "DCX2496 Top",
        };
        f.write_str(name)
    }
}

impl FromStr for LimiterDevice {
    type Err = LimiterError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "dbu" => Ok(LimiterDevice::Dbu),
            "tracksds24" | "tracks" => Ok(LimiterDevice::TRacksDs24),
            "dcx2496sub" => Ok(LimiterDevice::Dcx2496Sub),
            "dcx2496top" => Ok(LimiterDevice::Dcx2496Top),
            _ => Err(LimiterError::InvalidConfigValue {
                field: "device".to_string(),
                value: s.to_string(),
                reason: "Valid devices: dbu, tracks-ds24, dcx2496-sub, dcx2496-top".to_string(),
            }),
        }
    }
}
