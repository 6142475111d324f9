use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::baseline::Polarity;
use super::error::WaveformError;

/// PMT and BLR waveforms are sampled at 40 bins per display unit
pub const PMT_BINS_PER_UNIT: f64 = 40.0;

/// The three waveform kinds written by the decoder. Each has its own waveform array,
/// sensor table, sampling convention and pulse polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveformKind {
    #[serde(rename = "PMT")]
    Pmt,
    #[serde(rename = "BLR")]
    Blr,
    #[serde(rename = "SiPM")]
    SiPM,
}

impl FromStr for WaveformKind {
    type Err = WaveformError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PMT" => Ok(Self::Pmt),
            "BLR" => Ok(Self::Blr),
            "SiPM" => Ok(Self::SiPM),
            _ => Err(WaveformError::UnsupportedKind(s.to_string())),
        }
    }
}

impl Display for WaveformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl WaveformKind {
    pub const ALL: [WaveformKind; 3] = [Self::Pmt, Self::Blr, Self::SiPM];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pmt => "PMT",
            Self::Blr => "BLR",
            Self::SiPM => "SiPM",
        }
    }

    /// Path of the 3-D waveform array for this kind
    pub fn waveform_path(&self) -> &'static str {
        match self {
            Self::Pmt => "RD/pmtrwf",
            Self::Blr => "RD/pmtblr",
            Self::SiPM => "RD/sipmrwf",
        }
    }

    /// Name of the sensor table for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Pmt => "DataPMT",
            Self::Blr => "DataBLR",
            Self::SiPM => "DataSiPM",
        }
    }

    pub fn sensor_table_path(&self) -> String {
        format!("Sensors/{}", self.table_name())
    }

    /// Convert a raw bin index into display units
    pub fn bin_to_time(&self, bin: usize) -> f64 {
        match self {
            Self::Pmt | Self::Blr => bin as f64 / PMT_BINS_PER_UNIT,
            Self::SiPM => bin as f64,
        }
    }

    /// PMT pulses are negative going, so they enter a sum with a flipped sign
    pub fn polarity(&self) -> Polarity {
        match self {
            Self::Pmt | Self::Blr => Polarity::Negative,
            Self::SiPM => Polarity::Positive,
        }
    }
}
