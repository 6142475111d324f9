use std::path::PathBuf;
use thiserror::Error;

use super::sensors::SensorKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaveformError {
    #[error("Unrecognized waveform kind {0}; valid options are PMT, BLR and SiPM")]
    UnsupportedKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorLookupError {
    #[error("No sensor with {key} {value} found in the sensor table")]
    NotFound { key: SensorKey, value: i32 },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not open raw data file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Raw data file is missing required path {0}")]
    MissingPath(String),
    #[error("Raw data file failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Raw data file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Plot backend failed: {0}")]
    Backend(String),
    #[error("Render driver failed to read acknowledgment: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Input closed while waiting for acknowledgment")]
    InputClosed,
    #[error("Sensor table has {sensors} rows but the waveform array has {traces} sensors")]
    SensorCountMismatch { sensors: usize, traces: usize },
    #[error("Dual display needs two event slots but the selection has {0}")]
    MissingDualSlot(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Invalid axis limits ({0}, {1}); the lower limit must be below the upper one")]
    BadAxisLimits(f64, f64),
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Plotting failed due to waveform error: {0}")]
    WaveformError(#[from] WaveformError),
    #[error("Plotting failed due to sensor lookup error: {0}")]
    LookupError(#[from] SensorLookupError),
    #[error("Plotting failed due to storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Plotting failed due to render error: {0}")]
    RenderError(#[from] RenderError),
    #[error("Plotting failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Plotting failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Decoder input {0:?} has no file name")]
    BadInputPath(PathBuf),
    #[error("Decoder invocation failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Decoder descriptor could not be serialized to JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Decoder configuration failed: {0}")]
    ConfigError(#[from] ConfigError),
}
