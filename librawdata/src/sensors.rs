// Sensor tables are written by the decoder with one row per sensor, in the same order as
// the sensor axis of the matching waveform array. Row i of DataSiPM describes column i of
// RD/sipmrwf, so nothing here may reorder or deduplicate rows.
use std::fmt::Display;

use hdf5::H5Type;

use super::error::SensorLookupError;
use super::selector::DisplayRange;

/// One row of a sensor table, matching the decoder's on-disk compound type
#[derive(H5Type, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SensorRecord {
    pub channel: i32,
    #[hdf5(rename = "sensorID")]
    pub sensor_id: i32,
}

impl SensorRecord {
    pub fn new(channel: i32, sensor_id: i32) -> Self {
        Self { channel, sensor_id }
    }

    pub fn key(&self, key: SensorKey) -> i32 {
        match key {
            SensorKey::SensorId => self.sensor_id,
            SensorKey::Channel => self.channel,
        }
    }
}

/// Which column of the sensor table identifies a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKey {
    SensorId,
    Channel,
}

impl SensorKey {
    /// Electronics channel labels are used when elecid is requested
    pub fn from_elecid(elecid: bool) -> Self {
        if elecid {
            Self::Channel
        } else {
            Self::SensorId
        }
    }
}

impl Display for SensorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SensorId => write!(f, "sensorID"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// Ordered sensor metadata for one waveform kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    records: Vec<SensorRecord>,
}

impl SensorTable {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self { records }
    }

    /// Build a table from bare sensor IDs, numbering channels by position
    pub fn from_sensor_ids(ids: &[i32]) -> Self {
        Self::new(
            ids.iter()
                .enumerate()
                .map(|(idx, id)| SensorRecord::new(idx as i32, *id))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&SensorRecord> {
        self.records.get(index)
    }

    /// Position of the first record whose key equals value
    pub fn position(&self, key: SensorKey, value: i32) -> Result<usize, SensorLookupError> {
        self.records
            .iter()
            .position(|record| record.key(key) == value)
            .ok_or(SensorLookupError::NotFound { key, value })
    }

    /// Turn a pair of boundary identifiers into a positional range.
    ///
    /// The range is half-open, so the sensor matching the upper boundary is not displayed.
    pub fn resolve_range(
        &self,
        key: SensorKey,
        bounds: (i32, i32),
    ) -> Result<DisplayRange, SensorLookupError> {
        let start = self.position(key, bounds.0)?;
        let end = self.position(key, bounds.1)?;
        Ok(DisplayRange::new(Some(start), Some(end)))
    }
}
