use hdf5::{File, H5Type};
use ndarray::{s, Array3, Ix3};
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::error::StorageError;
use super::kind::WaveformKind;
use super::sensors::{SensorRecord, SensorTable};

const EVENTS_PATH: &str = "Run/events";

/// One row of Run/events
#[derive(H5Type, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EventRecord {
    pub evt_number: i32,
    pub timestamp: u64,
}

/// A read-only handle on a decoded raw data file.
///
/// The decoder writes the following layout, of which only Run/events is mandatory:
///
/// ```text
/// run_XXXX.h5
/// Run
/// |---- events(table) - evt_number, timestamp
/// Sensors
/// |---- DataPMT(table)  - channel, sensorID
/// |---- DataBLR(table)  - channel, sensorID
/// |---- DataSiPM(table) - channel, sensorID
/// RD
/// |---- pmtrwf(dset)  [event, sensor, bin]
/// |---- pmtblr(dset)  [event, sensor, bin]
/// |---- sipmrwf(dset) [event, sensor, bin]
/// ```
///
/// The file is released by close, or by dropping the handle on any other exit path.
#[derive(Debug)]
pub struct RawDataFile {
    file_handle: File,
    path: PathBuf,
}

impl RawDataFile {
    /// Open a raw data file for reading
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Err(StorageError::BadFilePath(path.to_path_buf()));
        }
        let file_handle = File::open(path)?;
        log::info!(
            "Opened {} ({})",
            path.display(),
            human_bytes::human_bytes(path.metadata()?.len() as f64)
        );
        Ok(Self {
            file_handle,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check every link along a slash separated path
    pub fn has_path(&self, path: &str) -> bool {
        let mut partial = String::new();
        for part in path.split('/') {
            if !partial.is_empty() {
                partial.push('/');
            }
            partial.push_str(part);
            if !self.file_handle.link_exists(&partial) {
                return false;
            }
        }
        true
    }

    /// Storage paths a kind needs that are absent from the file
    pub fn missing_paths(&self, kind: WaveformKind) -> Vec<String> {
        [kind.waveform_path().to_string(), kind.sensor_table_path()]
            .into_iter()
            .filter(|path| !self.has_path(path))
            .collect()
    }

    /// A kind can be plotted only if both its waveforms and its sensor table exist
    pub fn has_kind(&self, kind: WaveformKind) -> bool {
        self.missing_paths(kind).is_empty()
    }

    /// Display event number of every event, aligned with the waveform arrays' first axis
    pub fn event_numbers(&self) -> Result<Vec<i32>, StorageError> {
        if !self.has_path(EVENTS_PATH) {
            return Err(StorageError::MissingPath(String::from(EVENTS_PATH)));
        }
        let records = self
            .file_handle
            .dataset(EVENTS_PATH)?
            .read_raw::<EventRecord>()?;
        Ok(records.iter().map(|r| r.evt_number).collect())
    }

    /// The complete sensor table of a kind, in file order
    pub fn sensor_table(&self, kind: WaveformKind) -> Result<SensorTable, StorageError> {
        let path = kind.sensor_table_path();
        if !self.has_path(&path) {
            return Err(StorageError::MissingPath(path));
        }
        let records = self
            .file_handle
            .dataset(&path)?
            .read_raw::<SensorRecord>()?;
        Ok(SensorTable::new(records))
    }

    /// Read the waveforms of a contiguous range of events
    pub fn waveforms(
        &self,
        kind: WaveformKind,
        events: Range<usize>,
    ) -> Result<Array3<i16>, StorageError> {
        let path = kind.waveform_path();
        if !self.has_path(path) {
            return Err(StorageError::MissingPath(String::from(path)));
        }
        let dataset = self.file_handle.dataset(path)?;
        Ok(dataset.read_slice::<i16, _, Ix3>(s![events, .., ..])?)
    }

    /// Release the file handle
    pub fn close(self) -> Result<(), StorageError> {
        self.file_handle.close()?;
        Ok(())
    }
}

/// Write a small decoder-style file for tests. SiPM data is always present, PMT and BLR
/// only when requested.
#[cfg(test)]
pub(crate) fn write_fixture(name: &str, with_pmt: bool) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "librawdata_{}_{}.h5",
        name,
        std::process::id()
    ));
    let file = File::create(&path).unwrap();

    let events = [
        EventRecord {
            evt_number: 100,
            timestamp: 1,
        },
        EventRecord {
            evt_number: 101,
            timestamp: 2,
        },
        EventRecord {
            evt_number: 102,
            timestamp: 3,
        },
    ];
    file.create_group("Run")
        .unwrap()
        .new_dataset_builder()
        .with_data(&events)
        .create("events")
        .unwrap();

    let sensors = file.create_group("Sensors").unwrap();
    let rd = file.create_group("RD").unwrap();
    let sipm_sensors = [
        SensorRecord::new(64, 1000),
        SensorRecord::new(65, 1001),
        SensorRecord::new(66, 1002),
    ];
    sensors
        .new_dataset_builder()
        .with_data(&sipm_sensors)
        .create("DataSiPM")
        .unwrap();
    // value = 100 * event + 10 * sensor + bin
    let sipm = Array3::from_shape_fn((3, 3, 4), |(e, s, b)| (100 * e + 10 * s + b) as i16);
    rd.new_dataset_builder()
        .with_data(&sipm)
        .create("sipmrwf")
        .unwrap();

    if with_pmt {
        let pmt_sensors = [SensorRecord::new(0, 0), SensorRecord::new(1, 1)];
        let pmt = Array3::from_shape_fn((3, 2, 8), |(e, s, b)| (1000 + e + s + b) as i16);
        for (table, dset) in [("DataPMT", "pmtrwf"), ("DataBLR", "pmtblr")] {
            sensors
                .new_dataset_builder()
                .with_data(&pmt_sensors)
                .create(table)
                .unwrap();
            rd.new_dataset_builder().with_data(&pmt).create(dset).unwrap();
        }
    }
    file.close().unwrap();
    path
}
