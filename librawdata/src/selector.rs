use ndarray::{s, Array1, Array3, ArrayView1, ArrayView3, Axis};
use std::ops::Range;

use super::error::WaveformError;
use super::kind::WaveformKind;

/// Half-open interval over the sensor axis. Either end may be left open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl DisplayRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Every sensor
    pub fn full() -> Self {
        Self::default()
    }

    /// Clamp to an axis of length len. An inverted interval is empty.
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let start = self.start.unwrap_or(0).min(len);
        let end = self.end.unwrap_or(len).min(len);
        start..end.max(start)
    }
}

/// The slice of a waveform array requested for display, with its time axis.
#[derive(Debug, Clone)]
pub struct Selection {
    pub kind: WaveformKind,
    /// [event slot, sensor, time bin], restricted to the sensor range
    pub traces: Array3<i16>,
    pub time: Array1<f64>,
    /// Positions of the selected sensors in the sensor table
    pub sensor_range: Range<usize>,
    /// Length of the sensor axis before the range was applied
    pub total_sensors: usize,
}

impl Selection {
    pub fn n_slots(&self) -> usize {
        self.traces.len_of(Axis(0))
    }

    pub fn n_sensors(&self) -> usize {
        self.traces.len_of(Axis(1))
    }

    pub fn n_bins(&self) -> usize {
        self.traces.len_of(Axis(2))
    }

    /// Trace of the nth selected sensor in an event slot
    pub fn trace(&self, slot: usize, sensor: usize) -> ArrayView1<i16> {
        self.traces.slice(s![slot, sensor, ..])
    }
}

/// Display time axis: bin index converted to the kind's display unit
pub fn time_axis(kind: WaveformKind, n_bins: usize) -> Array1<f64> {
    Array1::from_iter((0..n_bins).map(|bin| kind.bin_to_time(bin)))
}

/// Select waveforms by kind tag. Unknown tags are rejected before anything is sliced.
///
/// waveforms holds the event slots to display along its first axis (one event, or two
/// for dual display).
pub fn select(
    tag: &str,
    waveforms: ArrayView3<i16>,
    range: DisplayRange,
) -> Result<Selection, WaveformError> {
    let kind: WaveformKind = tag.parse()?;
    Ok(select_kind(kind, waveforms, range))
}

pub fn select_kind(kind: WaveformKind, waveforms: ArrayView3<i16>, range: DisplayRange) -> Selection {
    let total_sensors = waveforms.len_of(Axis(1));
    let sensor_range = range.resolve(total_sensors);
    let traces = waveforms
        .slice(s![.., sensor_range.clone(), ..])
        .to_owned();
    let time = time_axis(kind, waveforms.len_of(Axis(2)));
    Selection {
        kind,
        traces,
        time,
        sensor_range,
        total_sensors,
    }
}
