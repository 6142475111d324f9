use ndarray::ArrayView1;

use super::acknowledge::Acknowledge;
use super::baseline::SumAccumulator;
use super::canvas::{Canvas, Trace, ViewSpec, X_LABEL, Y_LABEL};
use super::config::ViewOptions;
use super::error::RenderError;
use super::palette::{ColorCycle, SUM_COLOR};
use super::selector::Selection;
use super::sensors::{SensorKey, SensorTable};

const SUM_PADDING: f64 = 50.0;

/// Where the driver is in its render/pause cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering,
    Paused,
}

/// Walks a selection of waveforms and shows them view by view.
///
/// Each view is presented on the canvas and then held until the acknowledgment source lets
/// it go. How many views a selection produces depends on the ViewOptions:
///
/// - default: one view per sensor
/// - overlay: one view with every sensor
/// - sum: one view with the summed trace (takes precedence over overlay)
/// - dual: one view per sensor with both event slots (takes precedence over both)
#[derive(Debug)]
pub struct RenderDriver<C: Canvas, A: Acknowledge> {
    canvas: C,
    ack: A,
    state: RenderState,
    views_shown: usize,
}

fn min_max(trace: ArrayView1<i16>) -> (f64, f64) {
    trace
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v as f64), hi.max(*v as f64))
        })
}

/// Single traces and overlays get 1% headroom on either side
fn autoscale(min: f64, max: f64) -> (f64, f64) {
    (0.99 * min, 1.01 * max)
}

/// Sums are padded by a fixed number of ADC counts
fn sum_autoscale(min: f64, max: f64) -> (f64, f64) {
    (min - SUM_PADDING, max + SUM_PADDING)
}

fn view_title(kind_label: &str, event_number: i32, sensor: Option<(SensorKey, i32)>) -> String {
    match sensor {
        None => format!("{kind_label} | Evt {event_number}"),
        Some((SensorKey::SensorId, id)) => format!("{kind_label} | Evt {event_number}, sensor {id}"),
        Some((SensorKey::Channel, ch)) => format!("{kind_label} | Evt {event_number}, elecid {ch}"),
    }
}

impl<C: Canvas, A: Acknowledge> RenderDriver<C, A> {
    pub fn new(canvas: C, ack: A) -> Self {
        Self {
            canvas,
            ack,
            state: RenderState::Idle,
            views_shown: 0,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Total number of views shown over the lifetime of the driver
    pub fn views_shown(&self) -> usize {
        self.views_shown
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_parts(self) -> (C, A) {
        (self.canvas, self.ack)
    }

    /// Plot one selection. Returns the number of views shown.
    ///
    /// sensors must be the complete table for the selection's kind; row i describes
    /// column i of the waveform array.
    pub fn plot_waveforms(
        &mut self,
        selection: &Selection,
        sensors: &SensorTable,
        event_number: i32,
        options: &ViewOptions,
        colors: &mut ColorCycle,
    ) -> Result<usize, RenderError> {
        if sensors.len() != selection.total_sensors {
            return Err(RenderError::SensorCountMismatch {
                sensors: sensors.len(),
                traces: selection.total_sensors,
            });
        }
        if options.dual && selection.n_slots() < 2 {
            return Err(RenderError::MissingDualSlot(selection.n_slots()));
        }

        let before = self.views_shown;
        let result = if options.dual {
            self.plot_dual(selection, sensors, event_number, options, colors)
        } else {
            self.plot_single(selection, sensors, event_number, options, colors)
        };
        // Leave a clean canvas behind even when a view failed
        self.canvas.clear();
        self.state = RenderState::Idle;
        result.map(|_| self.views_shown - before)
    }

    fn plot_single(
        &mut self,
        selection: &Selection,
        sensors: &SensorTable,
        event_number: i32,
        options: &ViewOptions,
        colors: &mut ColorCycle,
    ) -> Result<(), RenderError> {
        let kind = selection.kind;
        let key = SensorKey::from_elecid(options.elecid);
        let time = selection.time.to_vec();
        let rows = &sensors.records()[selection.sensor_range.clone()];
        let per_sensor = !options.overlay && !options.sum;

        let mut global = (f64::INFINITY, f64::NEG_INFINITY);
        let mut sum = options.sum.then(|| SumAccumulator::new(selection.n_bins()));

        self.state = RenderState::Rendering;
        for (idx, (record, color)) in rows.iter().zip(colors.by_ref()).enumerate() {
            let trace = selection.trace(0, idx);
            let (ymin, ymax) = min_max(trace);
            global = (global.0.min(ymin), global.1.max(ymax));

            match sum.as_mut() {
                Some(acc) => acc.accumulate_raw(trace, kind.polarity()),
                None => self.canvas.draw(Trace {
                    label: record.key(key).to_string(),
                    time: time.clone(),
                    values: trace.iter().map(|v| *v as f64).collect(),
                    color,
                    stroke_width: 1,
                }),
            }

            if per_sensor {
                self.pause(ViewSpec {
                    title: view_title(kind.tag(), event_number, Some((key, record.key(key)))),
                    x_label: String::from(X_LABEL),
                    y_label: String::from(Y_LABEL),
                    xlim: options.zoomx.map(|z| z.as_tuple()),
                    ylim: options
                        .zoomy
                        .map(|z| z.as_tuple())
                        .unwrap_or_else(|| autoscale(ymin, ymax)),
                    legend: false,
                })?;
            }
        }

        if let Some(acc) = sum {
            let values = acc.values();
            let lo = values.iter().fold(f64::INFINITY, |a, v| a.min(*v));
            let hi = values.iter().fold(f64::NEG_INFINITY, |a, v| a.max(*v));
            self.canvas.draw(Trace {
                label: String::from("sum"),
                time,
                values: values.to_vec(),
                color: SUM_COLOR,
                stroke_width: 1,
            });
            self.pause(ViewSpec {
                title: view_title(&format!("{} SUM", kind.tag()), event_number, None),
                x_label: String::from(X_LABEL),
                y_label: String::from(Y_LABEL),
                xlim: options.zoomx.map(|z| z.as_tuple()),
                ylim: options
                    .zoomy
                    .map(|z| z.as_tuple())
                    .unwrap_or_else(|| sum_autoscale(lo, hi)),
                legend: true,
            })?;
        } else if options.overlay {
            self.pause(ViewSpec {
                title: view_title(kind.tag(), event_number, None),
                x_label: String::from(X_LABEL),
                y_label: String::from(Y_LABEL),
                xlim: options.zoomx.map(|z| z.as_tuple()),
                ylim: options
                    .zoomy
                    .map(|z| z.as_tuple())
                    .unwrap_or_else(|| autoscale(global.0, global.1)),
                legend: true,
            })?;
        }
        Ok(())
    }

    fn plot_dual(
        &mut self,
        selection: &Selection,
        sensors: &SensorTable,
        event_number: i32,
        options: &ViewOptions,
        colors: &mut ColorCycle,
    ) -> Result<(), RenderError> {
        let kind = selection.kind;
        let key = SensorKey::from_elecid(options.elecid);
        let time = selection.time.to_vec();
        let rows = &sensors.records()[selection.sensor_range.clone()];

        self.state = RenderState::Rendering;
        for (idx, record) in rows.iter().enumerate() {
            let label = record.key(key);
            let first = selection.trace(0, idx);
            let second = selection.trace(1, idx);
            // Only the second trace sets the scale
            let (ymin, ymax) = min_max(second);

            for (trace, width) in [(first, 1), (second, 2)] {
                if let Some(color) = colors.next() {
                    self.canvas.draw(Trace {
                        label: label.to_string(),
                        time: time.clone(),
                        values: trace.iter().map(|v| *v as f64).collect(),
                        color,
                        stroke_width: width,
                    });
                }
            }

            self.pause(ViewSpec {
                title: view_title(kind.tag(), event_number, Some((key, label))),
                x_label: String::from(X_LABEL),
                y_label: String::from(Y_LABEL),
                xlim: options.zoomx.map(|z| z.as_tuple()),
                ylim: options
                    .zoomy
                    .map(|z| z.as_tuple())
                    .unwrap_or_else(|| autoscale(ymin, ymax)),
                legend: false,
            })?;
        }
        Ok(())
    }

    /// Present the current view, hold it until acknowledged, then start a fresh one
    fn pause(&mut self, view: ViewSpec) -> Result<(), RenderError> {
        self.canvas.present(&view)?;
        self.views_shown += 1;
        self.state = RenderState::Paused;
        self.ack.wait()?;
        self.canvas.clear();
        self.state = RenderState::Rendering;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acknowledge::CountingAck;
    use crate::canvas::RecordingCanvas;
    use crate::config::AxisLimits;
    use crate::kind::WaveformKind;
    use crate::palette::TRACE_COLORS;
    use crate::selector::{select_kind, DisplayRange};
    use crate::sensors::SensorRecord;
    use ndarray::Array3;

    fn sensors() -> SensorTable {
        SensorTable::new(vec![
            SensorRecord::new(64, 1000),
            SensorRecord::new(65, 1001),
            SensorRecord::new(66, 1002),
        ])
    }

    /// Two event slots of three sensors with four bins each. Slot 1 is slot 0 + 100.
    fn waveforms() -> Array3<i16> {
        let slot0: Vec<i16> = vec![10, 10, 12, 10, 20, 21, 20, 20, 5, 5, 5, 9];
        let slot1: Vec<i16> = slot0.iter().map(|v| v + 100).collect();
        Array3::from_shape_vec((2, 3, 4), [slot0, slot1].concat()).unwrap()
    }

    fn selection(kind: WaveformKind, slots: usize, range: DisplayRange) -> Selection {
        let wfs = waveforms();
        select_kind(kind, wfs.slice(ndarray::s![0..slots, .., ..]), range)
    }

    fn driver() -> RenderDriver<RecordingCanvas, CountingAck> {
        RenderDriver::new(RecordingCanvas::default(), CountingAck::default())
    }

    #[test]
    fn test_one_view_per_sensor() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        let views = driver
            .plot_waveforms(&sel, &sensors(), 7, &ViewOptions::default(), &mut colors)
            .unwrap();
        assert_eq!(views, 3);
        assert_eq!(driver.state(), RenderState::Idle);

        let (canvas, ack) = driver.into_parts();
        assert_eq!(ack.count, 3);
        let (view, traces) = &canvas.views[0];
        assert_eq!(view.title, "SiPM | Evt 7, sensor 1000");
        assert_eq!(view.ylim, (0.99 * 10.0, 1.01 * 12.0));
        assert_eq!(view.xlim, None);
        assert!(!view.legend);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].label, "1000");
        assert_eq!(traces[0].values, vec![10.0, 10.0, 12.0, 10.0]);
        assert_eq!(traces[0].time, vec![0.0, 1.0, 2.0, 3.0]);
        // Each view starts from an empty canvas
        assert_eq!(canvas.views[2].1.len(), 1);
        assert_eq!(canvas.views[2].1[0].color, TRACE_COLORS[2]);
    }

    #[test]
    fn test_overlay_pauses_once() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            overlay: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::Pmt, 1, DisplayRange::full());
        assert_eq!(
            driver
                .plot_waveforms(&sel, &sensors(), 3, &options, &mut colors)
                .unwrap(),
            1
        );
        let (canvas, ack) = driver.into_parts();
        assert_eq!(ack.count, 1);
        let (view, traces) = &canvas.views[0];
        assert_eq!(view.title, "PMT | Evt 3");
        assert_eq!(view.ylim, (0.99 * 5.0, 1.01 * 21.0));
        assert!(view.legend);
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[1].time, vec![0.0, 1.0 / 40.0, 2.0 / 40.0, 3.0 / 40.0]);
    }

    #[test]
    fn test_sipm_sum() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            sum: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        driver
            .plot_waveforms(&sel, &sensors(), 7, &options, &mut colors)
            .unwrap();
        let (canvas, ack) = driver.into_parts();
        assert_eq!(ack.count, 1);
        let (view, traces) = &canvas.views[0];
        assert_eq!(view.title, "SiPM SUM | Evt 7");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].values, vec![0.0, 1.0, 2.0, 4.0]);
        assert_eq!(traces[0].color, SUM_COLOR);
        assert_eq!(view.ylim, (-50.0, 54.0));
        // Colours still advance once per summed sensor
        assert_eq!(colors.position(), 3);
    }

    #[test]
    fn test_pmt_sum_is_inverted() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            sum: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::Blr, 1, DisplayRange::full());
        driver
            .plot_waveforms(&sel, &sensors(), 7, &options, &mut colors)
            .unwrap();
        let (view, traces) = &driver.canvas().views[0];
        assert_eq!(traces[0].values, vec![0.0, -1.0, -2.0, -4.0]);
        assert_eq!(view.ylim, (-54.0, 50.0));
    }

    #[test]
    fn test_sum_takes_precedence_over_overlay() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            sum: true,
            overlay: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        let views = driver
            .plot_waveforms(&sel, &sensors(), 7, &options, &mut colors)
            .unwrap();
        assert_eq!(views, 1);
        assert_eq!(driver.canvas().views[0].0.title, "SiPM SUM | Evt 7");
    }

    #[test]
    fn test_dual_pairs_slots() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            dual: true,
            overlay: true,
            sum: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::SiPM, 2, DisplayRange::full());
        let views = driver
            .plot_waveforms(&sel, &sensors(), 8, &options, &mut colors)
            .unwrap();
        assert_eq!(views, 3);
        assert_eq!(colors.position(), 6);

        let (view, traces) = &driver.canvas().views[1];
        assert_eq!(view.title, "SiPM | Evt 8, sensor 1001");
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].values, vec![20.0, 21.0, 20.0, 20.0]);
        assert_eq!(traces[1].values, vec![120.0, 121.0, 120.0, 120.0]);
        assert_ne!(traces[0].stroke_width, traces[1].stroke_width);
        assert_eq!(traces[0].color, TRACE_COLORS[2]);
        assert_eq!(traces[1].color, TRACE_COLORS[3]);
        // Scale comes from the second trace only
        assert_eq!(view.ylim, (0.99 * 120.0, 1.01 * 121.0));
    }

    #[test]
    fn test_dual_needs_two_slots() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            dual: true,
            ..Default::default()
        };
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        assert!(matches!(
            driver.plot_waveforms(&sel, &sensors(), 8, &options, &mut colors),
            Err(RenderError::MissingDualSlot(1))
        ));
        assert!(driver.canvas().views.is_empty());
    }

    #[test]
    fn test_zoom_and_elecid() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let options = ViewOptions {
            elecid: true,
            zoomx: Some(AxisLimits::new(1.0, 2.0).unwrap()),
            zoomy: Some(AxisLimits::new(-10.0, 30.0).unwrap()),
            ..Default::default()
        };
        let sel = selection(
            WaveformKind::SiPM,
            1,
            DisplayRange::new(Some(1), Some(2)),
        );
        driver
            .plot_waveforms(&sel, &sensors(), 1, &options, &mut colors)
            .unwrap();
        let views = &driver.canvas().views;
        assert_eq!(views.len(), 1);
        let (view, traces) = &views[0];
        assert_eq!(view.title, "SiPM | Evt 1, elecid 65");
        assert_eq!(traces[0].label, "65");
        assert_eq!(view.xlim, Some((1.0, 2.0)));
        assert_eq!(view.ylim, (-10.0, 30.0));
    }

    #[test]
    fn test_colors_carry_across_calls() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        let options = ViewOptions::default();
        driver
            .plot_waveforms(&sel, &sensors(), 1, &options, &mut colors)
            .unwrap();
        driver
            .plot_waveforms(&sel, &sensors(), 2, &options, &mut colors)
            .unwrap();
        assert_eq!(driver.views_shown(), 6);
        assert_eq!(driver.canvas().views[3].1[0].color, TRACE_COLORS[3]);
    }

    #[test]
    fn test_sensor_table_must_match() {
        let mut driver = driver();
        let mut colors = ColorCycle::new();
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        let short = SensorTable::from_sensor_ids(&[1000, 1001]);
        assert!(matches!(
            driver.plot_waveforms(&sel, &short, 1, &ViewOptions::default(), &mut colors),
            Err(RenderError::SensorCountMismatch {
                sensors: 2,
                traces: 3
            })
        ));
    }

    #[test]
    fn test_failed_acknowledgment_returns_to_idle() {
        let ack = CountingAck {
            count: 0,
            fail_after: Some(1),
        };
        let mut driver = RenderDriver::new(RecordingCanvas::default(), ack);
        let mut colors = ColorCycle::new();
        let sel = selection(WaveformKind::SiPM, 1, DisplayRange::full());
        let result = driver.plot_waveforms(&sel, &sensors(), 1, &ViewOptions::default(), &mut colors);
        assert!(matches!(result, Err(RenderError::InputClosed)));
        assert_eq!(driver.state(), RenderState::Idle);
        assert_eq!(driver.views_shown(), 2);
    }
}
