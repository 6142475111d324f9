use plotters::prelude::*;
use std::path::{Path, PathBuf};

use super::error::RenderError;

pub const X_LABEL: &str = "Time bin";
pub const Y_LABEL: &str = "Amplitude (adc)";

/// One line to be drawn into the current view
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub label: String,
    pub time: Vec<f64>,
    pub values: Vec<f64>,
    pub color: RGBColor,
    pub stroke_width: u32,
}

/// Everything about a view apart from its traces
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// None autoscales to the time span of the traces
    pub xlim: Option<(f64, f64)>,
    pub ylim: (f64, f64),
    pub legend: bool,
}

/// A plotting surface that collects traces and shows them one view at a time.
pub trait Canvas {
    fn draw(&mut self, trace: Trace);
    /// Render everything drawn since the last clear
    fn present(&mut self, view: &ViewSpec) -> Result<(), RenderError>;
    fn clear(&mut self);
}

/// Points of a "steps-pre" line: value i is held over the interval ending at time i.
pub fn step_points(time: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    let n = time.len().min(values.len());
    let mut points = Vec::with_capacity(2 * n);
    for i in 0..n {
        if i > 0 {
            points.push((time[i - 1], values[i]));
        }
        points.push((time[i], values[i]));
    }
    points
}

/// Limits usable by the backend; an empty or inverted interval is widened
fn usable_limits(limits: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = limits;
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo < hi {
        (lo, hi)
    } else if lo > hi {
        (hi, lo)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn time_span(traces: &[Trace]) -> (f64, f64) {
    let lo = traces
        .iter()
        .filter_map(|t| t.time.first())
        .fold(f64::INFINITY, |acc, v| acc.min(*v));
    let hi = traces
        .iter()
        .filter_map(|t| t.time.last())
        .fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
    (lo, hi)
}

fn backend_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}

/// Where presented views end up
#[derive(Debug, Clone)]
pub enum CanvasOutput {
    /// Every view overwrites the same image, for watching in an image viewer
    Single(PathBuf),
    /// Every view gets its own numbered image in a directory
    Numbered { directory: PathBuf, next: usize },
}

/// Canvas rendering each view to a PNG image with plotters
#[derive(Debug)]
pub struct PngCanvas {
    output: CanvasOutput,
    size: (u32, u32),
    traces: Vec<Trace>,
}

impl PngCanvas {
    pub fn new(output: CanvasOutput, size: (u32, u32)) -> Self {
        Self {
            output,
            size,
            traces: Vec::new(),
        }
    }

    fn next_path(&mut self) -> PathBuf {
        match &mut self.output {
            CanvasOutput::Single(path) => path.clone(),
            CanvasOutput::Numbered { directory, next } => {
                *next += 1;
                directory.join(format!("view_{:05}.png", next))
            }
        }
    }

    fn render(&self, path: &Path, view: &ViewSpec) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(backend_error)?;

        let (x0, x1) = usable_limits(view.xlim.unwrap_or_else(|| time_span(&self.traces)));
        let (y0, y1) = usable_limits(view.ylim);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(&view.title, ("sans-serif", 20))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(backend_error)?;
        chart
            .configure_mesh()
            .x_desc(view.x_label.as_str())
            .y_desc(view.y_label.as_str())
            .draw()
            .map_err(backend_error)?;

        for trace in self.traces.iter() {
            let color = trace.color;
            chart
                .draw_series(LineSeries::new(
                    step_points(&trace.time, &trace.values),
                    color.stroke_width(trace.stroke_width),
                ))
                .map_err(backend_error)?
                .label(trace.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }

        if view.legend && !self.traces.is_empty() {
            chart
                .configure_series_labels()
                .border_style(&BLACK)
                .background_style(&WHITE.mix(0.8))
                .draw()
                .map_err(backend_error)?;
        }
        root.present().map_err(backend_error)?;
        Ok(())
    }
}

impl Canvas for PngCanvas {
    fn draw(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    fn present(&mut self, view: &ViewSpec) -> Result<(), RenderError> {
        let path = self.next_path();
        self.render(&path, view)?;
        log::info!("{} -> {}", view.title, path.display());
        Ok(())
    }

    fn clear(&mut self) {
        self.traces.clear();
    }
}

/// Canvas that keeps every presented view in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingCanvas {
    pending: Vec<Trace>,
    pub views: Vec<(ViewSpec, Vec<Trace>)>,
}

#[cfg(test)]
impl Canvas for RecordingCanvas {
    fn draw(&mut self, trace: Trace) {
        self.pending.push(trace);
    }

    fn present(&mut self, view: &ViewSpec) -> Result<(), RenderError> {
        self.views.push((view.clone(), self.pending.clone()));
        Ok(())
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_points() {
        let points = step_points(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0]);
        assert_eq!(
            points,
            vec![(0.0, 5.0), (0.0, 6.0), (1.0, 6.0), (1.0, 7.0), (2.0, 7.0)]
        );
        assert!(step_points(&[], &[]).is_empty());
    }

    #[test]
    fn test_usable_limits() {
        assert_eq!(usable_limits((1.0, 2.0)), (1.0, 2.0));
        assert_eq!(usable_limits((0.0, 0.0)), (-1.0, 1.0));
        assert_eq!(usable_limits((-99.0, -101.0)), (-101.0, -99.0));
        assert_eq!(usable_limits((f64::INFINITY, f64::NEG_INFINITY)), (0.0, 1.0));
    }

    #[test]
    fn test_numbered_output() {
        let mut canvas = PngCanvas::new(
            CanvasOutput::Numbered {
                directory: PathBuf::from("views"),
                next: 0,
            },
            (100, 100),
        );
        assert_eq!(canvas.next_path(), PathBuf::from("views/view_00001.png"));
        assert_eq!(canvas.next_path(), PathBuf::from("views/view_00002.png"));
    }
}
