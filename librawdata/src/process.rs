use super::acknowledge::{Acknowledge, AutoAcknowledge, TerminalPrompt};
use super::canvas::{Canvas, CanvasOutput, PngCanvas};
use super::config::PlotConfig;
use super::error::PlotError;
use super::kind::WaveformKind;
use super::palette::ColorCycle;
use super::render::RenderDriver;
use super::selector::{select_kind, DisplayRange};
use super::sensors::{SensorKey, SensorTable};
use super::storage::RawDataFile;

/// What a plotting pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotSummary {
    pub events_visited: usize,
    pub views_shown: usize,
    pub skipped_kinds: Vec<WaveformKind>,
}

/// A kind that is present in the file, with everything needed to plot it
struct KindPlan {
    kind: WaveformKind,
    sensors: SensorTable,
    range: DisplayRange,
}

/// Work out which requested kinds can be plotted. Absent kinds are reported and skipped.
fn plan_kinds(
    file: &RawDataFile,
    config: &PlotConfig,
    summary: &mut PlotSummary,
) -> Result<Vec<KindPlan>, PlotError> {
    let mut plans = Vec::new();
    for kind in config.requested_kinds() {
        let missing = file.missing_paths(kind);
        if !missing.is_empty() {
            log::warn!(
                "Skipping {} waveforms: {} not found in {}",
                kind,
                missing.join(", "),
                file.path().display()
            );
            summary.skipped_kinds.push(kind);
            continue;
        }

        let sensors = file.sensor_table(kind)?;
        let range = match (kind, config.sipm_range) {
            (WaveformKind::SiPM, Some(bounds)) => {
                let key = SensorKey::from_elecid(config.view.elecid);
                let range = sensors.resolve_range(key, (bounds.first, bounds.last))?;
                log::info!(
                    "SiPM {} range {}..{} resolved to positions {:?}..{:?}",
                    key,
                    bounds.first,
                    bounds.last,
                    range.start,
                    range.end
                );
                range
            }
            _ => DisplayRange::full(),
        };
        plans.push(KindPlan {
            kind,
            sensors,
            range,
        });
    }
    Ok(plans)
}

fn plot_open_file<C: Canvas, A: Acknowledge>(
    file: &RawDataFile,
    config: &PlotConfig,
    driver: &mut RenderDriver<C, A>,
    colors: &mut ColorCycle,
) -> Result<PlotSummary, PlotError> {
    let mut summary = PlotSummary::default();
    let event_numbers = file.event_numbers()?;
    let plans = plan_kinds(file, config, &mut summary)?;
    if plans.is_empty() {
        log::info!("No waveform kinds to plot.");
        return Ok(summary);
    }

    let n_events = event_numbers.len();
    let step = config.view.event_step();
    for evt in (config.first_event..n_events).step_by(step) {
        let slots = evt..(evt + step).min(n_events);
        if slots.len() < step {
            log::warn!(
                "Event {} has no partner event for dual display, skipping",
                event_numbers[evt]
            );
            continue;
        }

        for plan in plans.iter() {
            let waveforms = file.waveforms(plan.kind, slots.clone())?;
            let selection = select_kind(plan.kind, waveforms.view(), plan.range);
            summary.views_shown += driver.plot_waveforms(
                &selection,
                &plan.sensors,
                event_numbers[evt],
                &config.view,
                colors,
            )?;
        }
        summary.events_visited += 1;
    }
    Ok(summary)
}

/// The main loop of the viewer.
///
/// Opens the file in the config, and for every event from the first requested one plots
/// each requested kind that is present in the file. The file is closed before returning,
/// whatever the outcome.
pub fn plot_file<C: Canvas, A: Acknowledge>(
    config: &PlotConfig,
    driver: &mut RenderDriver<C, A>,
    colors: &mut ColorCycle,
) -> Result<PlotSummary, PlotError> {
    let file = RawDataFile::open(&config.file)?;
    let result = plot_open_file(&file, config, driver, colors);
    let closed = file.close();
    let summary = result?;
    closed?;
    Ok(summary)
}

/// Plot with the canvas and acknowledgment source described by the config's render target.
///
/// Interactive sessions overwrite one image and wait for [enter] after every view; batch
/// sessions write numbered images and never wait.
pub fn plot(config: &PlotConfig) -> Result<PlotSummary, PlotError> {
    let target = &config.target;
    let size = (target.width, target.height);
    let mut colors = ColorCycle::new();
    match &target.batch_directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let canvas = PngCanvas::new(
                CanvasOutput::Numbered {
                    directory: directory.clone(),
                    next: 0,
                },
                size,
            );
            let mut driver = RenderDriver::new(canvas, AutoAcknowledge);
            plot_file(config, &mut driver, &mut colors)
        }
        None => {
            log::info!(
                "Views will be drawn to {}; keep it open in an image viewer.",
                target.image_path.display()
            );
            let canvas = PngCanvas::new(CanvasOutput::Single(target.image_path.clone()), size);
            let mut driver = RenderDriver::new(canvas, TerminalPrompt::stdin());
            plot_file(config, &mut driver, &mut colors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acknowledge::CountingAck;
    use crate::canvas::RecordingCanvas;
    use crate::config::SensorIdRange;
    use crate::error::{SensorLookupError, StorageError};
    use std::path::PathBuf;

    fn driver() -> RenderDriver<RecordingCanvas, CountingAck> {
        RenderDriver::new(RecordingCanvas::default(), CountingAck::default())
    }

    fn all_kinds(file: PathBuf) -> PlotConfig {
        let mut config = PlotConfig::default();
        config.file = file;
        config.pmt = true;
        config.blr = true;
        config.sipm = true;
        config
    }

    #[test]
    fn test_absent_kinds_are_skipped() {
        let path = crate::storage::write_fixture("process_skip", false);
        let mut driver = driver();
        let summary = plot_file(&all_kinds(path.clone()), &mut driver, &mut ColorCycle::new()).unwrap();
        assert_eq!(
            summary.skipped_kinds,
            vec![WaveformKind::Pmt, WaveformKind::Blr]
        );
        assert_eq!(summary.events_visited, 3);
        assert_eq!(summary.views_shown, 9);
        let (canvas, ack) = driver.into_parts();
        assert_eq!(ack.count, 9);
        assert!(canvas.views.iter().all(|(view, _)| view.title.starts_with("SiPM")));
        assert_eq!(canvas.views[0].0.title, "SiPM | Evt 100, sensor 1000");
        assert_eq!(canvas.views[8].0.title, "SiPM | Evt 102, sensor 1002");
        assert_eq!(canvas.views[4].1[0].values, vec![110.0, 111.0, 112.0, 113.0]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sipm_range_and_first_event() {
        let path = crate::storage::write_fixture("process_range", false);
        let mut config = all_kinds(path.clone());
        config.sipm_range = Some(SensorIdRange {
            first: 1000,
            last: 1002,
        });
        config.first_event = 1;
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        assert_eq!(summary.events_visited, 2);
        assert_eq!(summary.views_shown, 4);
        assert_eq!(driver.canvas().views[0].0.title, "SiPM | Evt 101, sensor 1000");
        assert_eq!(driver.canvas().views[1].0.title, "SiPM | Evt 101, sensor 1001");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sipm_range_by_channel() {
        let path = crate::storage::write_fixture("process_elecid", false);
        let mut config = all_kinds(path.clone());
        config.view.elecid = true;
        config.sipm_range = Some(SensorIdRange { first: 65, last: 66 });
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        assert_eq!(summary.views_shown, 3);
        assert_eq!(driver.canvas().views[0].0.title, "SiPM | Evt 100, elecid 65");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_sipm_boundary() {
        let path = crate::storage::write_fixture("process_lookup", false);
        let mut config = all_kinds(path.clone());
        config.sipm_range = Some(SensorIdRange {
            first: 1000,
            last: 4242,
        });
        let mut driver = driver();
        let result = plot_file(&config, &mut driver, &mut ColorCycle::new());
        assert!(matches!(
            result,
            Err(PlotError::LookupError(SensorLookupError::NotFound {
                value: 4242,
                ..
            }))
        ));
        assert!(driver.canvas().views.is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_dual_steps_by_two() {
        let path = crate::storage::write_fixture("process_dual", false);
        let mut config = all_kinds(path.clone());
        config.view.dual = true;
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        // Events 0 and 1 pair up; event 2 has no partner
        assert_eq!(summary.events_visited, 1);
        assert_eq!(summary.views_shown, 3);
        let traces = &driver.canvas().views[0].1;
        assert_eq!(traces[0].values, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(traces[1].values, vec![100.0, 101.0, 102.0, 103.0]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_sum_over_every_kind() {
        let path = crate::storage::write_fixture("process_sum", true);
        let mut config = all_kinds(path.clone());
        config.view.sum = true;
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        assert!(summary.skipped_kinds.is_empty());
        assert_eq!(summary.views_shown, 9);
        let titles: Vec<&str> = driver.canvas().views[..3]
            .iter()
            .map(|(view, _)| view.title.as_str())
            .collect();
        assert_eq!(titles, vec!["PMT SUM | Evt 100", "BLR SUM | Evt 100", "SiPM SUM | Evt 100"]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_nothing_requested() {
        let path = crate::storage::write_fixture("process_none", true);
        let mut config = PlotConfig::default();
        config.file = path.clone();
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        assert_eq!(summary, PlotSummary::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_first_event_past_the_end() {
        let path = crate::storage::write_fixture("process_past", false);
        let mut config = all_kinds(path.clone());
        config.first_event = 10;
        let mut driver = driver();
        let summary = plot_file(&config, &mut driver, &mut ColorCycle::new()).unwrap();
        assert_eq!(summary.events_visited, 0);
        assert_eq!(summary.views_shown, 0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let config = all_kinds(PathBuf::from("/no/such/run.h5"));
        let result = plot_file(&config, &mut driver(), &mut ColorCycle::new());
        assert!(matches!(
            result,
            Err(PlotError::StorageError(StorageError::BadFilePath(_)))
        ));
    }
}
