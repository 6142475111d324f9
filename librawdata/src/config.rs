use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::kind::WaveformKind;

/// Fixed lower and upper limits for one plot axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub lower: f64,
    pub upper: f64,
}

impl AxisLimits {
    pub fn new(lower: f64, upper: f64) -> Result<Self, ConfigError> {
        if lower < upper {
            Ok(Self { lower, upper })
        } else {
            Err(ConfigError::BadAxisLimits(lower, upper))
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

/// Display options for one plotting pass. Unset zooms mean autoscale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Draw every sensor in the range into one view
    pub overlay: bool,
    /// Draw only the baseline-subtracted, polarity-weighted sum of the range
    pub sum: bool,
    /// Draw two consecutive event slots of each sensor together
    pub dual: bool,
    /// Label sensors by electronics channel instead of sensor ID
    pub elecid: bool,
    pub zoomx: Option<AxisLimits>,
    pub zoomy: Option<AxisLimits>,
}

impl ViewOptions {
    /// Events consumed per plotting step
    pub fn event_step(&self) -> usize {
        if self.dual {
            2
        } else {
            1
        }
    }
}

/// Sensor IDs (or channels, with elecid) bounding the displayed SiPMs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorIdRange {
    pub first: i32,
    pub last: i32,
}

/// Where rendered views go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTarget {
    /// Image overwritten by each view in interactive mode
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// When set, views are written as numbered images here without pausing
    pub batch_directory: Option<PathBuf>,
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("waveform_view.png"),
            width: 1024,
            height: 640,
            batch_directory: None,
        }
    }
}

/// Structure representing a plotting session. Serializable to and from YAML, so that a
/// session can be reproduced from a file instead of a long command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    pub file: PathBuf,
    pub pmt: bool,
    pub blr: bool,
    pub sipm: bool,
    pub sipm_range: Option<SensorIdRange>,
    pub first_event: usize,
    pub view: ViewOptions,
    #[serde(default)]
    pub target: RenderTarget,
}

impl Default for PlotConfig {
    /// Generate a new PlotConfig. The file path is a placeholder and no kind is selected
    fn default() -> Self {
        Self {
            file: PathBuf::from("None"),
            pmt: false,
            blr: false,
            sipm: false,
            sipm_range: None,
            first_event: 0,
            view: ViewOptions::default(),
            target: RenderTarget::default(),
        }
    }
}

impl PlotConfig {
    /// Read the configuration in a YAML file
    /// Returns a PlotConfig if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;
        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Zoom limits coming from a file bypass AxisLimits::new, so check them here
    pub fn validate(&self) -> Result<(), ConfigError> {
        for limits in [self.view.zoomx, self.view.zoomy].iter().flatten() {
            AxisLimits::new(limits.lower, limits.upper)?;
        }
        Ok(())
    }

    /// Is a kind selected for plotting
    pub fn wants(&self, kind: WaveformKind) -> bool {
        match kind {
            WaveformKind::Pmt => self.pmt,
            WaveformKind::Blr => self.blr,
            WaveformKind::SiPM => self.sipm,
        }
    }

    /// Kinds selected for plotting, in plotting order
    pub fn requested_kinds(&self) -> Vec<WaveformKind> {
        WaveformKind::ALL
            .into_iter()
            .filter(|kind| self.wants(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_limits() {
        assert!(AxisLimits::new(0.0, 10.0).is_ok());
        assert!(matches!(
            AxisLimits::new(3.0, 3.0),
            Err(ConfigError::BadAxisLimits(..))
        ));
    }

    #[test]
    fn test_yaml_round_trip_keeps_unset_zoom() {
        let mut config = PlotConfig::default();
        config.sipm = true;
        config.sipm_range = Some(SensorIdRange {
            first: 1000,
            last: 1063,
        });
        config.view.zoomy = Some(AxisLimits::new(-5.0, 50.0).unwrap());
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: PlotConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.view, config.view);
        assert_eq!(back.view.zoomx, None);
        assert_eq!(back.sipm_range, config.sipm_range);
        assert_eq!(back.requested_kinds(), vec![WaveformKind::SiPM]);
    }

    #[test]
    fn test_partial_view_section() {
        let yaml = "file: run.h5\npmt: true\nblr: false\nsipm: false\nsipm_range: null\nfirst_event: 2\nview:\n  dual: true\n";
        let config: PlotConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.view.dual);
        assert!(!config.view.overlay);
        assert_eq!(config.view.event_step(), 2);
        assert_eq!(config.target, RenderTarget::default());
    }

    #[test]
    fn test_no_kinds_requested() {
        assert!(PlotConfig::default().requested_kinds().is_empty());
    }

    #[test]
    fn test_inverted_zoom_in_file_is_rejected() {
        let mut config = PlotConfig::default();
        config.view.zoomx = Some(AxisLimits {
            lower: 10.0,
            upper: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let path = PathBuf::from("/this/path/does/not/exist.yml");
        assert!(matches!(
            PlotConfig::read_config_file(&path),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
