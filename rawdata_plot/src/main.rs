//! # rawdata_plot
//!
//! Part of the rawdata_tools crate family.
//!
//! Steps through the waveforms of a decoded raw data file.
//!
//! ## Use
//!
//! ```bash
//! rawdata_plot --file run_3733.h5 --sipm --sipm-range 1000 1064 --overlay
//! rawdata_plot --config view.yml
//! rawdata_plot new --config view.yml
//! ```
//!
//! Each view is drawn to `waveform_view.png` (see `--image`) and the viewer waits for
//! [enter]. With `--batch <dir>` views are written as numbered images without waiting.
//! No kind flags means nothing is plotted.
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

use librawdata::config::{AxisLimits, PlotConfig, SensorIdRange};
use librawdata::error::ConfigError;
use librawdata::process::plot;

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    PlotConfig::default().write_config_file(path)
}

/// Read a two-valued argument as an ordered pair
fn pair<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Option<(T, T)> {
    let values: Vec<T> = matches.get_many::<T>(id)?.cloned().collect();
    match values.as_slice() {
        [a, b] => Some((a.clone(), b.clone())),
        _ => None,
    }
}

fn limits(matches: &ArgMatches, id: &str) -> Result<Option<AxisLimits>, ConfigError> {
    pair::<f64>(matches, id)
        .map(|(lower, upper)| AxisLimits::new(lower, upper))
        .transpose()
}

/// Build a PlotConfig from command line flags
fn config_from_args(matches: &ArgMatches) -> Result<Option<PlotConfig>, ConfigError> {
    let Some(file) = matches.get_one::<String>("file") else {
        return Ok(None);
    };
    let mut config = PlotConfig::default();
    config.file = PathBuf::from(file);
    config.pmt = matches.get_flag("pmt");
    config.blr = matches.get_flag("blr");
    config.sipm = matches.get_flag("sipm");
    config.sipm_range = pair::<i32>(matches, "sipm-range").map(|(first, last)| SensorIdRange { first, last });
    config.first_event = matches.get_one::<usize>("first").copied().unwrap_or(0);
    config.view.overlay = matches.get_flag("overlay");
    config.view.sum = matches.get_flag("sum");
    config.view.dual = matches.get_flag("dual");
    config.view.elecid = matches.get_flag("elecid");
    config.view.zoomx = limits(matches, "zoomx")?;
    config.view.zoomy = limits(matches, "zoomy")?;
    if let Some(image) = matches.get_one::<String>("image") {
        config.target.image_path = PathBuf::from(image);
    }
    config.target.batch_directory = matches.get_one::<String>("batch").map(PathBuf::from);
    Ok(Some(config))
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

/// The command line interface
fn cli() -> Command {
    // Create a cli
    Command::new("rawdata_plot")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to a YAML configuration file"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .conflicts_with("config")
                .help("Decoded HDF5 file to plot"),
        )
        .arg(flag("pmt", "Plot raw PMT waveforms"))
        .arg(flag("blr", "Plot baseline-restored PMT waveforms"))
        .arg(flag("sipm", "Plot SiPM waveforms"))
        .arg(
            Arg::new("sipm-range")
                .long("sipm-range")
                .num_args(2)
                .value_names(["FIRST", "LAST"])
                .value_parser(clap::value_parser!(i32))
                .help("Sensor IDs (channels with --elecid) bounding the SiPMs shown; LAST is excluded"),
        )
        .arg(flag("overlay", "Draw all sensors of an event in one view"))
        .arg(flag("sum", "Draw only the baseline-subtracted sum of the sensors"))
        .arg(flag("dual", "Draw two consecutive events of each sensor together"))
        .arg(flag("elecid", "Identify sensors by electronics channel"))
        .arg(
            Arg::new("first")
                .long("first")
                .value_parser(clap::value_parser!(usize))
                .default_value("0")
                .help("Index of the first event to plot"),
        )
        .arg(
            Arg::new("zoomx")
                .long("zoomx")
                .num_args(2)
                .value_names(["LOW", "HIGH"])
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64))
                .help("Fixed x axis limits"),
        )
        .arg(
            Arg::new("zoomy")
                .long("zoomy")
                .num_args(2)
                .value_names(["LOW", "HIGH"])
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64))
                .help("Fixed y axis limits"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .help("Image overwritten by each view (default waveform_view.png)"),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .help("Write every view as a numbered image in this directory without waiting"),
        )
}

fn main() {
    let matches = cli().get_matches();

    // Initialize feedback
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("Could not create logging!");

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);

    if let Some(("new", _)) = matches.subcommand() {
        let Some(config_path) = config_path else {
            log::error!("A template needs a path, given with --config");
            std::process::exit(1);
        };
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        if let Err(e) = make_template_config(&config_path) {
            log::error!("{e}");
            std::process::exit(1);
        }
        log::info!("Done.");
        return;
    }

    // Load our config
    let loaded = match &config_path {
        Some(path) => {
            log::info!("Loading config from {}...", path.to_string_lossy());
            PlotConfig::read_config_file(path).map(Some)
        }
        None => config_from_args(&matches),
    };
    let config = match loaded {
        Ok(Some(c)) => c,
        Ok(None) => {
            log::error!("Either --file or --config is required");
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("File: {}", config.file.to_string_lossy());
    log::info!(
        "PMT: {} BLR: {} SiPM: {}",
        config.pmt,
        config.blr,
        config.sipm
    );
    log::info!("First event: {}", config.first_event);
    if config.view.dual && (config.view.overlay || config.view.sum) {
        log::warn!("Dual display ignores --overlay and --sum");
    } else if config.view.overlay && config.view.sum {
        log::warn!("Sum display takes precedence over --overlay");
    }

    match plot(&config) {
        Ok(summary) => {
            log::info!(
                "Showed {} views over {} events.",
                summary.views_shown,
                summary.events_visited
            );
        }
        Err(e) => {
            log::error!("Plotting failed with error: {e}");
            std::process::exit(1);
        }
    }

    log::info!("Done.");
}
