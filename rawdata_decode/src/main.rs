//! # rawdata_decode
//!
//! Part of the rawdata_tools crate family.
//!
//! Launches the external decoder on one raw data file.
//!
//! ## Use
//!
//! ```bash
//! rawdata_decode -f run_3733.gdc1next.rd -o run_3733.h5 -e 100
//! rawdata_decode -f run_3733.gdc1next.rd -o run_3733.h5 -e 100 --config decoder.yml
//! rawdata_decode new --config decoder.yml
//! ```
//!
//! The decoder's JSON descriptor is written to `<temp dir>/<raw file name>.json` and the
//! decoder is run on it through a shell. The exit code is the decoder's own.
use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::time::Duration;

use librawdata::decode::{exit_code, DecodeDescriptor, DecoderConfig};
use librawdata::error::{ConfigError, DecodeError};

fn make_template_config(path: &Path) -> Result<(), ConfigError> {
    DecoderConfig::default().write_config_file(path)
}

/// Build the descriptor from the command line. Extras are only set when given.
fn descriptor_from_args(matches: &ArgMatches) -> Option<DecodeDescriptor> {
    let file_in = matches.get_one::<String>("file")?;
    let file_out = matches.get_one::<String>("output")?;
    let max_events = *matches.get_one::<u64>("events")?;
    let mut descriptor =
        DecodeDescriptor::new(Path::new(file_in), Path::new(file_out), max_events);
    descriptor.two_files = matches.get_flag("two-files");
    descriptor.verbosity = matches.get_one::<i32>("verbosity").copied();
    descriptor.ext_trigger = matches.get_one::<i32>("ext-trigger").copied();
    descriptor.skip = matches.get_one::<u64>("skip").copied();
    descriptor.discard = matches.get_one::<bool>("discard").copied();
    descriptor.copy_evts = matches.get_one::<bool>("copy-evts").copied();
    Some(descriptor)
}

/// Write the descriptor, start the decoder and wait for it, ticking a spinner meanwhile
fn run_decoder(
    config: &DecoderConfig,
    descriptor: &DecodeDescriptor,
    pb_manager: &MultiProgress,
) -> Result<i32, DecodeError> {
    let descriptor_path = config.descriptor_path(&descriptor.file_in)?;
    descriptor.write(&descriptor_path)?;
    log::info!("Descriptor written to {}", descriptor_path.display());

    let command_line = config.command_line(&descriptor_path);
    log::info!("Running: {command_line}");
    let mut child = config.spawn(&command_line)?;

    let spinner = pb_manager.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {elapsed} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("decoding {}", descriptor.file_in.display()));
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        spinner.tick();
        std::thread::sleep(Duration::from_millis(200));
    };
    spinner.finish_and_clear();

    Ok(exit_code(status))
}

/// The command line interface
fn cli() -> Command {
    Command::new("rawdata_decode")
        .arg_required_else_help(true)
        .subcommand_negates_reqs(true)
        .subcommand(Command::new("new").about("Make a template decoder configuration yaml file"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to a YAML decoder configuration file"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .required(true)
                .help("Raw data file to decode"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .required(true)
                .help("HDF5 file to write"),
        )
        .arg(
            Arg::new("events")
                .short('e')
                .long("events")
                .required(true)
                .value_parser(clap::value_parser!(u64))
                .help("Maximum number of events to decode"),
        )
        .arg(
            Arg::new("two-files")
                .long("two-files")
                .action(ArgAction::SetTrue)
                .help("Decode the two GDC files of a run into one output"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .value_parser(clap::value_parser!(i32))
                .help("Decoder verbosity"),
        )
        .arg(
            Arg::new("ext-trigger")
                .long("ext-trigger")
                .value_parser(clap::value_parser!(i32))
                .help("External trigger channel"),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .value_parser(clap::value_parser!(u64))
                .help("Number of events to skip"),
        )
        .arg(
            Arg::new("discard")
                .long("discard")
                .value_parser(clap::value_parser!(bool))
                .help("Discard events with errors (true or false)"),
        )
        .arg(
            Arg::new("copy-evts")
                .long("copy-evts")
                .value_parser(clap::value_parser!(bool))
                .help("Copy the raw events to the output (true or false)"),
        )
}

fn main() {
    let matches = cli().get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

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

    let config = match &config_path {
        Some(path) => {
            log::info!("Loading config from {}...", path.to_string_lossy());
            match DecoderConfig::read_config_file(path) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("{e}");
                    std::process::exit(1);
                }
            }
        }
        None => DecoderConfig::default(),
    };

    let Some(descriptor) = descriptor_from_args(&matches) else {
        log::error!("--file, --output and --events are required");
        std::process::exit(1);
    };
    log::info!("Input: {}", descriptor.file_in.to_string_lossy());
    log::info!("Output: {}", descriptor.file_out.to_string_lossy());
    log::info!("Max events: {}", descriptor.max_events);

    match run_decoder(&config, &descriptor, &pb_manager) {
        Ok(0) => {
            log::info!("Decoder finished.");
        }
        Ok(code) => {
            log::error!("Decoder exited with code {code}");
            std::process::exit(code);
        }
        Err(e) => {
            log::error!("Decoding failed with error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_args() {
        assert!(cli()
            .try_get_matches_from(["rawdata_decode", "-f", "run.rd", "-o", "run.h5"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["rawdata_decode", "new", "-c", "decoder.yml"])
            .is_ok());
    }

    #[test]
    fn test_descriptor_from_args() {
        let matches = cli()
            .try_get_matches_from([
                "rawdata_decode",
                "-f",
                "/data/run.rd",
                "-o",
                "/data/run.h5",
                "-e",
                "25",
                "--skip",
                "3",
                "--discard",
                "false",
            ])
            .unwrap();
        let descriptor = descriptor_from_args(&matches).unwrap();
        assert_eq!(descriptor.file_in, PathBuf::from("/data/run.rd"));
        assert_eq!(descriptor.file_out, PathBuf::from("/data/run.h5"));
        assert_eq!(descriptor.max_events, 25);
        assert!(descriptor.no_db);
        assert!(!descriptor.two_files);
        assert_eq!(descriptor.skip, Some(3));
        assert_eq!(descriptor.discard, Some(false));
        assert_eq!(descriptor.verbosity, None);
        assert_eq!(descriptor.copy_evts, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_exit_code_is_returned() {
        let directory = std::env::temp_dir().join(format!("rawdata_decode_{}", std::process::id()));
        std::fs::create_dir_all(&directory).unwrap();
        let config = DecoderConfig {
            decoder: PathBuf::from("exit 4; true"),
            shell: PathBuf::from("/bin/sh"),
            setup: None,
            extra_path: vec![],
            descriptor_directory: Some(directory.clone()),
        };
        let descriptor = DecodeDescriptor::new(Path::new("/data/run.rd"), Path::new("run.h5"), 1);
        let code = run_decoder(&config, &descriptor, &MultiProgress::new()).unwrap();
        assert_eq!(code, 4);
        assert!(directory.join("run.rd.json").exists());
        std::fs::remove_dir_all(&directory).unwrap();
    }
}
