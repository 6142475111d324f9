//! # rawdata_tools
//!
//! Operator tools for the NEXT raw data pipeline. The external `decode` program turns raw
//! DATE files into HDF5; the tools here prepare and launch that program, and step through
//! the waveforms it wrote.
//!
//! The workspace contains three crates:
//!
//! - `librawdata`: this library
//! - `rawdata_plot`: the waveform viewer
//! - `rawdata_decode`: the decoder launcher
//!
//! ## HDF5
//!
//! HDF5 must be installed before building. Typically a package manager install (homebrew,
//! apt, etc) is auto detected. For a custom install location, write the following into
//! `.cargo/config.toml` at the top of the repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ## Viewing waveforms
//!
//! `rawdata_plot` reads the `RD/pmtrwf`, `RD/pmtblr` and `RD/sipmrwf` arrays of a decoded
//! file and shows them one view at a time. Each view is rendered to a PNG image
//! (`waveform_view.png` by default) and the viewer waits for [enter] before moving on, so
//! keep the image open in a viewer that reloads on change. With `--batch <dir>` every
//! view is written to its own numbered image instead and nothing waits.
//!
//! Display modes:
//!
//! - default: one view per sensor
//! - `--overlay`: all sensors of an event in one view
//! - `--sum`: the baseline-subtracted sum of all sensors (PMT pulses are inverted first)
//! - `--dual`: two consecutive event slots of each sensor in one view
//!
//! Kinds missing from a file are skipped with a warning.
//!
//! A session can also be described by a YAML file (`rawdata_plot new -c view.yml` writes a
//! template):
//!
//! ```yml
//! file: run_3733.h5
//! pmt: true
//! blr: false
//! sipm: true
//! sipm_range:
//!   first: 1000
//!   last: 1064
//! first_event: 0
//! view:
//!   overlay: false
//!   sum: false
//!   dual: false
//!   elecid: false
//!   zoomx: null
//!   zoomy:
//!     lower: 0.0
//!     upper: 120.0
//! target:
//!   image_path: waveform_view.png
//!   width: 1024
//!   height: 640
//!   batch_directory: null
//! ```
//!
//! ## Decoding
//!
//! `rawdata_decode -f <raw file> -o <hdf5 file> -e <max events>` writes the decoder's JSON
//! descriptor to `<temp dir>/<raw file name>.json` and runs the decoder on it through a
//! shell. The exit code is the decoder's own.
pub mod acknowledge;
pub mod baseline;
pub mod canvas;
pub mod config;
pub mod decode;
pub mod error;
pub mod kind;
pub mod palette;
pub mod process;
pub mod render;
pub mod selector;
pub mod sensors;
pub mod storage;
