use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

use super::error::{ConfigError, DecodeError};

/// The JSON file handed to the decoder. Optional settings are left out when unset, so the
/// decoder applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeDescriptor {
    pub file_in: PathBuf,
    pub file_out: PathBuf,
    pub two_files: bool,
    pub no_db: bool,
    pub max_events: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_trigger: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_evts: Option<bool>,
}

impl DecodeDescriptor {
    /// Descriptor for a single-file decode with the sensor database disabled
    pub fn new(file_in: &Path, file_out: &Path, max_events: u64) -> Self {
        Self {
            file_in: file_in.to_path_buf(),
            file_out: file_out.to_path_buf(),
            two_files: false,
            no_db: true,
            max_events,
            verbosity: None,
            ext_trigger: None,
            skip: None,
            discard: None,
            copy_evts: None,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), DecodeError> {
        let mut file = File::create(path)?;
        serde_json::to_writer(&mut file, self)?;
        file.flush()?;
        Ok(())
    }
}

/// How to reach the decoder on this machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub decoder: PathBuf,
    pub shell: PathBuf,
    /// Run before the decoder in the same shell, e.g. to source an environment script
    pub setup: Option<String>,
    /// Prepended to PATH before setup runs
    pub extra_path: Vec<PathBuf>,
    /// Where descriptors are written; the system temp directory when unset
    pub descriptor_directory: Option<PathBuf>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            decoder: PathBuf::from("/home/dateuser/rawdata/decode"),
            shell: PathBuf::from("/bin/bash"),
            setup: Some(String::from("source /home/dateuser/rawdata/manage.sh env")),
            extra_path: vec![PathBuf::from("/home/dateuser/miniconda/bin")],
            descriptor_directory: None,
        }
    }
}

impl DecoderConfig {
    /// Read the configuration in a YAML file
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(config_path)?;
        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Descriptor location for an input file: <directory>/<input file name>.json
    pub fn descriptor_path(&self, file_in: &Path) -> Result<PathBuf, DecodeError> {
        let name = file_in
            .file_name()
            .ok_or_else(|| DecodeError::BadInputPath(file_in.to_path_buf()))?;
        let directory = self
            .descriptor_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        Ok(directory.join(format!("{}.json", name.to_string_lossy())))
    }

    /// The shell command line running the decoder on a descriptor
    pub fn command_line(&self, descriptor: &Path) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.extra_path.is_empty() {
            let joined: Vec<String> = self
                .extra_path
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect();
            parts.push(format!("export PATH={}:$PATH", joined.join(":")));
        }
        if let Some(setup) = &self.setup {
            parts.push(setup.clone());
        }
        parts.push(format!(
            "{} {}",
            self.decoder.display(),
            descriptor.display()
        ));
        parts.join("; ")
    }

    /// Start the decoder through the configured shell
    pub fn spawn(&self, command_line: &str) -> Result<Child, DecodeError> {
        Ok(Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .spawn()?)
    }
}

/// Process exit code to hand back to the caller; a decoder killed by a signal counts as 1
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
