use crate::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub directory: PathBuf,
    pub max_depth: usize,
    pub exclude_patterns: Vec<String>,
    pub on_error: ErrorPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub target_file: PathBuf,
    pub include_index: bool,
    pub write_report: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub log_file: PathBuf,
}

/// What the extraction phase does when a single source file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first bad file.
    #[default]
    FailFast,
    /// Report the bad file, skip it and keep going.
    SkipInvalid,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            max_depth: 1,
            exclude_patterns: Vec::new(),
            on_error: ErrorPolicy::FailFast,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_file: PathBuf::from("transformed_data.csv"),
            include_index: true,
            write_report: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("log_file.txt"),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(EtlError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| EtlError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| EtlError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["etl.toml", ".etl.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref directory) = cli_args.directory {
            self.input.directory = directory.clone();
        }

        if let Some(ref target_file) = cli_args.target_file {
            self.output.target_file = target_file.clone();
        }

        if let Some(ref log_file) = cli_args.log_file {
            self.log.log_file = log_file.clone();
        }

        if let Some(include_index) = cli_args.include_index {
            self.output.include_index = include_index;
        }

        if let Some(write_report) = cli_args.write_report {
            self.output.write_report = write_report;
        }

        if let Some(on_error) = cli_args.on_error {
            self.input.on_error = on_error;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| EtlError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| EtlError::file_access(path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.max_depth == 0 {
            return Err(EtlError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        if self.output.target_file.as_os_str().is_empty() {
            return Err(EtlError::Config {
                message: "Output file path must not be empty".to_string(),
            });
        }

        if self.log.log_file.as_os_str().is_empty() {
            return Err(EtlError::Config {
                message: "Log file path must not be empty".to_string(),
            });
        }

        for pattern in &self.input.exclude_patterns {
            Regex::new(pattern).map_err(|e| EtlError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    /// Where the run report lands when `output.write_report` is set.
    pub fn report_path(&self) -> PathBuf {
        let mut name = self.output.target_file.as_os_str().to_owned();
        name.push(".report.json");
        PathBuf::from(name)
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub directory: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub include_index: Option<bool>,
    pub write_report: Option<bool>,
    pub on_error: Option<ErrorPolicy>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_target_file(mut self, target_file: Option<PathBuf>) -> Self {
        self.target_file = target_file;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    pub fn with_include_index(mut self, include_index: Option<bool>) -> Self {
        self.include_index = include_index;
        self
    }

    pub fn with_write_report(mut self, write_report: Option<bool>) -> Self {
        self.write_report = write_report;
        self
    }

    pub fn with_on_error(mut self, on_error: Option<ErrorPolicy>) -> Self {
        self.on_error = on_error;
        self
    }
}
