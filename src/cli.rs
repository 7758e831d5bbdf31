use crate::config::{CliOverrides, Config, ErrorPolicy};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "etl-batch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract person records from CSV, JSON and XML files, convert units and load them into one CSV file")]
#[command(
    long_about = "etl-batch reads every .csv, .json (one object per line) and .xml file in a directory, \
                  converts heights from inches to meters and weights from pounds to kilograms, \
                  writes the result to a CSV file and appends progress lines to a log file."
)]
#[command(after_help = "EXAMPLES:\n  \
    etl-batch\n  \
    etl-batch --dir data/ --output out/people.csv\n  \
    etl-batch --input source1.csv --input source2.xml --no-index\n  \
    etl-batch --skip-invalid --report --config etl.toml")]
pub struct Cli {
    /// Directory to scan for source files
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Source file to read instead of scanning a directory (repeatable)
    #[arg(short, long = "input", value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Progress log file
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Leave out the leading row index column
    #[arg(long)]
    pub no_index: bool,

    /// Skip source files that cannot be parsed instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,

    /// Save a JSON run report next to the output file
    #[arg(long)]
    pub report: bool,

    /// Output format for console messages
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list the sources that would be read without touching any file)
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Write a sample configuration file and exit")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_directory(self.dir.clone())
            .with_target_file(self.output.clone())
            .with_log_file(self.log_file.clone())
            .with_include_index(self.no_index.then_some(false))
            .with_write_report(self.report.then_some(true))
            .with_on_error(self.skip_invalid.then_some(ErrorPolicy::SkipInvalid))
    }

    /// Explicit source files, when any were given.
    pub fn explicit_inputs(&self) -> Option<&[PathBuf]> {
        if self.inputs.is_empty() {
            None
        } else {
            Some(&self.inputs)
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
