pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod progress_log;
pub mod record;
pub mod scanner;
pub mod transform;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ErrorPolicy, InputConfig, LogConfig, OutputConfig};
pub use error::{EtlError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    ExtractionCoordinator, ExtractionOutcome, ExtractionProgress, LineDelimitedExtractor,
    MarkupExtractor, RecordExtractor, TabularExtractor,
};
pub use loader::{CsvLoader, RunReport};
pub use progress_log::{Checkpoint, Clock, FixedClock, ProgressLog, SystemClock};
pub use record::{Record, RecordSet};
pub use scanner::{FileFilter, SourceFile, SourceFormat, SourceScanner};
pub use transform::transform;
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs the extract, transform and load phases over a set of source files.
pub struct EtlJob {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    progress_log: ProgressLog,
}

impl EtlJob {
    /// Create a new job with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let progress_log = ProgressLog::new(config.log.log_file.clone());

        Self {
            config,
            output_formatter,
            progress_manager,
            progress_log,
        }
    }

    /// Create a job from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Take progress log timestamps from `clock` instead of the system clock.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.progress_log = ProgressLog::new(self.config.log.log_file.clone()).with_clock(clock);
        self
    }

    /// Run the pipeline over every source file in the configured directory.
    pub fn run(&self) -> Result<RunReport> {
        self.execute(None)
    }

    /// Run the pipeline over exactly the given files.
    pub fn run_with_sources<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RunReport> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.execute(Some(&paths))
    }

    /// The sources a run would read, without reading them or writing anything.
    pub fn plan_sources(&self, inputs: Option<&[PathBuf]>) -> Result<Vec<SourceFile>> {
        let filter = FileFilter::new(&self.config.input)
            .with_excluded_path(&self.config.output.target_file)
            .with_excluded_path(&self.config.log.log_file)
            .with_excluded_path(self.config.report_path());
        let scanner = SourceScanner::new(&self.config.input).with_filter(filter);

        match inputs {
            Some(paths) => scanner.from_paths(paths),
            None => {
                let sources = scanner.scan_directory(&self.config.input.directory)?;
                let stats = scanner.get_statistics(&sources);
                self.output_formatter.debug(&stats.display_summary());
                Ok(sources)
            }
        }
    }

    fn execute(&self, inputs: Option<&[PathBuf]>) -> Result<RunReport> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        self.output_formatter.print_header("ETL batch run");
        self.checkpoint(Checkpoint::JobStarted);

        // Extract
        self.checkpoint(Checkpoint::ExtractStarted);
        let extraction = self
            .extract(inputs)
            .map_err(|e| self.abort(Checkpoint::ExtractStarted, e))?;
        self.checkpoint(Checkpoint::ExtractEnded);

        // Transform
        self.checkpoint(Checkpoint::TransformStarted);
        let transformed = transform(extraction.records);
        self.output_formatter
            .print_records("Transformed Data", &transformed);
        self.checkpoint(Checkpoint::TransformEnded);

        // Load
        self.checkpoint(Checkpoint::LoadStarted);
        let records_loaded = self
            .load(&transformed)
            .map_err(|e| self.abort(Checkpoint::LoadStarted, e))?;

        let report = RunReport::new(
            started_at,
            start_time.elapsed(),
            &extraction.progress,
            records_loaded,
            &self.config.output.target_file,
            &self.config.log.log_file,
        );

        if self.config.output.write_report {
            let report_path = self.config.report_path();
            report
                .save_json(&report_path)
                .map_err(|e| self.abort(Checkpoint::LoadStarted, e))?;
            self.output_formatter
                .debug(&format!("Saved run report to {}", report_path.display()));
        }
        self.checkpoint(Checkpoint::LoadEnded);

        self.checkpoint(Checkpoint::JobEnded);
        Ok(report)
    }

    fn extract(&self, inputs: Option<&[PathBuf]>) -> Result<ExtractionOutcome> {
        self.output_formatter.step("Extracting records");

        let sources = self.plan_sources(inputs)?;
        self.output_formatter
            .info(&format!("Found {} source files", sources.len()));

        let file_progress = self
            .progress_manager
            .create_file_progress(sources.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ExtractionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            }
        };

        let coordinator = ExtractionCoordinator::new().with_policy(self.config.input.on_error);
        let outcome = match coordinator.extract_all(
            &sources,
            Some(&progress_callback as &dyn Fn(&ExtractionProgress)),
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Extracted {} records", outcome.records.len()),
            outcome.progress.elapsed(),
        );

        for skipped in &outcome.progress.errors {
            self.progress_manager
                .suspend(|| self.output_formatter.warning(skipped));
        }

        Ok(outcome)
    }

    fn load(&self, records: &[Record]) -> Result<usize> {
        let target = &self.config.output.target_file;
        self.output_formatter
            .step(&format!("Loading records into {}", target.display()));

        CsvLoader::new()
            .with_index(self.config.output.include_index)
            .load(records, target)
    }

    fn checkpoint(&self, checkpoint: Checkpoint) {
        info!("{}", checkpoint.message());

        // A missing log line must never stop the data from being loaded
        if let Err(e) = self.progress_log.record(checkpoint.message()) {
            warn!("Could not write progress log: {}", e);
        }
    }

    /// The log file only ever holds the checkpoints that were reached.
    fn abort(&self, phase: Checkpoint, e: EtlError) -> EtlError {
        error!("Run aborted after '{}': {}", phase.message(), e);
        e
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &EtlError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
