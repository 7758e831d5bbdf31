use clap::Parser;
use etl_batch::{Cli, EtlError, EtlJob, OutputFormatter, OutputMode, UserFriendlyError};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level());

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let job = match EtlJob::from_cli(&cli) {
        Ok(job) => job,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &job);
    }

    let result = match cli.explicit_inputs() {
        Some(inputs) => job.run_with_sources(inputs),
        None => job.run(),
    };

    match result {
        Ok(report) => {
            job.output_formatter().print_run_report(&report);
            0
        }
        Err(e) => {
            job.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &EtlError) -> i32 {
    match error {
        EtlError::InvalidPath { .. } => 2,
        EtlError::Format { .. } => 3,
        EtlError::MissingField { .. } => 4,
        EtlError::FileAccess { .. } => 5,
        EtlError::Config { .. } => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "etl.toml".to_string());

    match EtlJob::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  etl-batch --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, job: &EtlJob) -> i32 {
    let formatter = job.output_formatter();

    formatter.info("DRY RUN MODE - No files will be read or written");
    formatter.print_separator();

    formatter.info("Configuration that would be used:");
    let config = job.config();

    println!("  Source directory: {}", config.input.directory.display());
    println!("  Max depth: {}", config.input.max_depth);
    if !config.input.exclude_patterns.is_empty() {
        println!(
            "  Exclude patterns: {}",
            config.input.exclude_patterns.join(", ")
        );
    }
    println!("  On error: {:?}", config.input.on_error);
    println!("  Output file: {}", config.output.target_file.display());
    println!("  Index column: {}", config.output.include_index);
    println!("  Log file: {}", config.log.log_file.display());

    formatter.print_separator();

    let sources = match job.plan_sources(cli.explicit_inputs()) {
        Ok(sources) => sources,
        Err(e) => {
            job.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    formatter.info(&format!("{} source files would be read:", sources.len()));
    for source in &sources {
        println!("  [{}] {}", source.format, source.display_path());
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");

    0
}

fn print_startup_error(error: &EtlError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "etl_batch=warn",
        1 => "etl_batch=info",
        _ => "etl_batch=debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Diagnostics go to stderr so stdout stays clean for --output-format json
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
