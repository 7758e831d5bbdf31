use crate::error::{EtlError, UserFriendlyError};
use crate::loader::RunReport;
use crate::record::Record;
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");

/// Console message kinds, ordered by how much verbosity they need.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    Error,
    Warning,
    Success,
    Step,
    Info,
    Debug,
}

impl Level {
    fn min_verbosity(self) -> u8 {
        match self {
            Level::Error | Level::Warning | Level::Success | Level::Step => 0,
            Level::Info => 1,
            Level::Debug => 2,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Success => "success",
            Level::Step => "step",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }
}

/// Everything the binary prints to the console goes through here.
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = mode == OutputMode::Human
            && !quiet
            && Term::stdout().features().colors_supported();

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    /// Errors are shown even in quiet mode.
    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    /// Announce the phase of the run that is about to start.
    pub fn step(&self, message: &str) {
        self.emit(Level::Step, message);
    }

    pub fn print_user_friendly_error(&self, error: &EtlError) {
        self.error(&error.user_message());

        let Some(suggestion) = error.suggestion() else {
            return;
        };
        match self.mode {
            OutputMode::Json => self.print_json(serde_json::json!({
                "type": "suggestion",
                "message": suggestion
            })),
            OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            OutputMode::Human if self.use_colors => eprintln!(
                "\n{}{}",
                INFO,
                style(format!("Suggestion: {}", suggestion)).cyan()
            ),
            OutputMode::Human => eprintln!("\nSuggestion: {}", suggestion),
        }
    }

    /// Print the transformed records as a table.
    pub fn print_records(&self, title: &str, records: &[Record]) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Json => self.print_json(serde_json::json!({
                "type": "records",
                "title": title,
                "records": records
            })),
            _ => print!("{}\n{}", title, render_table(records)),
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_report(report),
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                println!("COMPLETED: ETL job");
                println!("Sources: {}", report.sources.len());
                println!("Records extracted: {}", report.records_extracted);
                println!("Records loaded: {}", report.records_loaded);
                println!("Output: {}", report.output_file.display());
                println!("Duration: {}", format_duration(report.duration));
                if !report.is_clean() {
                    println!("Skipped: {}", report.skipped.len());
                }
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Json => self.print_json(serde_json::json!({
                "type": "header",
                "title": title
            })),
            OutputMode::Human if self.use_colors => {
                println!("\n{}\n", style(title).bold().cyan())
            }
            _ => println!("=== {} ===", title),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet || self.mode == OutputMode::Json {
            return;
        }

        if self.use_colors {
            println!("{}", style("─".repeat(60)).dim());
        } else {
            println!("{}", "-".repeat(60));
        }
    }

    fn should_show(&self, level: Level) -> bool {
        level == Level::Error || (!self.quiet && self.verbose_level >= level.min_verbosity())
    }

    fn emit(&self, level: Level, message: &str) {
        if !self.should_show(level) {
            return;
        }

        match self.mode {
            OutputMode::Json => self.print_json(serde_json::json!({
                "type": "message",
                "level": level.tag(),
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain if level == Level::Error => eprintln!("ERROR: {}", message),
            OutputMode::Plain => println!("{}: {}", level.tag().to_uppercase(), message),
            OutputMode::Human => self.emit_human(level, message),
        }
    }

    fn emit_human(&self, level: Level, message: &str) {
        let line = if self.use_colors {
            match level {
                Level::Error => format!("{}{}", CROSS, style(message).red().bold()),
                Level::Warning => format!("{}{}", WARNING, style(message).yellow().bold()),
                Level::Success => format!("{}{}", CHECKMARK, style(message).green().bold()),
                Level::Step => format!("{}", style(message).bold()),
                Level::Info => format!("{}{}", INFO, style(message).cyan()),
                Level::Debug => format!("  {}", style(message).dim()),
            }
        } else {
            let prefix = match level {
                Level::Error => "✗",
                Level::Warning => "!",
                Level::Success => "✓",
                Level::Step => ">",
                Level::Info => "i",
                Level::Debug => "  DEBUG:",
            };
            format!("{} {}", prefix, message)
        };

        if level == Level::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn print_json(&self, value: serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_report(&self, report: &RunReport) {
        self.print_separator();

        let headline = if report.is_clean() {
            "ETL job completed"
        } else {
            "ETL job completed with skipped sources"
        };
        self.success(headline);

        let value = |v: String| {
            if self.use_colors {
                style(v).cyan().bold().to_string()
            } else {
                v
            }
        };
        println!();
        println!("  Sources read:    {}", value(report.sources.len().to_string()));
        println!("  Records loaded:  {}", value(report.records_loaded.to_string()));
        println!("  Output file:     {}", value(report.output_file.display().to_string()));
        println!("  Time taken:      {}", value(format_duration(report.duration)));

        if !report.sources.is_empty() {
            println!("\nRecords by source:");
            for source in &report.sources {
                println!("  {} ({}): {}", source.path, source.format, source.records);
            }
        }

        if !report.is_clean() {
            println!("\nSkipped sources:");
            for skipped in &report.skipped {
                println!("  - {}", skipped);
            }
        }

        self.print_separator();
    }
}

/// Index column plus the three record fields, right-aligned like a dataframe dump.
fn render_table(records: &[Record]) -> String {
    let rows: Vec<[String; 4]> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            [
                i.to_string(),
                r.name.clone(),
                format!("{:.2}", r.height),
                format!("{:.2}", r.weight),
            ]
        })
        .collect();

    let header = ["", "name", "height", "weight"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = String::new();
    let mut push_row = |cells: [&str; 4]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect();
        table.push_str(line.join("  ").trim_end());
        table.push('\n');
    };

    push_row(header);
    for row in &rows {
        push_row([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]);
    }

    if records.is_empty() {
        table.push_str("(no records)\n");
    }

    table
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
