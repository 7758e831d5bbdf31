use crate::error::{EtlError, Result};
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// `2024-Mar-07-14:23:05`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// The phase boundaries a run logs, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    JobStarted,
    ExtractStarted,
    ExtractEnded,
    TransformStarted,
    TransformEnded,
    LoadStarted,
    LoadEnded,
    JobEnded,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 8] = [
        Checkpoint::JobStarted,
        Checkpoint::ExtractStarted,
        Checkpoint::ExtractEnded,
        Checkpoint::TransformStarted,
        Checkpoint::TransformEnded,
        Checkpoint::LoadStarted,
        Checkpoint::LoadEnded,
        Checkpoint::JobEnded,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Checkpoint::JobStarted => "ETL Job Started",
            Checkpoint::ExtractStarted => "Extract phase Started",
            Checkpoint::ExtractEnded => "Extract phase Ended",
            Checkpoint::TransformStarted => "Transform phase Started",
            Checkpoint::TransformEnded => "Transform phase Ended",
            Checkpoint::LoadStarted => "Load phase Started",
            Checkpoint::LoadEnded => "Load phase Ended",
            Checkpoint::JobEnded => "ETL Job Ended",
        }
    }
}

/// Source of the timestamps written to the progress log.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Append-only file of `<timestamp>,<message>` lines.
///
/// The file is opened, written and closed on every call so that each line
/// stands on its own, even when the process dies between two calls.
pub struct ProgressLog {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl ProgressLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn record(&self, message: &str) -> Result<()> {
        let line = format_entry(self.clock.now(), message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| EtlError::file_access(&self.path, e))?;

        file.write_all(line.as_bytes())
            .map_err(|e| EtlError::file_access(&self.path, e))?;

        Ok(())
    }
}

pub fn format_entry(timestamp: NaiveDateTime, message: &str) -> String {
    format!("{},{}\n", timestamp.format(TIMESTAMP_FORMAT), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn march_seventh() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 23, 5)
            .unwrap()
    }

    #[test]
    fn test_entry_format() {
        assert_eq!(
            format_entry(march_seventh(), "ETL Job Started"),
            "2024-Mar-07-14:23:05,ETL Job Started\n"
        );
    }

    #[test]
    fn test_record_creates_then_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log_file.txt");
        let log = ProgressLog::new(&path).with_clock(FixedClock(march_seventh()));

        log.record("first").unwrap();
        log.record("second").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "2024-Mar-07-14:23:05,first\n2024-Mar-07-14:23:05,second\n"
        );
    }

    #[test]
    fn test_record_keeps_existing_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log_file.txt");
        fs::write(&path, "earlier run\n").unwrap();

        ProgressLog::new(&path)
            .with_clock(FixedClock(march_seventh()))
            .record("again")
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_unopenable_log_is_reported() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("missing").join("log_file.txt"));

        assert!(matches!(
            log.record("lost"),
            Err(EtlError::FileAccess { .. })
        ));
    }
}
