use crate::error::{EtlError, Result};
use crate::extractor::{ExtractionProgress, SourceSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a pipeline run did, for the console and the optional JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub sources: Vec<SourceSummary>,
    pub records_extracted: usize,
    pub records_loaded: usize,
    pub skipped: Vec<String>,
    pub output_file: PathBuf,
    pub log_file: PathBuf,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        duration: Duration,
        extraction: &ExtractionProgress,
        records_loaded: usize,
        output_file: &Path,
        log_file: &Path,
    ) -> Self {
        Self {
            started_at,
            duration,
            sources: extraction.sources.clone(),
            records_extracted: extraction.records_extracted,
            records_loaded,
            skipped: extraction.errors.clone(),
            output_file: output_file.to_path_buf(),
            log_file: log_file.to_path_buf(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json_content = serde_json::to_string_pretty(self).map_err(|e| EtlError::Config {
            message: format!("Failed to serialize report to JSON: {}", e),
        })?;

        fs::write(path, json_content).map_err(|e| EtlError::file_access(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::SourceFormat;
    use tempfile::TempDir;

    fn sample_progress() -> ExtractionProgress {
        let mut progress = ExtractionProgress::new(2);
        progress.records_extracted = 3;
        progress.sources.push(SourceSummary {
            path: "source1.csv".to_string(),
            format: SourceFormat::Tabular,
            records: 3,
        });
        progress.add_error("Skipped bad.xml: missing height");
        progress
    }

    #[test]
    fn test_report_from_progress() {
        let report = RunReport::new(
            Utc::now(),
            Duration::from_millis(12),
            &sample_progress(),
            3,
            Path::new("transformed_data.csv"),
            Path::new("log_file.txt"),
        );

        assert_eq!(report.records_extracted, 3);
        assert_eq!(report.records_loaded, 3);
        assert_eq!(report.sources.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_save_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = RunReport::new(
            Utc::now(),
            Duration::from_secs(1),
            &sample_progress(),
            3,
            Path::new("transformed_data.csv"),
            Path::new("log_file.txt"),
        );

        report.save_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["records_loaded"], 3);
        assert_eq!(value["sources"][0]["format"], "tabular");
        assert_eq!(value["skipped"].as_array().unwrap().len(), 1);
    }
}
