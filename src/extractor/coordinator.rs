use crate::config::ErrorPolicy;
use crate::error::Result;
use crate::extractor::{extractor_for, RecordExtractor};
use crate::record::RecordSet;
use crate::scanner::{SourceFile, SourceFormat};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub records_extracted: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub sources: Vec<SourceSummary>,
    pub errors: Vec<String>,
}

/// Records contributed by one source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub path: String,
    pub format: SourceFormat,
    pub records: usize,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            records_extracted: 0,
            current_file: None,
            start_time: Instant::now(),
            sources: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn update_file(&mut self, source: &SourceFile, records: usize) {
        self.files_processed += 1;
        self.records_extracted += records;
        self.current_file = Some(source.filename.clone());
        self.sources.push(SourceSummary {
            path: source.display_path(),
            format: source.format,
            records,
        });
    }

    pub fn add_error<S: Into<String>>(&mut self, error: S) {
        self.files_processed += 1;
        self.errors.push(error.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    pub records: RecordSet,
    pub progress: ExtractionProgress,
}

/// Runs the right extractor over every source and concatenates the results.
pub struct ExtractionCoordinator {
    policy: ErrorPolicy,
    extractors: HashMap<SourceFormat, Box<dyn RecordExtractor>>,
}

impl ExtractionCoordinator {
    pub fn new() -> Self {
        let extractors = SourceFormat::ALL
            .into_iter()
            .map(|format| (format, extractor_for(format)))
            .collect();

        Self {
            policy: ErrorPolicy::FailFast,
            extractors,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the extractor used for one format.
    pub fn with_extractor(mut self, extractor: Box<dyn RecordExtractor>) -> Self {
        self.extractors.insert(extractor.format(), extractor);
        self
    }

    /// Extract `sources` in the order given.
    ///
    /// Under [`ErrorPolicy::FailFast`] the first failing file aborts the whole
    /// extraction and nothing is returned. Under [`ErrorPolicy::SkipInvalid`]
    /// failures for individual files are recorded in the progress and the file
    /// contributes no records.
    pub fn extract_all(
        &self,
        sources: &[SourceFile],
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
    ) -> Result<ExtractionOutcome> {
        let mut progress = ExtractionProgress::new(sources.len());
        let mut records = Vec::new();

        for source in sources {
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            match self.extract_source(source) {
                Ok(extracted) => {
                    debug!(
                        "{} contributed {} records",
                        source.display_path(),
                        extracted.len()
                    );
                    progress.update_file(source, extracted.len());
                    records.extend(extracted);
                }
                Err(e) if self.policy == ErrorPolicy::SkipInvalid && e.is_source_error() => {
                    warn!("Skipping {}: {}", source.display_path(), e);
                    progress.add_error(format!("Skipped {}: {}", source.display_path(), e));
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(ExtractionOutcome { records, progress })
    }

    fn extract_source(&self, source: &SourceFile) -> Result<RecordSet> {
        match self.extractors.get(&source.format) {
            Some(extractor) => extractor.extract(&source.path),
            None => extractor_for(source.format).extract(&source.path),
        }
    }
}

impl Default for ExtractionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::record::Record;
    use std::cell::Cell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn source(dir: &TempDir, name: &str, content: &str) -> SourceFile {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        SourceFile::from_path(&path).unwrap()
    }

    #[test]
    fn test_concatenates_in_source_order() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            source(&dir, "a.csv", "name,height,weight\nX,1,2\nY,3,4\n"),
            source(
                &dir,
                "b.xml",
                "<data><p><name>Z</name><height>5</height><weight>6</weight></p></data>",
            ),
        ];

        let outcome = ExtractionCoordinator::new()
            .extract_all(&sources, None)
            .unwrap();

        let names: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["X", "Y", "Z"]);
        assert_eq!(outcome.progress.files_processed, 2);
        assert_eq!(outcome.progress.records_extracted, 3);
        assert_eq!(outcome.progress.sources[0].records, 2);
        assert_eq!(outcome.progress.sources[1].format, SourceFormat::Markup);
    }

    #[test]
    fn test_no_sources_yields_empty_set() {
        let outcome = ExtractionCoordinator::new().extract_all(&[], None).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.progress.files_processed, 0);
    }

    #[test]
    fn test_fail_fast_discards_partial_results() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            source(&dir, "good.csv", "name,height,weight\nX,1,2\n"),
            source(&dir, "bad.xml", "<data><p><name>Z</name></p></data>"),
        ];

        let result = ExtractionCoordinator::new().extract_all(&sources, None);
        assert!(matches!(result, Err(EtlError::MissingField { .. })));
    }

    #[test]
    fn test_skip_invalid_continues_past_bad_file() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            source(&dir, "good.csv", "name,height,weight\nX,1,2\n"),
            source(&dir, "bad.json", "not json\n"),
            source(
                &dir,
                "good.xml",
                "<data><p><name>Z</name><height>5</height><weight>6</weight></p></data>",
            ),
        ];

        let outcome = ExtractionCoordinator::new()
            .with_policy(ErrorPolicy::SkipInvalid)
            .extract_all(&sources, None)
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.progress.errors.len(), 1);
        assert!(outcome.progress.errors[0].contains("bad.json"));
        assert_eq!(outcome.progress.files_processed, 3);
    }

    #[test]
    fn test_progress_callback_is_invoked() {
        let dir = TempDir::new().unwrap();
        let sources = vec![source(&dir, "a.csv", "name,height,weight\nX,1,2\n")];
        let calls = Cell::new(0);

        let callback = |_: &ExtractionProgress| calls.set(calls.get() + 1);
        ExtractionCoordinator::new()
            .extract_all(&sources, Some(&callback))
            .unwrap();

        assert_eq!(calls.get(), 2);
    }

    struct FixedExtractor;

    impl RecordExtractor for FixedExtractor {
        fn format(&self) -> SourceFormat {
            SourceFormat::LineDelimited
        }

        fn extract(&self, _path: &Path) -> Result<RecordSet> {
            Ok(vec![Record::new("stub", 1.0, 1.0)])
        }
    }

    #[test]
    fn test_custom_extractor_replaces_default() {
        let sources = vec![SourceFile::new(
            PathBuf::from("missing.json"),
            PathBuf::from("missing.json"),
            SourceFormat::LineDelimited,
            0,
        )];

        let outcome = ExtractionCoordinator::new()
            .with_extractor(Box::new(FixedExtractor))
            .extract_all(&sources, None)
            .unwrap();

        assert_eq!(outcome.records, vec![Record::new("stub", 1.0, 1.0)]);
    }
}
