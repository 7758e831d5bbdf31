use crate::error::{EtlError, Result};
use crate::extractor::RecordExtractor;
use crate::record::{Record, RecordSet};
use crate::scanner::SourceFormat;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Reads files holding one JSON object per line. Blank lines are skipped.
#[derive(Debug, Default)]
pub struct LineDelimitedExtractor;

impl LineDelimitedExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl RecordExtractor for LineDelimitedExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::LineDelimited
    }

    fn extract(&self, path: &Path) -> Result<RecordSet> {
        let file = fs::File::open(path).map_err(|e| EtlError::file_access(path, e))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| EtlError::file_access(path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            let record: Record = serde_json::from_str(&line)
                .map_err(|e| EtlError::format(path, format!("line {}: {}", idx + 1, e)))?;
            records.push(record);
        }

        debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_one_record_per_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source1.json");
        fs::write(
            &path,
            "{\"name\":\"jack\",\"height\":68.7,\"weight\":123.3}\n\
             {\"name\":\"tom\",\"height\":69,\"weight\":153}\n",
        )
        .unwrap();

        let records = LineDelimitedExtractor::new().extract(&path).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("jack", 68.7, 123.3),
                Record::new("tom", 69.0, 153.0),
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gaps.json");
        fs::write(
            &path,
            "\n{\"name\":\"a\",\"height\":1,\"weight\":2}\n   \n{\"name\":\"b\",\"height\":3,\"weight\":4}\n\n",
        )
        .unwrap();

        let records = LineDelimitedExtractor::new().extract(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "b");
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            "{\"name\":\"a\",\"height\":1,\"weight\":2}\n{\"name\":\"b\",\"height\":3}\n",
        )
        .unwrap();

        let err = LineDelimitedExtractor::new().extract(&path).unwrap_err();
        match err {
            EtlError::Format { message, .. } => assert!(message.starts_with("line 2:")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_access_error() {
        let dir = TempDir::new().unwrap();
        let err = LineDelimitedExtractor::new()
            .extract(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, EtlError::FileAccess { .. }));
    }
}
