use crate::error::{EtlError, Result};
use crate::extractor::RecordExtractor;
use crate::record::{Record, RecordSet};
use crate::scanner::SourceFormat;
use std::path::Path;
use tracing::debug;

/// Reads CSV files with a `name,height,weight` header.
///
/// Columns are matched by header name, so their order does not matter and
/// extra columns are ignored.
#[derive(Debug, Default)]
pub struct TabularExtractor;

impl TabularExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl RecordExtractor for TabularExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Tabular
    }

    fn extract(&self, path: &Path) -> Result<RecordSet> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_error(path, None, e))?;

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<Record>().enumerate() {
            // Header is line 1
            let record = row.map_err(|e| csv_error(path, Some(idx + 2), e))?;
            records.push(record);
        }

        debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

fn csv_error(path: &Path, line: Option<usize>, error: csv::Error) -> EtlError {
    let message = match line {
        Some(line) => format!("line {}: {}", line, error),
        None => error.to_string(),
    };

    match error.into_kind() {
        csv::ErrorKind::Io(source) => EtlError::file_access(path, source),
        _ => EtlError::format(path, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reads_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "source1.csv",
            "name,height,weight\nalex,65.78,112.99\najay,71.52,136.49\nalice,69.4,153.03\n",
        );

        let records = TabularExtractor::new().extract(&path).unwrap();

        assert_eq!(
            records,
            vec![
                Record::new("alex", 65.78, 112.99),
                Record::new("ajay", 71.52, 136.49),
                Record::new("alice", 69.4, 153.03),
            ]
        );
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "shuffled.csv",
            "weight,id,name,height\n150, 7, A ,70\n",
        );

        let records = TabularExtractor::new().extract(&path).unwrap();
        assert_eq!(records, vec![Record::new("A", 70.0, 150.0)]);
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "empty.csv", "name,height,weight\n");

        assert!(TabularExtractor::new().extract(&path).unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_value_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "bad.csv", "name,height,weight\nalex,tall,112.99\n");

        let err = TabularExtractor::new().extract(&path).unwrap_err();
        match err {
            EtlError::Format { message, .. } => assert!(message.starts_with("line 2:")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "short.csv", "name,height\nalex,65.78\n");

        let err = TabularExtractor::new().extract(&path).unwrap_err();
        assert!(matches!(err, EtlError::Format { .. }));
    }

    #[test]
    fn test_missing_file_is_access_error() {
        let dir = TempDir::new().unwrap();
        let err = TabularExtractor::new()
            .extract(&dir.path().join("absent.csv"))
            .unwrap_err();
        assert!(matches!(err, EtlError::FileAccess { .. }));
    }
}
