use crate::error::{EtlError, Result};
use crate::record::Record;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes records to a CSV file, replacing whatever was there.
pub struct CsvLoader {
    include_index: bool,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self {
            include_index: true,
        }
    }

    /// Prefix every row with its 0-based position under an unnamed header
    /// column, the layout `,name,height,weight` consumers already expect.
    pub fn with_index(mut self, include_index: bool) -> Self {
        self.include_index = include_index;
        self
    }

    /// Write `records` to `target`. Returns the number of data rows written.
    pub fn load(&self, records: &[Record], target: &Path) -> Result<usize> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| EtlError::file_access(parent, e))?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(target)
            .map_err(|e| csv_error(target, e))?;

        let header = if self.include_index {
            writer.write_record(["", "name", "height", "weight"])
        } else {
            writer.write_record(["name", "height", "weight"])
        };
        header.map_err(|e| csv_error(target, e))?;

        for (index, record) in records.iter().enumerate() {
            let row = if self.include_index {
                writer.serialize((index, &record.name, record.height, record.weight))
            } else {
                writer.serialize((&record.name, record.height, record.weight))
            };
            row.map_err(|e| csv_error(target, e))?;
        }

        writer
            .flush()
            .map_err(|e| EtlError::file_access(target, e))?;

        debug!("Wrote {} rows to {}", records.len(), target.display());
        Ok(records.len())
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, error: csv::Error) -> EtlError {
    let message = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(source) => EtlError::file_access(path, source),
        _ => EtlError::format(path, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_index_column_by_default() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("transformed_data.csv");
        let records = vec![Record::new("A", 1.78, 68.04), Record::new("B", 1.5, 70.0)];

        let written = CsvLoader::new().load(&records, &target).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            ",name,height,weight\n0,A,1.78,68.04\n1,B,1.5,70.0\n"
        );
    }

    #[test]
    fn test_without_index_column() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        CsvLoader::new()
            .with_index(false)
            .load(&[Record::new("Tom, Jr.", 1.8, 80.5)], &target)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "name,height,weight\n\"Tom, Jr.\",1.8,80.5\n"
        );
    }

    #[test]
    fn test_empty_set_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        CsvLoader::new().load(&[], &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), ",name,height,weight\n");
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");
        fs::write(&target, "stale content that is much longer than the new file\n").unwrap();

        CsvLoader::new()
            .load(&[Record::new("A", 1.0, 2.0)], &target)
            .unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            ",name,height,weight\n0,A,1.0,2.0\n"
        );
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("out.csv");

        CsvLoader::new().load(&[], &target).unwrap();
        assert!(target.exists());
    }

    #[test]
    fn test_unwritable_target_is_access_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a file
        let err = CsvLoader::new().load(&[], dir.path()).unwrap_err();
        assert!(matches!(err, EtlError::FileAccess { .. }));
    }
}
