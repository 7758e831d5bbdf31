use crate::config::InputConfig;
use crate::error::{EtlError, Result};
use crate::scanner::file_filter::FileFilter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Supported source formats, declared in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// CSV with a `name,height,weight` header row.
    Tabular,
    /// One JSON object per line.
    LineDelimited,
    /// XML, one child element of the root per record.
    Markup,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::Tabular,
        SourceFormat::LineDelimited,
        SourceFormat::Markup,
    ];

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "csv" => Some(SourceFormat::Tabular),
            "json" => Some(SourceFormat::LineDelimited),
            "xml" => Some(SourceFormat::Markup),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Tabular => "csv",
            SourceFormat::LineDelimited => "json",
            SourceFormat::Markup => "xml",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    pub format: SourceFormat,
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: PathBuf, relative_path: PathBuf, format: SourceFormat, size: u64) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            path,
            relative_path,
            filename,
            format,
            size,
        }
    }

    /// Build a source from a path given on the command line.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path).ok_or_else(|| EtlError::InvalidPath {
            path: format!(
                "{} does not have a supported extension (csv, json, xml)",
                path.display()
            ),
        })?;
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Ok(Self::new(path.to_path_buf(), path.to_path_buf(), format, size))
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

pub struct SourceScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl SourceScanner {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.max_depth,
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Find every source file under `root`.
    ///
    /// Results are grouped by format (csv, then json, then xml) and sorted by
    /// relative path inside each group, so two scans of the same directory
    /// always extract in the same order. An empty result is not an error.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<SourceFile>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(EtlError::InvalidPath {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(EtlError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut sources = Vec::new();

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry during scan: {}", err);
                    continue;
                }
            };

            // Follows symlinks, unlike the walk itself
            if entry.path().is_file() {
                if let Some(source) = self.process_file(&entry, root_path) {
                    sources.push(source);
                }
            }
        }

        sources.sort_by(|a, b| {
            a.format
                .cmp(&b.format)
                .then_with(|| a.relative_path.cmp(&b.relative_path))
        });

        debug!(
            "Found {} source files in {}",
            sources.len(),
            root_path.display()
        );

        Ok(sources)
    }

    /// Order an explicit list of paths for extraction.
    ///
    /// Files are grouped by format like a directory scan, but keep the order
    /// they were given in within each group.
    pub fn from_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<SourceFile>> {
        let mut sources = paths
            .iter()
            .map(SourceFile::from_path)
            .collect::<Result<Vec<_>>>()?;

        sources.sort_by_key(|s| s.format);
        Ok(sources)
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        if entry.file_type().is_dir() && entry.depth() > 0 {
            return self.filter.should_traverse_directory(entry.path());
        }
        true
    }

    fn process_file(&self, entry: &DirEntry, root_path: &Path) -> Option<SourceFile> {
        let path = entry.path();
        let format = self.filter.source_format(path)?;

        let size = match path.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("Cannot read metadata for {}: {}", path.display(), err);
                0
            }
        };

        let relative_path = path
            .strip_prefix(root_path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf());

        Some(SourceFile::new(
            path.to_path_buf(),
            relative_path,
            format,
            size,
        ))
    }

    pub fn get_statistics(&self, sources: &[SourceFile]) -> ScanStatistics {
        let mut files_by_format = BTreeMap::new();
        for source in sources {
            *files_by_format.entry(source.format).or_insert(0) += 1;
        }

        ScanStatistics {
            total_files: sources.len(),
            total_size: sources.iter().map(|s| s.size).sum(),
            files_by_format,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_format: BTreeMap<SourceFormat, usize>,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Total files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if !self.files_by_format.is_empty() {
            summary.push_str("  Files by format:\n");
            for (format, count) in &self.files_by_format {
                summary.push_str(&format!("    {}: {} files\n", format, count));
            }
        }

        summary
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
