use crate::config::InputConfig;
use crate::scanner::SourceFormat;
use regex::Regex;
use std::path::{Path, PathBuf};

pub struct FileFilter {
    exclude_patterns: Vec<Regex>,
    excluded_paths: Vec<PathBuf>,
}

impl FileFilter {
    pub fn new(config: &InputConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            exclude_patterns,
            excluded_paths: Vec::new(),
        }
    }

    /// Never treat `path` as a source, e.g. the output file of a previous run.
    pub fn with_excluded_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.excluded_paths.push(normalize(path.as_ref()));
        self
    }

    /// The format to read `path` as, or `None` when it is not a source file.
    pub fn source_format(&self, path: &Path) -> Option<SourceFormat> {
        let format = SourceFormat::from_path(path)?;

        // Hidden files
        if path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with('.'))
        {
            return None;
        }

        if self.is_excluded(path) {
            return None;
        }

        Some(format)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if let Some(filename) = path.file_name().and_then(|s| s.to_str()) {
            if self.matches_any_pattern(filename) {
                return true;
            }
        }

        if self.excluded_paths.is_empty() {
            return false;
        }

        let candidate = normalize(path);
        self.excluded_paths.iter().any(|p| *p == candidate)
    }

    pub fn should_traverse_directory(&self, path: &Path) -> bool {
        if let Some(dir_name) = path.file_name().and_then(|s| s.to_str()) {
            // Hidden directories
            if dir_name.starts_with('.') && dir_name != "." && dir_name != ".." {
                return false;
            }

            if self.matches_any_pattern(dir_name) {
                return false;
            }
        }

        true
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
