use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Malformed source file {path}: {message}")]
    Format { path: String, message: String },

    #[error("Element {element} in {path} has no <{field}> field")]
    MissingField {
        path: String,
        element: usize,
        field: String,
    },

    #[error("Cannot access {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl EtlError {
    pub fn format<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        EtlError::Format {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn file_access<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        EtlError::FileAccess {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Errors that concern a single source file, as opposed to the run as a whole.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            EtlError::Format { .. } | EtlError::MissingField { .. } | EtlError::FileAccess { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for EtlError {
    fn user_message(&self) -> String {
        match self {
            EtlError::Format { path, message } => {
                format!("Could not parse {}: {}", path, message)
            }
            EtlError::MissingField {
                path,
                element,
                field,
            } => {
                format!(
                    "Record #{} in {} is missing the '{}' field",
                    element, path, field
                )
            }
            EtlError::FileAccess { path, source } => {
                format!("Cannot access {}: {}", path, source)
            }
            EtlError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            EtlError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            EtlError::Format { .. } => Some(
                "Check that the file has name, height and weight values and that height and weight are numbers. Use --skip-invalid to continue past bad files.".to_string()
            ),
            EtlError::MissingField { .. } => Some(
                "Every child of the XML root element needs <name>, <height> and <weight> elements. Use --skip-invalid to continue past bad files.".to_string()
            ),
            EtlError::FileAccess { .. } => Some(
                "Ensure you have the necessary read/write permissions for the input directory, output file and log file.".to_string()
            ),
            EtlError::InvalidPath { .. } => Some(
                "Point --dir at an existing directory, or list the source files with --input.".to_string()
            ),
            EtlError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
        }
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(error: toml::de::Error) -> Self {
        EtlError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
