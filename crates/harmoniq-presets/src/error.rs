use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the preset engine.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("no preset named `{0}`")]
    NotFound(String),
    #[error("failed to parse preset file {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("preset file {path:?} belongs to `{}`, expected `{expected}`", found.as_deref().unwrap_or("<none>"))]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: Option<String>,
    },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preset document cannot be written: {0}")]
    InvalidDocument(String),
}

impl PresetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure to convert a single property value to or from text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("{kind} value cannot be represented as text")]
    Unencodable { kind: String },
    #[error("`{text}` is not a valid {expected} value")]
    Invalid { text: String, expected: String },
}

/// Failure reported by a component when applying a property value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("unknown property `{0}`")]
    Unknown(String),
    #[error("property `{name}` expected {expected} value but received {actual}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("property `{name}` received value {value} outside of range {min}..={max}")]
    OutOfRange {
        name: String,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("property `{name}` received unknown choice `{value}`")]
    InvalidChoice { name: String, value: String },
    #[error("property `{0}` is not writable")]
    ReadOnly(String),
}

pub type Result<T, E = PresetError> = std::result::Result<T, E>;
