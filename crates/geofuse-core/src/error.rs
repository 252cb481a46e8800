//! Error types for loading, matching and output

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Where a piece of input came from, for error context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk
    File(PathBuf),
    /// An in-memory string (tests, stdin)
    Inline,
}

impl InputSource {
    /// Source for a file path
    pub fn file(path: impl AsRef<Path>) -> Self {
        InputSource::File(path.as_ref().to_path_buf())
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::File(path) => write!(f, "{}", path.display()),
            InputSource::Inline => write!(f, "<inline>"),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(":{}", l)).unwrap_or_default()
}

/// Errors that can occur while fusing a log with a position track
#[derive(Error, Debug)]
pub enum GeoFuseError {
    #[error("{input}{}: {message}", line_suffix(.line))]
    MalformedInput {
        input: InputSource,
        line: Option<usize>,
        message: String,
    },

    #[error("{input}: record {record} is missing required field '{field}'")]
    MissingField {
        input: InputSource,
        record: usize,
        field: String,
    },

    #[error("{input}:{line}: sample is earlier than the one before it")]
    UnsortedInput { input: InputSource, line: usize },

    #[error("position track contains no samples")]
    EmptyPositionSequence,

    #[error("no points to compute a centroid from")]
    EmptyInput,

    #[error("Failed to encode output: {0}")]
    Serialization(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GeoFuseError {
    /// Stable name of the error kind, as printed by the CLI
    pub fn kind(&self) -> &'static str {
        match self {
            GeoFuseError::MalformedInput { .. } => "MalformedInputError",
            GeoFuseError::MissingField { .. } => "MissingFieldError",
            GeoFuseError::UnsortedInput { .. } => "UnsortedInputError",
            GeoFuseError::EmptyPositionSequence => "EmptyPositionSequenceError",
            GeoFuseError::EmptyInput => "EmptyInputError",
            GeoFuseError::Serialization(_) => "SerializationError",
            GeoFuseError::Io { .. } => "IoError",
            GeoFuseError::Config(_) => "ConfigError",
        }
    }

    pub(crate) fn malformed(
        input: &InputSource,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        GeoFuseError::MalformedInput {
            input: input.clone(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        GeoFuseError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Read a whole input file as text. Open/read failures are `Io`, bytes that
/// are not UTF-8 are `MalformedInput`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| GeoFuseError::io(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        GeoFuseError::malformed(
            &InputSource::file(path),
            None,
            format!("not valid UTF-8 ({})", e.utf8_error()),
        )
    })
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GeoFuseError>;
