use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

/// Failures outside a single line's evaluation: session storage and
/// settings loading. Per-line failures never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported settings format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
