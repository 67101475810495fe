//! Harness error type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path}: {source}")]
    Fixture {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no fixture JSON files found in {0}")]
    NoFixtures(PathBuf),
    #[error("case '{case}': invalid inputs: {source}")]
    Inputs {
        case: String,
        source: serde_json::Error,
    },
    #[error("unknown printf function '{0}'")]
    UnknownFunction(String),
    #[error("unknown rounding mode '{0}'")]
    UnknownMode(String),
    #[error("unknown charset '{0}'")]
    UnknownCharset(String),
}
