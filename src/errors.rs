use std::path::PathBuf;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Gmail API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Decoding of {part} failed: {source}")]
    Decode {
        part: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Auth expired for account")]
    AuthExpired,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
