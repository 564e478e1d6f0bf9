use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No configuration file exists at any of the probed locations.
    #[error("config not found: {0}")]
    NotFound(String),

    /// A required section is missing or malformed.
    #[error("failed to decode config: {0}")]
    Decode(String),

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("config root is not a JSON object: {0}")]
    NotAMapping(String),

    /// The patched document could not be committed to disk.
    #[error("failed to write config: {0}")]
    Write(String),

    /// A field-level edit that cannot be applied to the current document.
    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
