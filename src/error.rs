use thiserror::Error;

/// Failure kinds surfaced by the catalog client and the favorites store.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Parse(_) => "parse",
            Error::Storage(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
