use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error("schema migration failed: {0}")]
    Migration(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
