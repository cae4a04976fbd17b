use thiserror::Error;

pub use sheetbase_core::StorageError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to format field {field}: {source}")]
    Format {
        field: String,
        #[source]
        source: time::error::Format,
    },
    #[error("invalid date pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Failures surfaced by entity repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("failed to {action} {entity}: {id}")]
    WriteFailed {
        action: &'static str,
        entity: &'static str,
        id: String,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Broad class of a repository failure, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Invalid,
    NotFound,
    Internal,
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Validation(_) => ErrorKind::Invalid,
            RepositoryError::NotFound { .. } => ErrorKind::NotFound,
            RepositoryError::WriteFailed { .. } | RepositoryError::Table(_) => ErrorKind::Internal,
        }
    }
}

impl From<StorageError> for RepositoryError {
    fn from(e: StorageError) -> Self {
        RepositoryError::Table(TableError::Storage(e))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid listen address {0}")]
    ListenAddr(String),
    #[error("unknown storage backend {0:?}; expected \"memory\" or \"sqlite\"")]
    UnknownBackend(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
