use std::fmt;

/// Result type for drivedex-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the service layer
#[derive(Debug)]
pub enum Error {
    /// Drive API layer error
    Api(drivedex_api::Error),

    /// Cache/index layer error
    Index(drivedex_index::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Snapshot file could not be written or read
    Snapshot(csv::Error),

    /// Configuration error
    Config(String),

    /// Invalid operation or state
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api(err) => write!(f, "API error: {}", err),
            Error::Index(err) => write!(f, "Cache error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Snapshot(err) => write!(f, "Snapshot error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Api(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Snapshot(err) => Some(err),
            Error::Config(_) | Error::InvalidOperation(_) => None,
        }
    }
}

impl From<drivedex_api::Error> for Error {
    fn from(err: drivedex_api::Error) -> Self {
        Error::Api(err)
    }
}

impl From<drivedex_index::Error> for Error {
    fn from(err: drivedex_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Snapshot(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
