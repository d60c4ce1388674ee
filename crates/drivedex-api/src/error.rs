use std::fmt;

/// Result type for drivedex-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the API layer
#[derive(Debug)]
pub enum Error {
    /// Transport-level failure (connection, TLS, timeout, decode)
    Http(reqwest::Error),

    /// Drive answered with a non-success status
    Api { status: u16, message: String },

    /// Request URL could not be built
    Url(url::ParseError),

    /// Response payload violated a shape the pipeline depends on
    Shape(String),
}

impl Error {
    /// Authorization failures downgrade a single file to forbidden instead
    /// of aborting the batch
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "HTTP error: {}", err),
            Error::Api { status, message } => {
                write!(f, "Drive API error (status {}): {}", status, message)
            }
            Error::Url(err) => write!(f, "URL error: {}", err),
            Error::Shape(msg) => write!(f, "Unexpected response shape: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Url(err) => Some(err),
            Error::Api { .. } | Error::Shape(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Url(err)
    }
}
