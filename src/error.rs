use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Credentials were rejected by the cloud service.
    Authentication(String),
    /// Transport or API failure reported by the device client.
    Communication(String),
    /// Setup aborted because the credentials no longer authenticate.
    AuthFailed(String),
    /// A coordinator refresh did not produce a snapshot.
    UpdateFailed(String),
    /// Push notification subscription could not be started.
    Monitoring(String),
    InvalidMode(String),
    InvalidConfig(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Authentication(_) | Error::AuthFailed(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "authentication error: {msg}"),
            Error::Communication(msg) => write!(f, "communication error: {msg}"),
            Error::AuthFailed(msg) => write!(f, "authentication failed: {msg}"),
            Error::UpdateFailed(msg) => write!(f, "error communicating with API: {msg}"),
            Error::Monitoring(msg) => write!(f, "monitoring error: {msg}"),
            Error::InvalidMode(mode) => write!(f, "invalid mode: {mode}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
