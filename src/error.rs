use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DashError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => DashError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => DashError::Decode(err.to_string()),
            None => DashError::Network(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
