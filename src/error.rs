use thiserror::Error;

/// Failures a panel can hit while talking to its backend
#[derive(Debug, Error)]
pub enum PanelError {
    /// The request never completed (connection refused, timeout, ...)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{status} - {body}")]
    Status { status: u16, body: String },

    /// A 2xx body whose `status` field was not "success"
    #[error("{0}")]
    Server(String),

    /// The body could not be decoded into the expected shape
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;

impl PanelError {
    /// HTTP status carried by the error, if the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            PanelError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
