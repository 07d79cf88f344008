use thiserror::Error;

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A manually entered record isn't `lat,lng,timestamp`
    #[error("can't parse {input:?} as lat,lng,timestamp: {reason}")]
    Parse { input: String, reason: String },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("reading waypoints failed: {0}")]
    Io(#[from] std::io::Error),
}
