use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network unreachable: {0}")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cache storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Why a single manifest entry could not be precached
#[derive(Error, Debug)]
pub enum PrecacheError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Bad status {0}")]
    Status(u16),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Worker origin {worker} is outside registration scope {scope}")]
    ScopeMismatch { scope: String, worker: String },

    #[error("Unknown client: {0}")]
    UnknownClient(u64),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
