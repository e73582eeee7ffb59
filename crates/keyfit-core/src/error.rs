use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyFitError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Layout Error: {0}")]
    Layout(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Preference(#[from] PreferenceError),
}

/// Failure of a single backend round trip. Never fatal to the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Backend Error: {0}")]
    Backend(String),

    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("Gateway Closed")]
    Closed,

    #[error("Fetch Aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Preference IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed Preference: {0}")]
    Malformed(String),
}

pub type KfResult<T> = Result<T, KeyFitError>;
pub type GatewayResult<T> = Result<T, GatewayError>;
