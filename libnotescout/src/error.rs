//! Error types for Notescout

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScoutError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ScoutError::InvalidInput(_) | ScoutError::MalformedInput(_) => 3,
            ScoutError::Collaborator(CollaboratorError::Api { status, .. })
                if *status == 401 || *status == 403 =>
            {
                2
            }
            ScoutError::Collaborator(_) => 1,
            ScoutError::IdentityNotFound(_) => 1,
            ScoutError::Config(_) | ScoutError::Serialization(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failure reported by the platform boundary (gateway or mock)
#[derive(Error, Debug, Clone)]
pub enum CollaboratorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        CollaboratorError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Parse(err.to_string())
    }
}
