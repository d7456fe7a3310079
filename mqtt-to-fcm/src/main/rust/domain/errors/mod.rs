use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a bearer credential from the identity provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    #[error("Token endpoint rejected assertion (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

/// Failure to hand a notification to the push gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Push gateway unreachable: {0}")]
    Transport(String),

    #[error("Push gateway rejected message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Startup configuration problem. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing mandatory parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Bus client failure: {0}")]
    Bus(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
