// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Maps domain errors to specific exit codes for shell scripting

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No usable credentials: {0}. Run `granola-relay extract` on the machine with Granola installed")]
    MissingCredential(String),

    #[error("Refresh token rejected by the auth service ({0}). Re-extract credentials with `granola-relay extract`")]
    InvalidCredential(String),

    #[error("Token refresh failed after {attempts} attempts: {message}")]
    TransientAuth { attempts: u32, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Webhook delivery failed after {attempts} attempts (last status: {status:?})")]
    Delivery { status: Option<u16>, attempts: u32 },

    #[error("Another sync is already running: {0}")]
    Locked(String),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingCredential(_) | Error::InvalidCredential(_) => 2,
            Error::TransientAuth { .. } | Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Persistence(_) | Error::Filesystem(_) => 6,
            Error::Delivery { .. } => 7,
            Error::Locked(_) => 8,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
