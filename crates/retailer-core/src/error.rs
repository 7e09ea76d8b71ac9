use thiserror::Error;

use crate::store::PostId;

#[derive(Error, Debug)]
pub enum RetailerError {
    // JSON/parsing errors
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid pseudo ID: {0}")]
    InvalidPseudoId(String),

    // Store errors
    #[error("Solution not found: post #{id}")]
    SolutionNotFound { id: PostId },

    #[error("Purchased solution not found: #{id}")]
    PurchasedSolutionNotFound { id: PostId },

    // Naming errors
    #[error("Invalid vendor \"{vendor}\": {reason}")]
    InvalidVendor { vendor: String, reason: String },

    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    // Network errors
    #[error("HTTP error: {0}")]
    Http(#[from] crate::http::HttpError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RetailerError>;
