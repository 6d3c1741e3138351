//! Error types for flextk-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flextk-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for flextk-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Configuration file exists but is not a regular JSON file
    #[error("Configuration path is not a JSON file: {0}")]
    ConfigNotAFile(PathBuf),

    /// No password has been set yet
    #[error("Password is not set to perform this operation")]
    PasswordNotSet,

    /// Password does not match the stored sentinel
    #[error("Invalid password for configuration")]
    InvalidPassword,

    /// A service has no stored configuration
    #[error("{0} not configured properly. Please reconfigure.")]
    NotConfigured(String),

    /// Bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// GCS operation errors
    #[error("GCS operation failed: {0}")]
    GcsOperation(String),

    /// Backblaze B2 API errors
    #[error("B2 API error: {0}")]
    B2Api(String),

    /// AWS S3 operation errors
    #[error("S3 operation failed: {0}")]
    S3Operation(String),

    /// AWS credentials are missing or malformed
    #[error("AWS credentials are malformed or missing")]
    NoCredentials,

    /// Google Drive API errors
    #[error("Google Drive API error: {0}")]
    DriveApi(String),

    /// Firebase Auth API errors
    #[error("Firebase API error: {0}")]
    FirebaseApi(String),

    /// Keycloak API errors
    #[error("Keycloak error: {0}")]
    Keycloak(String),

    /// Stripe API errors
    #[error("Stripe API error: {0}")]
    StripeApi(String),

    /// External tool is not installed
    #[error("{tool} is not installed. {hint}")]
    ToolMissing { tool: String, hint: String },

    /// External tool exited with a failure
    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT signing error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<aws_sdk_s3::Error> for Error {
    fn from(err: aws_sdk_s3::Error) -> Self {
        Error::S3Operation(err.to_string())
    }
}

// Generic SdkError conversion for all S3 operations. Display on SdkError
// alone is opaque, so render the full source chain.
impl<E> From<aws_sdk_s3::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_s3::error::SdkError<E>) -> Self {
        Error::S3Operation(aws_sdk_s3::error::DisplayErrorContext(&err).to_string())
    }
}

// ByteStreamError conversion
impl From<aws_sdk_s3::primitives::ByteStreamError> for Error {
    fn from(err: aws_sdk_s3::primitives::ByteStreamError) -> Self {
        Error::S3Operation(err.to_string())
    }
}
