use thiserror::Error;

/// Type alias for Result with MailError
pub type Result<T> = std::result::Result<T, MailError>;

/// Error types for the ingestion pipeline and its collaborators
#[derive(Error, Debug)]
pub enum MailError {
    /// Mail provider API returned an error
    #[error("Mail API error: {0}")]
    ApiError(String),

    /// Authentication failed - fatal to a run, never retried
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Rate limit exceeded - should retry after specified seconds
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Invalid message format or parsing error
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Completion backend (classification fallback / drafting) failure
    #[error("Completion backend error: {0}")]
    CompletionError(String),

    /// Message store failure
    #[error("Store error: {0}")]
    StoreError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MailError {
    /// Check if the error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MailError::RateLimitExceeded { .. }
                | MailError::ServerError { .. }
                | MailError::NetworkError(_)
        )
    }

    /// Check if the error is permanent and should not be retried
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

impl From<rusqlite::Error> for MailError {
    fn from(error: rusqlite::Error) -> Self {
        MailError::StoreError(error.to_string())
    }
}

/// Parse the Retry-After header from an HTTP response.
///
/// Only the delay-seconds form is honored; an absent or unparsable header
/// falls back to a 5 second default.
fn parse_retry_after_header<B>(response: &hyper::Response<B>) -> u64 {
    const DEFAULT_RETRY_AFTER: u64 = 5;

    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

impl From<google_gmail1::Error> for MailError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    // Rate limiting - transient
                    429 => {
                        let retry_after = parse_retry_after_header(response);
                        MailError::RateLimitExceeded { retry_after }
                    }
                    // Not found
                    404 => MailError::MessageNotFound("Resource not found".to_string()),
                    // Bad request
                    400 => MailError::BadRequest(message),
                    // Forbidden
                    403 => MailError::Forbidden(message),
                    // Server errors - transient
                    500..=599 => MailError::ServerError {
                        status: status_code,
                        message,
                    },
                    // Other non-success status codes
                    _ => MailError::ApiError(message),
                }
            }
            // BadRequest variant (request not understood by server)
            google_gmail1::Error::BadRequest(ref err) => MailError::BadRequest(format!("{}", err)),
            // Network/connection errors - transient
            google_gmail1::Error::HttpError(ref err) => {
                MailError::NetworkError(format!("Connection error: {}", err))
            }
            // IO errors - transient
            google_gmail1::Error::Io(err) => MailError::NetworkError(err.to_string()),
            // All other errors
            _ => MailError::ApiError(error.to_string()),
        }
    }
}
