//! Error types for DeepCheck

use thiserror::Error;

/// Main error type for analysis and transport operations
#[derive(Error, Debug)]
pub enum DeepCheckError {
    /// The backend answered with a non-2xx status
    #[error("HTTP error! status: {status}")]
    Http {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body, if any was readable
        body: String,
    },

    /// The request never produced a response
    #[error("Network error: {source}")]
    Network {
        /// Underlying transport error
        #[from]
        source: reqwest::Error,
    },

    /// The backend processed the request and reported failure
    #[error("{message}")]
    Backend {
        /// Message reported by the backend (or a default)
        message: String,
    },

    /// The backend reported success but the payload is unusable
    #[error("Invalid response from analysis service: {reason}")]
    InvalidResponse {
        /// What was wrong with the payload
        reason: String,
    },

    /// A data-URI could not be parsed
    #[error("Invalid data URI: {reason}")]
    InvalidDataUri {
        /// Parse failure reason
        reason: String,
    },

    /// Reading a media file failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

/// Result type alias for DeepCheck operations
pub type DeepCheckResult<T> = Result<T, DeepCheckError>;

impl DeepCheckError {
    /// Build a backend failure, substituting `default` for a missing message
    pub fn backend(message: Option<String>, default: &str) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default.to_string());
        DeepCheckError::Backend { message }
    }

    /// Check if the caller may reasonably try the same request again
    pub fn is_recoverable(&self) -> bool {
        match self {
            DeepCheckError::Http { status, .. } => *status >= 500,
            DeepCheckError::Network { .. } => true,
            DeepCheckError::Io { .. } => true,
            DeepCheckError::Backend { .. } => false,
            DeepCheckError::InvalidResponse { .. } => false,
            DeepCheckError::InvalidDataUri { .. } => false,
            DeepCheckError::Configuration { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeepCheckError::Http { .. } | DeepCheckError::Network { .. } => ErrorCategory::Network,
            DeepCheckError::Backend { .. } | DeepCheckError::InvalidResponse { .. } => {
                ErrorCategory::Backend
            }
            DeepCheckError::InvalidDataUri { .. } => ErrorCategory::Format,
            DeepCheckError::Io { .. } => ErrorCategory::System,
            DeepCheckError::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failures and non-2xx statuses
    Network,
    /// Failures reported by, or attributable to, the analysis backend
    Backend,
    /// Malformed media encodings
    Format,
    /// System-level errors (I/O)
    System,
    /// Configuration and parameter errors
    Configuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_mentions_status() {
        let error = DeepCheckError::Http {
            status: 500,
            body: String::new(),
        };
        assert!(error.to_string().contains("500"));
        assert_eq!(error.category(), ErrorCategory::Network);
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_backend_default_message() {
        let error = DeepCheckError::backend(None, "Analysis failed");
        assert_eq!(error.to_string(), "Analysis failed");

        let error = DeepCheckError::backend(Some("  ".to_string()), "Analysis failed");
        assert_eq!(error.to_string(), "Analysis failed");

        let error = DeepCheckError::backend(Some("bad image".to_string()), "Analysis failed");
        assert_eq!(error.to_string(), "bad image");
        assert!(!error.is_recoverable());
    }
}
