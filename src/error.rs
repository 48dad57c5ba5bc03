//! Error types for backend calls and page commands
//!
//! Errors are classified by recoverability:
//! - Retryable: Network issues, timeouts
//! - NonRetryable: API rejections, bad input, storage faults
//! - RequiresUserAction: Missing session, missing profile, bad configuration

use thiserror::Error;

use crate::db::DbError;

/// Error type shared by the backends, services and page commands
#[derive(Debug, Error)]
pub enum DeskError {
    // Retryable errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // Non-retryable errors
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    // Requires user action
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Profile not found. Please contact your administrator.")]
    ProfileMissing,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl DeskError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeskError::Network(_) | DeskError::Timeout(_))
    }

    /// Returns true if this error requires user action to resolve
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            DeskError::NotAuthenticated
                | DeskError::ProfileMissing
                | DeskError::ConfigurationError(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DeskError::Network(_) => "Check your internet connection and try again.",
            DeskError::Timeout(_) => "The backend took too long to answer. Try again.",
            DeskError::Api { status, .. } if *status == 401 || *status == 403 => {
                "Your session may have expired. Run 'leaddesk login' again."
            }
            DeskError::Api { .. } => "The backend rejected the request. Check the values you entered.",
            DeskError::NotFound(_) => "Refresh the list; the record may have been removed.",
            DeskError::Validation(_) => "Fix the highlighted field and submit again.",
            DeskError::Storage(_) => "Check that the local database file is writable.",
            DeskError::ParseError(_) => "The backend answered in an unexpected format.",
            DeskError::IoError(_) => "Check file permissions and disk space.",
            DeskError::NotAuthenticated => "Run 'leaddesk login' to sign in.",
            DeskError::ProfileMissing => "Ask an administrator to create your profile.",
            DeskError::ConfigurationError(_) => "Check your configuration in ~/.leaddesk/config.json",
        }
    }

    /// Message shown inline on a page after a failed submit.
    pub fn inline_message(&self) -> String {
        format!("Error: {}", self)
    }
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::IoError(err.to_string())
    }
}

impl From<DbError> for DeskError {
    fn from(err: DbError) -> Self {
        DeskError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for DeskError {
    fn from(err: rusqlite::Error) -> Self {
        DeskError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DeskError::ParseError(err.to_string())
        } else {
            DeskError::Network(err.to_string())
        }
    }
}

/// Serializable error representation for the front end
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&DeskError> for ErrorView {
    fn from(err: &DeskError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        ErrorView {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
