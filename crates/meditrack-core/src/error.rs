//! Core error types for meditrack-core.
//!
//! One `thiserror` enum per concern, gathered under [`CoreError`]. Validation
//! failures carry the named reason codes that the HTTP surface returns
//! verbatim, so callers can render them without string matching.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for meditrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential and sign-in errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Backend API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Date range validation errors
    #[error("Validation error: {0}")]
    Range(#[from] RangeError),

    /// Session payload validation errors
    #[error("Validation error: {0}")]
    Payload(#[from] PayloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored row could not be decoded
    #[error("Corrupt session row {session_id}: {message}")]
    CorruptRow { session_id: String, message: String },

    /// The record violates a store invariant and was not written
    #[error("Rejected session: {0}")]
    Rejected(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dotted key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Credential, sign-in and allow-list errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No bearer token on the request, or no token stored locally
    #[error("Authentication required")]
    MissingToken,

    /// Token is malformed or its signature does not verify
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    /// The identity provider rejected the credential
    #[error("{0}")]
    SignInFailed(String),

    /// Signed in, but the provider returned no email address
    #[error("Access denied. User email not available.")]
    EmailUnavailable,

    /// The allow-list is empty or unset, which denies everyone
    #[error("Access denied. Application not configured for sign-ups at this time.")]
    AllowListNotConfigured,

    /// Email is not on the allow-list
    #[error("Access denied. This email address is not authorized to use this application.")]
    NotAllowListed { email: String },

    /// OS keyring failure
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// The identity provider could not be reached or answered garbage
    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Backend API (HTTP) errors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or protocol failure before a response arrived
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("server returned {status}{}", .body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
    Status { status: u16, body: Option<String> },

    /// Base URL or endpoint could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Success status but the body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// The `message` (or `error`) field of a JSON error body.
    pub fn server_message(&self) -> Option<String> {
        let body: serde_json::Value = serde_json::from_str(self.body()?).ok()?;
        body.get("message")
            .or_else(|| body.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Date range validation failures, in the order they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Start date is required and must be a string.")]
    StartDateMissing,

    #[error("Start date must be a valid ISO date string.")]
    StartDateInvalid,

    #[error("End date is required and must be a string.")]
    EndDateMissing,

    #[error("End date must be a valid ISO date string.")]
    EndDateInvalid,

    #[error("End date must be after start date.")]
    EndDateBeforeStartDate,

    #[error("Date range cannot exceed {max_days} days.")]
    DateRangeTooLarge { max_days: u32 },
}

impl RangeError {
    /// Wire reason code, e.g. `startDate.missing`.
    pub fn code(&self) -> &'static str {
        match self {
            RangeError::StartDateMissing => "startDate.missing",
            RangeError::StartDateInvalid => "startDate.invalid",
            RangeError::EndDateMissing => "endDate.missing",
            RangeError::EndDateInvalid => "endDate.invalid",
            RangeError::EndDateBeforeStartDate => "endDate.beforeStartDate",
            RangeError::DateRangeTooLarge { .. } => "dateRange.tooLarge",
        }
    }
}

/// Session payload validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid session data: session_start_time is required and must be a valid ISO string.")]
    StartTimeInvalid,

    #[error("Invalid session data: duration_seconds is required and must be a positive number.")]
    DurationInvalid,
}

impl PayloadError {
    pub fn code(&self) -> &'static str {
        match self {
            PayloadError::StartTimeInvalid => "sessionStartTime.invalid",
            PayloadError::DurationInvalid => "durationSeconds.invalid",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<keyring::Error> for AuthError {
    fn from(err: keyring::Error) -> Self {
        AuthError::Keyring(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
