use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Error kind of failures reported while constructing or waiting on a [`crate::Client`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorKind {
    /// The given SDK key is empty or has an invalid format.
    InvalidSdkKey,
    /// Initialization of the internal [`reqwest::Client`] failed.
    HttpClientInitFailure,
    /// The client was not ready within the given time.
    ClientInitTimedOut,
}

/// Error that holds the [`ErrorKind`] and message of a construction-time failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ClientError {
    /// The kind of the failure.
    pub kind: ErrorKind,
    /// The text representation of the failure.
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: ErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// Outcome codes of a config refresh attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RefreshErrorCode {
    /// The refresh succeeded.
    None = 0,
    /// An unexpected error occurred during the refresh.
    UnexpectedError = 1,
    /// An HTTP response indicating an invalid SDK Key was received (403 Forbidden or 404 Not Found).
    InvalidSdkKey = 1100,
    /// Invalid HTTP response was received (unexpected HTTP status code).
    UnexpectedHttpResponse = 1101,
    /// The HTTP request timed out.
    HttpRequestTimeout = 1102,
    /// The HTTP request failed (most likely, due to a local network issue).
    HttpRequestFailure = 1103,
    /// An invalid HTTP response was received (200 OK with an invalid content).
    InvalidHttpResponseContent = 1105,
    /// An invalid HTTP response was received (304 Not Modified when no config JSON was cached locally).
    InvalidHttpResponseWhenLocalCacheIsEmpty = 1106,
    /// The client is in offline mode, it cannot initiate HTTP requests.
    OfflineClient = 3200,
    /// The client is configured with [`crate::OverrideBehavior::LocalOnly`], it cannot initiate HTTP requests.
    LocalOnlyClient = 3202,
}

impl RefreshErrorCode {
    pub(crate) fn event_id(&self) -> u16 {
        *self as u16
    }
}

/// Outcome codes of a feature flag evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum EvaluationErrorCode {
    /// The evaluation succeeded.
    #[default]
    None = 0,
    /// The config JSON was not available locally.
    ConfigJsonNotAvailable = 1000,
    /// The key of the evaluated setting was not found in the config JSON.
    SettingKeyMissing = 1001,
    /// The config JSON is malformed (invalid values, broken references, circular prerequisites).
    InvalidConfigModel = 1002,
    /// An unexpected error occurred during the evaluation.
    UnexpectedError = 2001,
    /// The setting's type doesn't match the requested type or the type of the default value.
    SettingValueTypeMismatch = 2002,
}

impl EvaluationErrorCode {
    pub(crate) fn event_id(&self) -> u16 {
        *self as u16
    }
}

/// Error reported by a failed evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EvaluationError {
    /// The reason of the failure.
    pub code: EvaluationErrorCode,
    /// The text representation of the failure.
    pub message: String,
}

impl EvaluationError {
    pub(crate) fn new(code: EvaluationErrorCode, message: String) -> Self {
        Self { code, message }
    }
}

/// Underlying cause of a failed refresh.
pub type ErrorCause = Arc<dyn Error + Send + Sync>;

/// The result of a config refresh attempt.
#[derive(Clone)]
pub struct RefreshResult {
    /// [`RefreshErrorCode::None`] when the refresh succeeded.
    pub error_code: RefreshErrorCode,
    /// The text representation of the failure.
    pub error_message: Option<String>,
    /// The error that caused the failure, if any.
    pub error_cause: Option<ErrorCause>,
}

impl RefreshResult {
    pub(crate) fn success() -> Self {
        Self {
            error_code: RefreshErrorCode::None,
            error_message: None,
            error_cause: None,
        }
    }

    pub(crate) fn failure(
        error_code: RefreshErrorCode,
        message: String,
        cause: Option<ErrorCause>,
    ) -> Self {
        Self {
            error_code,
            error_message: Some(message),
            error_cause: cause,
        }
    }

    /// Returns `true` when the refresh succeeded.
    pub fn is_success(&self) -> bool {
        self.error_code == RefreshErrorCode::None
    }
}

impl Debug for RefreshResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshResult")
            .field("error_code", &self.error_code)
            .field("error_message", &self.error_message)
            .field("error_cause", &self.error_cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}
