use reqwest::StatusCode;
use thiserror::Error;

use crate::db::StorageError;

/// Every way the login and guard paths can fail.
///
/// At the HTTP boundary all of these become the same generic 401; the variant and its detail are
/// only ever written to logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization code is missing")]
    MissingCode,
    #[error("provider reported `{error}`: {}", .description.as_deref().unwrap_or("no description"))]
    ProviderError {
        error: String,
        description: Option<String>,
    },
    #[error("provider rejected the request with status {status}: {detail}")]
    ProviderRejected { status: StatusCode, detail: String },
    #[error("provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("malformed provider response: {0}")]
    ProtocolError(String),
    #[error("token response is missing `{missing}`")]
    IncompleteToken { missing: &'static str },
    #[error("access token rejected by provider")]
    InvalidToken,
    #[error("user info has no `sub` claim")]
    MissingSubject,
    #[error("no session cookie present")]
    NoSession,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Stable label used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::ProviderError { .. } => "provider_error",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::Unreachable(_) => "unreachable",
            Self::ProtocolError(_) => "protocol_error",
            Self::IncompleteToken { .. } => "incomplete_token",
            Self::InvalidToken => "invalid_token",
            Self::MissingSubject => "missing_subject",
            Self::NoSession => "no_session",
            Self::Storage(_) => "storage_error",
        }
    }
}
