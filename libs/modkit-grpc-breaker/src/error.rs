//! Errors surfaced by the breaker interceptors.

use thiserror::Error;
use tonic::{Code, Status};

/// Error returned by an intercepted call.
///
/// The value is exactly what the [`crate::Breaker`] returned: either the
/// policy-relevant status produced by the real call and passed through by the
/// breaker, or the breaker's own rejection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CallError {
    /// The call ran and failed with a status that counts against the breaker.
    #[error("rpc error: code = {} desc = {}", code_name(.0.code()), .0.message())]
    Status(#[from] Status),

    /// The breaker declined the call or replaced its failure with its own error.
    #[error("{0}")]
    Rejected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Canonical gRPC name of a status code, as printed in `rpc error: ...` strings.
fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
    }
}

impl CallError {
    /// Build a rejection carrying a plain message.
    pub fn rejected(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Rejected(message.into())
    }

    /// Returns the underlying gRPC status if the call itself failed.
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::Status(status) => Some(status),
            Self::Rejected(_) => None,
        }
    }

    /// Returns `true` if the breaker produced this error rather than the call.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Status(status) => status,
            CallError::Rejected(reason) => Status::unavailable(reason.to_string()),
        }
    }
}
