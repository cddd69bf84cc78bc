//! Outcome classification shared by the unary and stream interceptors.
//!
//! Only failures whose status code is one of the configured "tripping" codes
//! are reported to the breaker. By default that is [`Code::Internal`] alone:
//! server-side faults count, client-side faults (`InvalidArgument`,
//! `NotFound`, `PermissionDenied`, ...) do not.

use tonic::{Code, Status};

/// Codes reported to the breaker when no other set is configured.
pub const DEFAULT_TRIPPING_CODES: &[Code] = &[Code::Internal];

/// Terminal state of one intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The real call completed successfully.
    Succeeded,
    /// The real call failed with a tripping code; the breaker sees the failure.
    FailedRelevant,
    /// The real call failed with any other code; the breaker sees a success.
    FailedIrrelevant,
}

impl CallOutcome {
    /// Classify the result of a real call against the given tripping codes.
    #[must_use]
    pub fn of<T>(result: &Result<T, Status>, tripping_codes: &[Code]) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(status) if tripping_codes.contains(&status.code()) => Self::FailedRelevant,
            Err(_) => Self::FailedIrrelevant,
        }
    }

    /// Returns `true` if the breaker must observe this outcome as a failure.
    #[must_use]
    pub fn counts_against_breaker(self) -> bool {
        self == Self::FailedRelevant
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::FailedRelevant => write!(f, "failed-relevant"),
            Self::FailedIrrelevant => write!(f, "failed-irrelevant"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn success_is_succeeded() {
        let res: Result<(), Status> = Ok(());
        assert_eq!(
            CallOutcome::of(&res, DEFAULT_TRIPPING_CODES),
            CallOutcome::Succeeded
        );
    }

    #[test]
    fn internal_counts_against_breaker() {
        let res: Result<(), Status> = Err(Status::internal("fake error"));
        let outcome = CallOutcome::of(&res, DEFAULT_TRIPPING_CODES);
        assert_eq!(outcome, CallOutcome::FailedRelevant);
        assert!(outcome.counts_against_breaker());
    }

    #[test]
    fn client_side_codes_are_hidden_from_breaker() {
        let statuses = [
            Status::invalid_argument("bad"),
            Status::not_found("missing"),
            Status::permission_denied("nope"),
            Status::unavailable("down"),
            Status::deadline_exceeded("slow"),
            Status::cancelled("stop"),
            Status::unknown("transport"),
        ];

        for status in statuses {
            let res: Result<(), Status> = Err(status);
            let outcome = CallOutcome::of(&res, DEFAULT_TRIPPING_CODES);
            assert_eq!(outcome, CallOutcome::FailedIrrelevant);
            assert!(!outcome.counts_against_breaker());
        }
    }

    #[test]
    fn custom_tripping_codes_are_honoured() {
        let codes = [Code::Internal, Code::Unavailable];
        let res: Result<(), Status> = Err(Status::unavailable("down"));
        assert_eq!(CallOutcome::of(&res, &codes), CallOutcome::FailedRelevant);

        let res: Result<(), Status> = Err(Status::internal("boom"));
        assert_eq!(CallOutcome::of(&res, &[]), CallOutcome::FailedIrrelevant);
    }

    #[test]
    fn display_names() {
        assert_eq!(CallOutcome::Succeeded.to_string(), "succeeded");
        assert_eq!(CallOutcome::FailedRelevant.to_string(), "failed-relevant");
        assert_eq!(CallOutcome::FailedIrrelevant.to_string(), "failed-irrelevant");
    }
}
