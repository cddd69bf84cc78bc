//! Per-call cancellation and deadline carrier.
//!
//! [`CallContext`] is threaded explicitly through every boundary of an
//! intercepted call: the interceptor hands the same context to the breaker and
//! a clone of it to the real invoker. Cancelling the token (or letting the
//! deadline pass) is therefore observed identically on both sides.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Status};

const CANCELED_MESSAGE: &str = "context canceled";
const DEADLINE_EXCEEDED_MESSAGE: &str = "context deadline exceeded";

/// Cancellation token plus optional deadline for one outgoing call.
///
/// Cloning is cheap; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now, keeping an earlier existing deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline, keeping an earlier existing deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `Some(Duration::ZERO)` once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the status a call should fail with if the context is already done.
    ///
    /// # Errors
    /// `Cancelled` if the token fired, `DeadlineExceeded` if the deadline passed.
    pub fn check(&self) -> Result<(), Status> {
        if self.token.is_cancelled() {
            return Err(Status::cancelled(CANCELED_MESSAGE));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Status::deadline_exceeded(DEADLINE_EXCEEDED_MESSAGE));
        }
        Ok(())
    }

    /// Drive `call` until it completes, the context is cancelled, or the deadline passes.
    ///
    /// Invokers use this to honour the context the same way a transport would.
    ///
    /// # Errors
    /// The call's own status, or `Cancelled` / `DeadlineExceeded` when the
    /// context ends first.
    pub async fn run<F, T>(&self, call: F) -> Result<T, Status>
    where
        F: Future<Output = Result<T, Status>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Status::cancelled(CANCELED_MESSAGE)),
            () = expired => Err(Status::deadline_exceeded(DEADLINE_EXCEEDED_MESSAGE)),
            res = call => res,
        }
    }

    /// Propagate the remaining deadline to the server as the gRPC timeout.
    pub fn apply_to<T>(&self, request: &mut Request<T>) {
        if let Some(remaining) = self.remaining() {
            request.set_timeout(remaining);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn default_context_is_open_ended() {
        let ctx = CallContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = CallContext::new();
        let clone = ctx.clone();
        assert!(!clone.cancellation_token().is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.check().unwrap_err().code(), Code::Cancelled);
    }

    #[test]
    fn from_token_follows_parent_token() {
        let parent = CancellationToken::new();
        let ctx = CallContext::from_token(parent.child_token());
        assert!(!ctx.is_cancelled());
        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn earlier_deadline_wins() {
        let ctx = CallContext::new()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(60));
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(5));

        let tighter = ctx.clone().with_timeout(Duration::from_secs(1));
        assert!(tighter.remaining().unwrap() <= Duration::from_secs(1));

        let deadline = ctx.deadline().unwrap();
        let later = ctx.with_deadline(deadline + Duration::from_secs(10));
        assert_eq!(later.deadline(), Some(deadline));
    }

    #[test]
    fn expired_deadline_fails_check() {
        let ctx = CallContext::new().with_timeout(Duration::ZERO);
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        let status = ctx.check().unwrap_err();
        assert_eq!(status.code(), Code::DeadlineExceeded);
        assert_eq!(status.message(), "context deadline exceeded");
    }

    #[tokio::test]
    async fn run_returns_call_result() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        let res = ctx.run(async { Ok::<_, Status>(7) }).await;
        assert_eq!(res.unwrap(), 7);

        let res = ctx
            .run(async { Err::<(), _>(Status::internal("boom")) })
            .await;
        assert_eq!(res.unwrap_err().code(), Code::Internal);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let res = ctx
            .run(std::future::pending::<Result<(), Status>>())
            .await;
        let status = res.unwrap_err();
        assert_eq!(status.code(), Code::Cancelled);
        assert_eq!(status.message(), "context canceled");
    }

    #[tokio::test]
    async fn run_stops_at_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(10));
        let res = ctx
            .run(std::future::pending::<Result<(), Status>>())
            .await;
        assert_eq!(res.unwrap_err().code(), Code::DeadlineExceeded);
    }

    #[tokio::test]
    async fn run_does_not_start_when_already_cancelled() {
        let ctx = CallContext::new();
        ctx.cancel();
        let res = ctx.run(async { Ok::<_, Status>(()) }).await;
        assert_eq!(res.unwrap_err().code(), Code::Cancelled);
    }

    #[test]
    fn apply_to_sets_grpc_timeout_header() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(30));
        let mut request = Request::new(());
        ctx.apply_to(&mut request);
        assert!(request.metadata().get("grpc-timeout").is_some());

        let mut request = Request::new(());
        CallContext::new().apply_to(&mut request);
        assert!(request.metadata().get("grpc-timeout").is_none());
    }
}
