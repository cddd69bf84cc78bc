//! Submission of one real call to the breaker.
//!
//! Both interceptors funnel through [`submit`]: it packages the real call as a
//! [`UnitOfWork`], classifies its result, keeps the successful value in a slot
//! outside the unit of work and hands the unit to the breaker exactly once.
//!
//! Failures with a non-tripping code are reported to the breaker as success and
//! are then dropped: the caller receives `Ok(None)`. The breaker has no way to
//! say "failed, but don't count it", so the failure cannot be propagated without
//! also counting it.

use std::future::Future;

use tonic::Status;
use tracing::Instrument;

use crate::breaker::{Breaker, UnitOfWork};
use crate::classify::CallOutcome;
use crate::config::BreakerInterceptorConfig;
use crate::context::CallContext;
use crate::error::CallError;

/// Run `call` under `breaker` and map the verdict back to the caller.
///
/// # Errors
/// Whatever the breaker returns: the tripping status passed through, or its
/// own rejection.
pub async fn submit<B, F, Fut, T>(
    breaker: &B,
    config: &BreakerInterceptorConfig,
    ctx: &CallContext,
    method: &'static str,
    kind: &'static str,
    call: F,
) -> Result<Option<T>, CallError>
where
    B: Breaker + ?Sized,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, Status>> + Send,
    T: Send,
{
    let span = tracing::debug_span!(
        "grpc_breaker_call",
        service = config.service_name,
        method,
        kind,
    );

    async move {
        let mut slot: Option<T> = None;
        let mut outcome: Option<CallOutcome> = None;

        let work: UnitOfWork<'_> = Box::pin(async {
            let result = call().await;
            let classified = CallOutcome::of(&result, &config.tripping_codes);
            outcome = Some(classified);

            match result {
                Ok(value) => {
                    slot = Some(value);
                    Ok(())
                }
                Err(status) if classified.counts_against_breaker() => {
                    if config.enable_tracing {
                        tracing::warn!(
                            code = ?status.code(),
                            message = %status.message(),
                            method,
                            "gRPC call failed, reporting failure to breaker"
                        );
                    }
                    Err(status)
                }
                Err(status) => {
                    if config.enable_tracing {
                        tracing::debug!(
                            code = ?status.code(),
                            message = %status.message(),
                            method,
                            "gRPC call failed with non-tripping status, hidden from breaker"
                        );
                    }
                    Ok(())
                }
            }
        });

        let verdict = breaker.call(ctx, work).await;

        // No outcome means the breaker dropped the unit of work unpolled.
        if config.enable_tracing
            && outcome.is_none()
            && let Err(err) = &verdict
        {
            tracing::debug!(method, error = %err, "gRPC call rejected by breaker");
        }

        verdict.map(|()| slot)
    }
    .instrument(span)
    .await
}
