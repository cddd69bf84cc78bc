//! The breaker capability consumed by the interceptors.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tonic::Status;

use crate::context::CallContext;
use crate::error::CallError;

/// One intercepted call, packaged as a not-yet-started future.
///
/// It resolves to `Err(status)` only when the real call failed in a way the
/// breaker must count. Dropping it without polling means the call never
/// happens.
pub type UnitOfWork<'a> = BoxFuture<'a, Result<(), Status>>;

/// Admission policy applied to every intercepted call.
///
/// Implementations decide whether to run `work` and what its result means for
/// their internal state. A conforming breaker either awaits `work` once and
/// returns (possibly a replacement for) its error, or rejects the call by
/// returning its own error without polling `work` at all.
///
/// The interceptors invoke `call` exactly once per intercepted call and never
/// inspect the breaker beyond that.
#[async_trait]
pub trait Breaker: Send + Sync {
    async fn call(&self, ctx: &CallContext, work: UnitOfWork<'_>) -> Result<(), CallError>;
}

#[async_trait]
impl<B: Breaker + ?Sized> Breaker for Arc<B> {
    async fn call(&self, ctx: &CallContext, work: UnitOfWork<'_>) -> Result<(), CallError> {
        (**self).call(ctx, work).await
    }
}
