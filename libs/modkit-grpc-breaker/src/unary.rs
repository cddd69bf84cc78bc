//! Breaker interceptor for unary calls.

use std::future::Future;
use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::breaker::Breaker;
use crate::config::BreakerInterceptorConfig;
use crate::context::CallContext;
use crate::error::CallError;
use crate::guard;

/// Wraps single request / single response calls in a [`Breaker`].
pub struct UnaryClientInterceptor<B: ?Sized> {
    breaker: Arc<B>,
    config: Arc<BreakerInterceptorConfig>,
}

impl<B: ?Sized> Clone for UnaryClientInterceptor<B> {
    fn clone(&self) -> Self {
        Self {
            breaker: Arc::clone(&self.breaker),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for UnaryClientInterceptor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryClientInterceptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build a unary interceptor that submits every call to `breaker`.
#[must_use]
pub fn unary_client_interceptor<B: Breaker + ?Sized>(breaker: Arc<B>) -> UnaryClientInterceptor<B> {
    UnaryClientInterceptor::new(breaker)
}

impl<B: Breaker + ?Sized> UnaryClientInterceptor<B> {
    #[must_use]
    pub fn new(breaker: Arc<B>) -> Self {
        Self::with_config(breaker, BreakerInterceptorConfig::default())
    }

    #[must_use]
    pub fn with_config(breaker: Arc<B>, config: BreakerInterceptorConfig) -> Self {
        Self {
            breaker,
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BreakerInterceptorConfig {
        &self.config
    }

    /// Perform one unary call through the breaker.
    ///
    /// `invoker` is the real call. It receives a clone of `ctx`, the method
    /// path, the request (which carries the per-call options: metadata,
    /// timeout, extensions) and the connection handle, typically a cloned
    /// generated tonic client. It only runs if the breaker admits the call.
    ///
    /// Returns:
    /// - `Ok(Some(reply))` when the call succeeded;
    /// - `Ok(None)` when the call failed with a non-tripping status. The
    ///   breaker saw a success and the status is discarded;
    /// - `Err(_)` with whatever the breaker returned otherwise.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let reply = interceptor
    ///     .intercept(&ctx, "/users.Users/Get", Request::new(req), client.clone(), |_ctx, _method, req, mut c| async move {
    ///         c.get(req).await
    ///     })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    /// The tripping status passed through by the breaker, or the breaker's
    /// own rejection.
    pub async fn intercept<C, Req, Res, I, Fut>(
        &self,
        ctx: &CallContext,
        method: &'static str,
        request: Request<Req>,
        conn: C,
        invoker: I,
    ) -> Result<Option<Response<Res>>, CallError>
    where
        C: Send,
        Req: Send,
        Res: Send,
        I: FnOnce(CallContext, &'static str, Request<Req>, C) -> Fut + Send,
        Fut: Future<Output = Result<Response<Res>, Status>> + Send,
    {
        let call_ctx = ctx.clone();
        guard::submit(
            self.breaker.as_ref(),
            &self.config,
            ctx,
            method,
            "unary",
            move || invoker(call_ctx, method, request, conn),
        )
        .await
    }
}
