//! Breaker interceptor for streaming calls.
//!
//! Only stream establishment goes through the breaker. Messages sent or
//! received on the returned stream are not observed.

use std::future::Future;
use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::breaker::Breaker;
use crate::config::BreakerInterceptorConfig;
use crate::context::CallContext;
use crate::error::CallError;
use crate::guard;

/// Shape of a streaming method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDesc {
    pub stream_name: &'static str,
    /// The client sends a stream of messages.
    pub client_streams: bool,
    /// The server replies with a stream of messages.
    pub server_streams: bool,
}

impl StreamDesc {
    #[must_use]
    pub const fn server_streaming(stream_name: &'static str) -> Self {
        Self {
            stream_name,
            client_streams: false,
            server_streams: true,
        }
    }

    #[must_use]
    pub const fn client_streaming(stream_name: &'static str) -> Self {
        Self {
            stream_name,
            client_streams: true,
            server_streams: false,
        }
    }

    #[must_use]
    pub const fn bidi_streaming(stream_name: &'static str) -> Self {
        Self {
            stream_name,
            client_streams: true,
            server_streams: true,
        }
    }
}

/// Wraps stream establishment in a [`Breaker`].
pub struct StreamClientInterceptor<B: ?Sized> {
    breaker: Arc<B>,
    config: Arc<BreakerInterceptorConfig>,
}

impl<B: ?Sized> Clone for StreamClientInterceptor<B> {
    fn clone(&self) -> Self {
        Self {
            breaker: Arc::clone(&self.breaker),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for StreamClientInterceptor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClientInterceptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build a stream interceptor that submits every stream establishment to `breaker`.
#[must_use]
pub fn stream_client_interceptor<B: Breaker + ?Sized>(
    breaker: Arc<B>,
) -> StreamClientInterceptor<B> {
    StreamClientInterceptor::new(breaker)
}

impl<B: Breaker + ?Sized> StreamClientInterceptor<B> {
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

    /// Establish one stream through the breaker.
    ///
    /// `streamer` opens the real stream; it runs only if the breaker admits
    /// the call. The handle it yields (for tonic, a `Response<Streaming<T>>`)
    /// is returned to the caller untouched.
    ///
    /// Returns `Ok(None)` when establishment failed with a non-tripping status:
    /// the breaker saw a success, so there is no error to report and no stream
    /// to hand back.
    ///
    /// # Errors
    /// The tripping status passed through by the breaker, or the breaker's
    /// own rejection. No stream handle is returned in either case.
    pub async fn intercept<C, Req, S, F, Fut>(
        &self,
        ctx: &CallContext,
        desc: StreamDesc,
        conn: C,
        method: &'static str,
        request: Request<Req>,
        streamer: F,
    ) -> Result<Option<Response<S>>, CallError>
    where
        C: Send,
        Req: Send,
        S: Send,
        F: FnOnce(CallContext, StreamDesc, C, &'static str, Request<Req>) -> Fut + Send,
        Fut: Future<Output = Result<Response<S>, Status>> + Send,
    {
        let call_ctx = ctx.clone();
        guard::submit(
            self.breaker.as_ref(),
            &self.config,
            ctx,
            method,
            "stream",
            move || streamer(call_ctx, desc, conn, method, request),
        )
        .await
    }
}
