#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Circuit-breaker interceptors for gRPC clients.
//!
//! The crate does not implement a breaker. It defines the [`Breaker`]
//! capability and two interceptors that route every outgoing call through it:
//!
//! - [`UnaryClientInterceptor`] wraps a single request / single response call;
//! - [`StreamClientInterceptor`] wraps stream establishment only.
//!
//! Each call becomes one [`UnitOfWork`] submitted to the breaker exactly once.
//! Only failures with a tripping status code (`Internal` by default) are
//! reported to the breaker. Failures with any other code are reported as
//! success and are not returned to the caller either: the interceptor yields
//! `Ok(None)`.
//!
//! # Example
//!
//! ```ignore
//! use modkit_grpc_breaker::{client_interceptors, CallContext};
//! use std::sync::Arc;
//!
//! let interceptors = client_interceptors(Arc::new(MyBreaker::default()));
//! let client = GreeterClient::new(channel);
//!
//! let reply = interceptors
//!     .unary
//!     .intercept(
//!         &CallContext::new().with_timeout(Duration::from_secs(5)),
//!         "/helloworld.Greeter/SayHello",
//!         Request::new(HelloRequest { name: "world".into() }),
//!         client.clone(),
//!         |ctx, _method, mut req, mut c| async move {
//!             ctx.apply_to(&mut req);
//!             ctx.run(c.say_hello(req)).await
//!         },
//!     )
//!     .await?;
//! ```

use std::sync::Arc;

pub mod breaker;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
mod guard;
pub mod stream;
pub mod unary;

pub use breaker::{Breaker, UnitOfWork};
pub use classify::{CallOutcome, DEFAULT_TRIPPING_CODES};
pub use config::BreakerInterceptorConfig;
pub use context::CallContext;
pub use error::CallError;
pub use stream::{StreamClientInterceptor, StreamDesc, stream_client_interceptor};
pub use unary::{UnaryClientInterceptor, unary_client_interceptor};

/// Unary and stream interceptors sharing one breaker and one configuration.
pub struct ClientInterceptors<B: ?Sized> {
    pub unary: UnaryClientInterceptor<B>,
    pub stream: StreamClientInterceptor<B>,
}

impl<B: ?Sized> Clone for ClientInterceptors<B> {
    fn clone(&self) -> Self {
        Self {
            unary: self.unary.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl<B: ?Sized> std::fmt::Debug for ClientInterceptors<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInterceptors")
            .field("unary", &self.unary)
            .field("stream", &self.stream)
            .finish()
    }
}

impl<B: Breaker + ?Sized> ClientInterceptors<B> {
    #[must_use]
    pub fn with_config(breaker: Arc<B>, config: BreakerInterceptorConfig) -> Self {
        Self {
            unary: UnaryClientInterceptor::with_config(Arc::clone(&breaker), config.clone()),
            stream: StreamClientInterceptor::with_config(breaker, config),
        }
    }
}

/// Build both interceptors over the same breaker with the default configuration.
#[must_use]
pub fn client_interceptors<B: Breaker + ?Sized>(breaker: Arc<B>) -> ClientInterceptors<B> {
    ClientInterceptors::with_config(breaker, BreakerInterceptorConfig::default())
}
