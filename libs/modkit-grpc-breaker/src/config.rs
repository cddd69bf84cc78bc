//! Interceptor configuration.
//!
//! The configuration only shapes how call outcomes are classified and how the
//! interceptors report them through `tracing`. The breaker's admission
//! algorithm is configured by whoever implements [`crate::Breaker`].

use tonic::Code;

use crate::classify::DEFAULT_TRIPPING_CODES;

/// Configuration shared by the unary and stream breaker interceptors.
#[derive(Debug, Clone)]
pub struct BreakerInterceptorConfig {
    /// Service name recorded on tracing spans and events.
    pub service_name: &'static str,

    /// Status codes reported to the breaker as failures.
    ///
    /// Any other code is reported as success and hidden from the caller.
    pub tripping_codes: Vec<Code>,

    /// Emit tracing events for reported, hidden and rejected calls.
    pub enable_tracing: bool,
}

impl Default for BreakerInterceptorConfig {
    fn default() -> Self {
        Self {
            service_name: "grpc_client",
            tripping_codes: DEFAULT_TRIPPING_CODES.to_vec(),
            enable_tracing: true,
        }
    }
}

impl BreakerInterceptorConfig {
    /// Create a new configuration with the given service name.
    #[must_use]
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    /// Report `code` to the breaker in addition to the current tripping codes.
    #[must_use]
    pub fn with_tripping_code(mut self, code: Code) -> Self {
        if !self.tripping_codes.contains(&code) {
            self.tripping_codes.push(code);
        }
        self
    }

    /// Replace the tripping codes.
    #[must_use]
    pub fn with_tripping_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.tripping_codes.clear();
        for code in codes {
            if !self.tripping_codes.contains(&code) {
                self.tripping_codes.push(code);
            }
        }
        self
    }

    /// Disable tracing events.
    #[must_use]
    pub fn without_tracing(mut self) -> Self {
        self.enable_tracing = false;
        self
    }

    /// Returns `true` if a failure with `code` is reported to the breaker.
    #[must_use]
    pub fn is_tripping(&self, code: Code) -> bool {
        self.tripping_codes.contains(&code)
    }
}
