//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod circuit_breaker;
pub mod enrichment_worker;
pub mod rate_limiter;
pub mod shutdown;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, CircuitState};
pub use enrichment_worker::{EnrichmentQueue, EnrichmentWorker};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use shutdown::{shutdown_signal, ShutdownController};
