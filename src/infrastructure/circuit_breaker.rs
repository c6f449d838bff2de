//! Circuit Breaker Pattern
//!
//! Skips geocoding providers that keep failing instead of paying their
//! timeout on every checkout.

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    pub failure_threshold: u32,
    /// Duration to keep circuit open before testing
    pub reset_timeout: Duration,
    /// Number of successes in half-open to close circuit
    pub success_threshold: u32,
    /// Window for counting failures (failures older than this are forgotten)
    pub failure_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            success_threshold: 1,
            failure_window: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    /// Normal operation - calls allowed
    #[default]
    Closed,
    /// Circuit tripped - provider skipped
    Open,
    /// Testing recovery - a trial call is allowed
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Per-provider circuit, mutated through the map entry guard.
#[derive(Debug, Default)]
struct ProviderCircuit {
    state: CircuitState,
    /// Failures in the current window
    failures: u32,
    /// Successes since entering half-open
    successes: u32,
    opened_at: Option<Instant>,
    last_failure: Option<Instant>,
}

impl ProviderCircuit {
    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.successes = 0;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failures = 0;
        self.successes = 0;
    }

    fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            failures: self.failures,
        }
    }
}

/// Circuit breaker shared by every resolver call.
///
/// Tracks failures per provider name.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    circuits: DashMap<String, ProviderCircuit>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
        }
    }

    fn circuit(&self, provider: &str) -> RefMut<'_, String, ProviderCircuit> {
        self.circuits.entry(provider.to_string()).or_default()
    }

    /// Check if a call to this provider is allowed.
    ///
    /// An open circuit moves to half-open once `reset_timeout` has passed.
    pub fn allow_request(&self, provider: &str) -> bool {
        let mut circuit = self.circuit(provider);

        if circuit.state != CircuitState::Open {
            return true;
        }

        let cooled_down = circuit
            .opened_at
            .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);
        if cooled_down {
            circuit.state = CircuitState::HalfOpen;
            circuit.successes = 0;
            tracing::info!("circuit breaker for {} transitioning to half-open", provider);
        }
        cooled_down
    }

    /// Record a call that got an answer (with or without a result).
    pub fn record_success(&self, provider: &str) {
        let mut circuit = self.circuit(provider);

        match circuit.state {
            CircuitState::HalfOpen => {
                circuit.successes += 1;
                if circuit.successes >= self.config.success_threshold {
                    circuit.close();
                    tracing::info!("circuit breaker for {} closed (recovered)", provider);
                }
            }
            CircuitState::Closed => circuit.failures = 0,
            CircuitState::Open => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self, provider: &str) {
        let mut circuit = self.circuit(provider);
        let now = Instant::now();

        match circuit.state {
            CircuitState::Closed => {
                let stale = circuit
                    .last_failure
                    .is_some_and(|at| now.duration_since(at) > self.config.failure_window);
                circuit.failures = if stale { 1 } else { circuit.failures + 1 };
                circuit.last_failure = Some(now);

                if circuit.failures >= self.config.failure_threshold {
                    let failures = circuit.failures;
                    circuit.open(now);
                    tracing::warn!(
                        "circuit breaker for {} opened after {} failures",
                        provider,
                        failures
                    );
                }
            }
            CircuitState::HalfOpen => {
                circuit.open(now);
                tracing::warn!("circuit breaker for {} re-opened (failed in half-open)", provider);
            }
            CircuitState::Open => circuit.opened_at = Some(now),
        }
    }

    pub fn get_metrics(&self, provider: &str) -> CircuitMetrics {
        self.circuits
            .get(provider)
            .map(|c| c.metrics())
            .unwrap_or_default()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

/// Metrics for a circuit.
#[derive(Debug, Clone, Default)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub failures: u32,
}
