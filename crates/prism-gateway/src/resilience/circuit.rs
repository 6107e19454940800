//! Per-upstream circuit breaker

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use dashmap::DashMap;
use prism_config::CircuitBreakerConfig;
use tracing::warn;

use crate::error::GatewayError;

/// Observable breaker state, for logs and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    /// Passing requests through
    Closed,
    /// Rejecting requests locally
    Open,
    /// One probe request may pass
    HalfOpen,
}

/// Circuit breaker that short-circuits calls to an unhealthy upstream
#[derive(Clone)]
pub struct CircuitBreaker {
    upstream: String,
    config: CircuitBreakerConfig,
    state: Arc<CircuitState>,
}

struct CircuitState {
    failure_count: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    probe_in_flight: AtomicBool,
}

impl CircuitBreaker {
    /// Create a closed breaker for one upstream
    pub fn new(upstream: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream: upstream.into(),
            config,
            state: Arc::new(CircuitState {
                failure_count: AtomicU32::new(0),
                opened_at: Mutex::new(None),
                probe_in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Current state, computed from the recovery clock
    pub fn status(&self) -> CircuitStatus {
        let opened_at = self.state.opened_at.lock().unwrap_or_else(|e| e.into_inner());
        match *opened_at {
            None => CircuitStatus::Closed,
            Some(ts) if ts.elapsed() >= self.config.recovery_timeout => CircuitStatus::HalfOpen,
            Some(_) => CircuitStatus::Open,
        }
    }

    /// Check whether the circuit admits a request
    ///
    /// While open, rejects locally without touching the upstream. Once
    /// the recovery timeout elapses exactly one caller wins the probe
    /// slot; concurrent callers keep being rejected until the probe
    /// resolves.
    pub fn check(&self) -> Result<(), GatewayError> {
        let opened_at = self.state.opened_at.lock().unwrap_or_else(|e| e.into_inner());

        match *opened_at {
            None => Ok(()),
            Some(ts) if ts.elapsed() >= self.config.recovery_timeout => {
                if self.state.probe_in_flight.swap(true, Ordering::SeqCst) {
                    Err(self.open_error())
                } else {
                    Ok(())
                }
            }
            Some(_) => Err(self.open_error()),
        }
    }

    /// Record a successful request, closing the circuit
    pub fn record_success(&self) {
        self.state.failure_count.store(0, Ordering::Relaxed);
        self.state.probe_in_flight.store(false, Ordering::SeqCst);
        let mut opened_at = self.state.opened_at.lock().unwrap_or_else(|e| e.into_inner());
        *opened_at = None;
    }

    /// Record a failed request, opening the circuit at the threshold
    ///
    /// A failed half-open probe re-opens with a fresh recovery clock.
    pub fn record_failure(&self) {
        let prev = self.state.failure_count.fetch_add(1, Ordering::Relaxed);
        let probing = self.state.probe_in_flight.swap(false, Ordering::SeqCst);

        if probing || prev + 1 >= self.config.failure_threshold {
            let mut opened_at = self.state.opened_at.lock().unwrap_or_else(|e| e.into_inner());
            if opened_at.is_none() {
                warn!(upstream = %self.upstream, failures = prev + 1, "circuit opened");
            }
            *opened_at = Some(Instant::now());
        }
    }

    fn open_error(&self) -> GatewayError {
        GatewayError::CircuitOpen {
            upstream: self.upstream.clone(),
        }
    }

    #[cfg(test)]
    fn backdate(&self) {
        let mut opened_at = self.state.opened_at.lock().unwrap();
        *opened_at = Some(Instant::now() - self.config.recovery_timeout - std::time::Duration::from_millis(1));
    }
}

/// Process-wide registry of breakers keyed by upstream name
#[derive(Default)]
pub struct CircuitRegistry {
    config: CircuitBreakerConfig,
    breakers: DashMap<String, CircuitBreaker>,
}

impl CircuitRegistry {
    /// Create a registry applying one config to every breaker
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Breaker for an upstream, created closed on first use
    pub fn breaker(&self, upstream: &str) -> CircuitBreaker {
        self.breakers
            .entry(upstream.to_owned())
            .or_insert_with(|| CircuitBreaker::new(upstream, self.config.clone()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("primary", CircuitBreakerConfig::default())
    }

    fn threshold() -> u32 {
        CircuitBreakerConfig::default().failure_threshold
    }

    #[test]
    fn closed_circuit_allows_requests() {
        let cb = breaker();
        assert_eq!(cb.status(), CircuitStatus::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = breaker();
        for _ in 0..threshold() {
            cb.record_failure();
        }
        assert_eq!(cb.status(), CircuitStatus::Open);
        assert!(matches!(cb.check(), Err(GatewayError::CircuitOpen { upstream }) if upstream == "primary"));
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = breaker();
        for _ in 0..threshold() - 1 {
            cb.record_failure();
        }
        cb.record_success();
        cb.record_failure();
        assert!(cb.check().is_ok());
    }

    #[test]
    fn half_open_admits_exactly_one_probe() {
        let cb = breaker();
        for _ in 0..threshold() {
            cb.record_failure();
        }
        cb.backdate();
        assert_eq!(cb.status(), CircuitStatus::HalfOpen);

        assert!(cb.check().is_ok());
        // Second caller is rejected while the probe is in flight
        assert!(cb.check().is_err());
    }

    #[test]
    fn probe_success_closes_the_circuit() {
        let cb = breaker();
        for _ in 0..threshold() {
            cb.record_failure();
        }
        cb.backdate();
        assert!(cb.check().is_ok());
        cb.record_success();
        assert_eq!(cb.status(), CircuitStatus::Closed);
        assert!(cb.check().is_ok());
    }

    #[test]
    fn probe_failure_restarts_the_recovery_clock() {
        let cb = breaker();
        for _ in 0..threshold() {
            cb.record_failure();
        }
        cb.backdate();
        assert!(cb.check().is_ok());
        cb.record_failure();
        assert_eq!(cb.status(), CircuitStatus::Open);
        assert!(cb.check().is_err());
    }

    #[test]
    fn registry_isolates_upstreams() {
        let registry = CircuitRegistry::new(CircuitBreakerConfig::default());
        let primary = registry.breaker("primary");
        for _ in 0..threshold() {
            primary.record_failure();
        }
        assert!(registry.breaker("primary").check().is_err());
        assert!(registry.breaker("fallback").check().is_ok());
    }

    #[test]
    fn clone_shares_state() {
        let cb1 = breaker();
        let cb2 = cb1.clone();
        for _ in 0..threshold() {
            cb1.record_failure();
        }
        assert!(cb2.check().is_err());
    }
}
