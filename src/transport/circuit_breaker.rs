//! Per-host circuit breaker: CLOSED/OPEN/HALF_OPEN fail-fast state
//! machine guarding a single host, plus a manager owning one breaker
//! per host.

use crate::constants::{
    CIRCUIT_FAILURE_THRESHOLD, CIRCUIT_OPEN_TIMEOUT_SECS, CIRCUIT_SUCCESS_THRESHOLD, CIRCUIT_WINDOW_SECS,
};
use crate::error::Error;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Stats {
    pub state: State,
    pub window_failures: u32,
    pub window_successes: u32,
    pub total_rejected: u64,
    pub total_transitions: u64,
}

struct Breaker {
    state: State,
    events: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    half_open_successes: u32,
    total_rejected: u64,
    total_transitions: u64,
}

impl Breaker {
    fn new() -> Self {
        Self {
            state: State::Closed,
            events: VecDeque::new(),
            opened_at: None,
            half_open_successes: 0,
            total_rejected: 0,
            total_transitions: 0,
        }
    }

    fn prune_window(&mut self, now: Instant) {
        let window = Duration::from_secs(CIRCUIT_WINDOW_SECS);
        while let Some(&(ts, _)) = self.events.front() {
            if now.duration_since(ts) > window {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    fn window_counts(&self) -> (u32, u32) {
        let failures = self.events.iter().filter(|(_, ok)| !ok).count() as u32;
        let successes = self.events.iter().filter(|(_, ok)| *ok).count() as u32;
        (failures, successes)
    }

    /// Decides whether a call may proceed right now, transitioning
    /// OPEN -> HALF_OPEN if the open timeout has elapsed.
    fn admit(&mut self, now: Instant) -> bool {
        match self.state {
            State::Closed => true,
            State::HalfOpen => true,
            State::Open => {
                let timeout = Duration::from_secs(CIRCUIT_OPEN_TIMEOUT_SECS);
                if self.opened_at.is_some_and(|t| now.duration_since(t) >= timeout) {
                    self.state = State::HalfOpen;
                    self.half_open_successes = 0;
                    self.total_transitions += 1;
                    true
                } else {
                    self.total_rejected += 1;
                    false
                }
            }
        }
    }

    fn record(&mut self, now: Instant, success: bool) {
        self.prune_window(now);
        self.events.push_back((now, success));

        match self.state {
            State::Closed => {
                let (failures, _) = self.window_counts();
                if failures >= CIRCUIT_FAILURE_THRESHOLD {
                    self.state = State::Open;
                    self.opened_at = Some(now);
                    self.total_transitions += 1;
                }
            }
            State::HalfOpen => {
                if success {
                    self.half_open_successes += 1;
                    if self.half_open_successes >= CIRCUIT_SUCCESS_THRESHOLD {
                        self.state = State::Closed;
                        self.events.clear();
                        self.total_transitions += 1;
                    }
                } else {
                    self.state = State::Open;
                    self.opened_at = Some(now);
                    self.half_open_successes = 0;
                    self.total_transitions += 1;
                }
            }
            State::Open => {}
        }
    }

    fn stats(&self) -> Stats {
        let (window_failures, window_successes) = self.window_counts();
        Stats {
            state: self.state,
            window_failures,
            window_successes,
            total_rejected: self.total_rejected,
            total_transitions: self.total_transitions,
        }
    }
}

/// Owns one `Breaker` per host, process-wide and internally
/// synchronized.
#[derive(Default)]
pub struct CircuitBreakerManager {
    breakers: Mutex<HashMap<String, Breaker>>,
}

impl CircuitBreakerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks out the breaker for `host`, failing fast with
    /// `Error::CircuitOpen` if it is OPEN.
    ///
    /// # Errors
    /// Returns `Error::CircuitOpen` if the breaker for `host` is
    /// currently open.
    pub fn admit(&self, host: &str) -> Result<(), Error> {
        let mut breakers = self.breakers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let breaker = breakers.entry(host.to_string()).or_insert_with(Breaker::new);
        if breaker.admit(Instant::now()) {
            Ok(())
        } else {
            Err(Error::CircuitOpen { host: host.to_string() })
        }
    }

    pub fn record_success(&self, host: &str) {
        let mut breakers = self.breakers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        breakers.entry(host.to_string()).or_insert_with(Breaker::new).record(Instant::now(), true);
    }

    pub fn record_failure(&self, host: &str) {
        let mut breakers = self.breakers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        breakers.entry(host.to_string()).or_insert_with(Breaker::new).record(Instant::now(), false);
    }

    #[must_use]
    pub fn stats(&self, host: &str) -> Option<Stats> {
        let breakers = self.breakers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        breakers.get(host).map(Breaker::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_failure_threshold() {
        let mgr = CircuitBreakerManager::new();
        for _ in 0..CIRCUIT_FAILURE_THRESHOLD {
            mgr.admit("h").unwrap();
            mgr.record_failure("h");
        }
        assert!(mgr.admit("h").is_err());
        assert_eq!(mgr.stats("h").unwrap().state, State::Open);
    }

    #[test]
    fn rejected_call_does_not_panic_on_repeated_checks() {
        let mgr = CircuitBreakerManager::new();
        for _ in 0..CIRCUIT_FAILURE_THRESHOLD {
            mgr.record_failure("h");
        }
        assert!(mgr.admit("h").is_err());
        assert!(mgr.admit("h").is_err());
        assert_eq!(mgr.stats("h").unwrap().total_rejected, 2);
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let mgr = CircuitBreakerManager::new();
        {
            let mut breakers = mgr.breakers.lock().unwrap();
            let breaker = breakers.entry("h".to_string()).or_insert_with(Breaker::new);
            breaker.state = State::HalfOpen;
        }
        mgr.admit("h").unwrap();
        mgr.record_success("h");
        mgr.admit("h").unwrap();
        mgr.record_success("h");
        assert_eq!(mgr.stats("h").unwrap().state, State::Closed);
    }

    #[test]
    fn half_open_reopens_on_failure() {
        let mgr = CircuitBreakerManager::new();
        {
            let mut breakers = mgr.breakers.lock().unwrap();
            let breaker = breakers.entry("h".to_string()).or_insert_with(Breaker::new);
            breaker.state = State::HalfOpen;
        }
        mgr.record_failure("h");
        assert_eq!(mgr.stats("h").unwrap().state, State::Open);
    }
}
