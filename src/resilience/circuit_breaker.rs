//! Circuit breaker state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: testing if the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure ratio >= threshold over >= min_samples
//! Open → Half-Open: first admission after open_duration
//! Half-Open → Closed: probe succeeds (window cleared)
//! Half-Open → Open: probe fails or times out (open timer restarts)
//! ```
//!
//! # Design Decisions
//! - Pure state: no I/O, no clock reads; callers pass `now`
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open (prevents hammering recovering dependency)
//! - Every transition bumps a generation; outcomes of calls admitted under
//!   an older generation are dropped

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::GateConfig;
use crate::resilience::window::{RollingWindow, Sample};

/// Gate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    Closed,
    Open,
    HalfOpen,
}

impl GateMode {
    /// Numeric encoding used by the `gate_mode` gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            GateMode::Closed => 0.0,
            GateMode::Open => 1.0,
            GateMode::HalfOpen => 2.0,
        }
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateMode::Closed => write!(f, "closed"),
            GateMode::Open => write!(f, "open"),
            GateMode::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// A mode change, reported to the caller so it can emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened { failure_percent: u8 },
    HalfOpened,
    Closed,
}

/// Permission to forward one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    probe: bool,
}

impl Ticket {
    pub fn is_probe(&self) -> bool {
        self.probe
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Forward(Ticket),
    Reject,
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateSnapshot {
    pub mode: GateMode,
    pub samples: usize,
    pub failures: usize,
    pub timeouts: usize,
    pub failure_percent: f64,
    pub window_size: usize,
    /// Milliseconds since the last transition into Open, if any.
    pub open_for_ms: Option<u64>,
}

#[derive(Debug)]
pub struct BreakerState {
    mode: GateMode,
    window: RollingWindow,
    opened_at: Option<Instant>,
    generation: u64,
    probe_in_flight: bool,
    error_threshold_percent: u8,
    min_samples: usize,
    open_duration: Duration,
}

impl BreakerState {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            mode: GateMode::Closed,
            window: RollingWindow::new(config.rolling_window_size),
            opened_at: None,
            generation: 0,
            probe_in_flight: false,
            error_threshold_percent: config.error_threshold_percent,
            min_samples: config.min_samples(),
            open_duration: config.open_duration(),
        }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    /// Decide whether a call may be forwarded.
    ///
    /// An expired Open period moves the breaker to Half-Open here, so the
    /// transition is always reported before the probe is attempted.
    pub fn admit(&mut self, now: Instant, transitions: &mut Vec<Transition>) -> Admission {
        match self.mode {
            GateMode::Closed => Admission::Forward(Ticket {
                generation: self.generation,
                probe: false,
            }),
            GateMode::Open => {
                let elapsed = self
                    .opened_at
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(self.open_duration);
                if elapsed < self.open_duration {
                    return Admission::Reject;
                }
                self.enter(GateMode::HalfOpen, now, transitions);
                self.take_probe()
            }
            GateMode::HalfOpen if self.probe_in_flight => Admission::Reject,
            GateMode::HalfOpen => self.take_probe(),
        }
    }

    /// Apply the outcome of a forwarded call.
    ///
    /// Returns false when the ticket is stale and nothing was changed.
    pub fn record(
        &mut self,
        ticket: Ticket,
        sample: Sample,
        now: Instant,
        transitions: &mut Vec<Transition>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.window.push(sample);

        match self.mode {
            GateMode::Closed => {
                if self
                    .window
                    .exceeds(self.error_threshold_percent, self.min_samples)
                {
                    self.enter(GateMode::Open, now, transitions);
                }
            }
            GateMode::HalfOpen if ticket.probe => {
                self.probe_in_flight = false;
                if sample.is_failure() {
                    self.enter(GateMode::Open, now, transitions);
                } else {
                    self.window.clear();
                    self.enter(GateMode::Closed, now, transitions);
                }
            }
            GateMode::HalfOpen | GateMode::Open => {}
        }
        true
    }

    /// Give back an unfinished probe slot (the caller went away).
    pub fn release(&mut self, ticket: Ticket) {
        if ticket.probe && ticket.generation == self.generation && self.mode == GateMode::HalfOpen {
            self.probe_in_flight = false;
        }
    }

    pub fn snapshot(&self, now: Instant) -> GateSnapshot {
        GateSnapshot {
            mode: self.mode,
            samples: self.window.len(),
            failures: self.window.failures(),
            timeouts: self.window.timeouts(),
            failure_percent: self.window.failure_percent(),
            window_size: self.window.capacity(),
            open_for_ms: self.opened_at.and_then(|at| {
                (self.mode != GateMode::Closed)
                    .then(|| now.saturating_duration_since(at).as_millis() as u64)
            }),
        }
    }

    fn take_probe(&mut self) -> Admission {
        self.probe_in_flight = true;
        Admission::Forward(Ticket {
            generation: self.generation,
            probe: true,
        })
    }

    fn enter(&mut self, mode: GateMode, now: Instant, transitions: &mut Vec<Transition>) {
        self.mode = mode;
        self.generation += 1;
        self.probe_in_flight = false;
        let transition = match mode {
            GateMode::Open => {
                self.opened_at = Some(now);
                Transition::Opened {
                    failure_percent: self.window.failure_percent().round() as u8,
                }
            }
            GateMode::HalfOpen => Transition::HalfOpened,
            GateMode::Closed => Transition::Closed,
        };
        transitions.push(transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window: usize, threshold: u8) -> GateConfig {
        GateConfig {
            call_timeout_ms: 500,
            error_threshold_percent: threshold,
            open_duration_ms: 1000,
            rolling_window_size: window,
            min_samples: None,
        }
    }

    fn forward(state: &mut BreakerState, now: Instant) -> Ticket {
        match state.admit(now, &mut Vec::new()) {
            Admission::Forward(ticket) => ticket,
            Admission::Reject => panic!("expected the call to be forwarded"),
        }
    }

    fn trip(state: &mut BreakerState, now: Instant) {
        let mut transitions = Vec::new();
        for _ in 0..4 {
            let ticket = forward(state, now);
            state.record(ticket, Sample::Failure, now, &mut transitions);
        }
        assert_eq!(state.mode(), GateMode::Open);
    }

    #[test]
    fn test_below_threshold_stays_closed() {
        let now = Instant::now();
        let mut state = BreakerState::new(&config(4, 75));
        let mut transitions = Vec::new();
        for sample in [Sample::Failure, Sample::Success, Sample::Failure, Sample::Success] {
            let ticket = forward(&mut state, now);
            state.record(ticket, sample, now, &mut transitions);
        }
        assert_eq!(state.mode(), GateMode::Closed);
        assert!(transitions.is_empty());
    }

    #[test]
    fn test_opens_once_per_crossing() {
        let now = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        let mut transitions = Vec::new();
        let tickets: Vec<_> = (0..6).map(|_| forward(&mut state, now)).collect();
        for ticket in tickets {
            state.record(ticket, Sample::Timeout, now, &mut transitions);
        }
        assert_eq!(state.mode(), GateMode::Open);
        assert_eq!(transitions, vec![Transition::Opened { failure_percent: 100 }]);
    }

    #[test]
    fn test_open_rejects_until_duration_elapses() {
        let start = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        trip(&mut state, start);

        let mut transitions = Vec::new();
        let early = start + Duration::from_millis(999);
        assert_eq!(state.admit(early, &mut transitions), Admission::Reject);
        assert!(transitions.is_empty());

        let later = start + Duration::from_millis(1000);
        let ticket = match state.admit(later, &mut transitions) {
            Admission::Forward(ticket) => ticket,
            Admission::Reject => panic!("probe should be admitted"),
        };
        assert!(ticket.is_probe());
        assert_eq!(transitions, vec![Transition::HalfOpened]);
        assert_eq!(state.mode(), GateMode::HalfOpen);

        // Only one probe at a time.
        assert_eq!(state.admit(later, &mut transitions), Admission::Reject);
    }

    #[test]
    fn test_probe_success_closes_and_clears() {
        let start = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        trip(&mut state, start);

        let now = start + Duration::from_secs(1);
        let probe = forward(&mut state, now);
        let mut transitions = Vec::new();
        assert!(state.record(probe, Sample::Success, now, &mut transitions));
        assert_eq!(transitions, vec![Transition::Closed]);

        let snapshot = state.snapshot(now);
        assert_eq!(snapshot.mode, GateMode::Closed);
        assert_eq!(snapshot.samples, 0);
        assert_eq!(snapshot.failures, 0);
        assert_eq!(snapshot.open_for_ms, None);
    }

    #[test]
    fn test_probe_failure_restarts_open_timer() {
        let start = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        trip(&mut state, start);

        let probe_at = start + Duration::from_millis(1500);
        let probe = forward(&mut state, probe_at);
        let mut transitions = Vec::new();
        state.record(probe, Sample::Timeout, probe_at, &mut transitions);
        assert_eq!(state.mode(), GateMode::Open);
        assert!(matches!(transitions[0], Transition::Opened { .. }));

        // Timer counts from the probe failure, not the first opening.
        let just_before = probe_at + Duration::from_millis(999);
        assert_eq!(state.admit(just_before, &mut Vec::new()), Admission::Reject);
        assert_eq!(state.snapshot(just_before).open_for_ms, Some(999));
        let after = probe_at + Duration::from_millis(1000);
        assert!(matches!(state.admit(after, &mut Vec::new()), Admission::Forward(_)));
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let now = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        let stale = forward(&mut state, now);
        trip(&mut state, now);

        let mut transitions = Vec::new();
        assert!(!state.record(stale, Sample::Failure, now, &mut transitions));
        assert!(transitions.is_empty());
        assert_eq!(state.snapshot(now).samples, 4);
    }

    #[test]
    fn test_released_probe_can_be_retaken() {
        let start = Instant::now();
        let mut state = BreakerState::new(&config(4, 50));
        trip(&mut state, start);

        let now = start + Duration::from_secs(2);
        let probe = forward(&mut state, now);
        assert_eq!(state.admit(now, &mut Vec::new()), Admission::Reject);
        state.release(probe);
        assert!(forward(&mut state, now).is_probe());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(GateMode::HalfOpen.to_string(), "half-open");
        assert_eq!(GateMode::Open.as_gauge(), 1.0);
    }
}
