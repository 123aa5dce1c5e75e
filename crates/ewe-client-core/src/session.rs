//! Inactivity timeout state machine
//!
//! ```text
//!            activity (restart)
//!             ┌──────┐
//!             ▼      │
//!  arm ──▶ Armed ────┘ ── countdown elapses ──▶ Expired
//!             ▲                                    │
//!             └──────── user stays logged in ──────┤
//!                                                  └── user declines ──▶ logout
//! ```
//!
//! The guard hands out a [`Countdown`] whenever a timer must be (re)started.
//! The caller replaces its single timer with it; a timer that fires with an
//! older generation is ignored, so a missed cancellation can never expire
//! the session early or twice.

use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Browser timers may fire a hair before the wall clock reaches the deadline
const TIMER_SLACK_MS: f64 = 50.0;

pub const EXPIRY_PROMPT: &str =
    "Your session is about to expire. Do you want to stay logged in?";

/// DOM events that count as user activity
pub const ACTIVITY_EVENTS: [&str; 5] = [
    "mousedown",
    "mousemove",
    "keypress",
    "scroll",
    "touchstart",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SessionState {
    /// Not started yet
    Idle,
    /// Countdown running until `deadline_ms`
    Armed { generation: u64, deadline_ms: f64 },
    /// Prompt shown, waiting for the user
    Expired,
    /// User declined; the page is navigating to logout
    LoggedOut,
}

/// Timer the caller must schedule, replacing any previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub generation: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Superseded timer; nothing to do
    Ignored,
    /// Live timer woke before the deadline; schedule the remainder
    Reschedule(Countdown),
    /// Show the expiry prompt
    PromptUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Rearm(Countdown),
    Logout,
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    timeout: Duration,
    generation: u64,
    state: SessionState,
}

impl SessionGuard {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            generation: 0,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn restart(&mut self, now_ms: f64) -> Countdown {
        self.generation += 1;
        self.state = SessionState::Armed {
            generation: self.generation,
            deadline_ms: now_ms + self.timeout.as_secs_f64() * 1000.0,
        };
        Countdown {
            generation: self.generation,
            delay: self.timeout,
        }
    }

    /// Start the first countdown
    pub fn arm(&mut self, now_ms: f64) -> Countdown {
        self.restart(now_ms)
    }

    /// Activity restarts the countdown while armed; ignored otherwise
    pub fn record_activity(&mut self, now_ms: f64) -> Option<Countdown> {
        match self.state {
            SessionState::Armed { .. } | SessionState::Idle => Some(self.restart(now_ms)),
            SessionState::Expired | SessionState::LoggedOut => None,
        }
    }

    /// A countdown timer fired
    ///
    /// The live timer never leaves the guard without a successor: if the
    /// clock says the deadline is still ahead, the remainder comes back as a
    /// [`TimerOutcome::Reschedule`] under the same generation.
    pub fn on_timer(&mut self, generation: u64, now_ms: f64) -> TimerOutcome {
        match self.state {
            SessionState::Armed {
                generation: live,
                deadline_ms,
            } if live == generation => {
                if now_ms + TIMER_SLACK_MS >= deadline_ms {
                    self.state = SessionState::Expired;
                    return TimerOutcome::PromptUser;
                }
                // Wall clock stepped back or the timer woke early
                let remaining_ms = (deadline_ms - now_ms).ceil().min(self.timeout.as_millis() as f64);
                tracing::debug!(generation, remaining_ms, "session timer woke early");
                TimerOutcome::Reschedule(Countdown {
                    generation,
                    delay: Duration::from_millis(remaining_ms as u64),
                })
            }
            _ => {
                tracing::debug!(generation, "ignoring stale session timer");
                TimerOutcome::Ignored
            }
        }
    }

    /// The user answered the expiry prompt
    pub fn resolve_prompt(&mut self, stay_logged_in: bool, now_ms: f64) -> PromptOutcome {
        if stay_logged_in {
            PromptOutcome::Rearm(self.restart(now_ms))
        } else {
            self.state = SessionState::LoggedOut;
            PromptOutcome::Logout
        }
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE_MS: f64 = 60_000.0;

    /// Drives the guard the way the browser would: one live timer at a time
    struct Harness {
        guard: SessionGuard,
        timer: Option<(u64, f64)>,
    }

    impl Harness {
        fn start() -> Self {
            let mut guard = SessionGuard::default();
            let countdown = guard.arm(0.0);
            Self {
                guard,
                timer: Some((countdown.generation, countdown.delay.as_secs_f64() * 1000.0)),
            }
        }

        fn activity(&mut self, now_ms: f64) {
            if let Some(countdown) = self.guard.record_activity(now_ms) {
                self.timer = Some((
                    countdown.generation,
                    now_ms + countdown.delay.as_secs_f64() * 1000.0,
                ));
            }
        }

        fn advance_to(&mut self, now_ms: f64) -> TimerOutcome {
            match self.timer {
                Some((generation, fire_at)) if fire_at <= now_ms => {
                    self.timer = None;
                    let outcome = self.guard.on_timer(generation, fire_at);
                    if let TimerOutcome::Reschedule(countdown) = outcome {
                        self.timer = Some((
                            countdown.generation,
                            fire_at + countdown.delay.as_secs_f64() * 1000.0,
                        ));
                    }
                    outcome
                }
                _ => TimerOutcome::Ignored,
            }
        }
    }

    #[test]
    fn test_expires_after_full_quiet_period() {
        let mut h = Harness::start();
        assert_eq!(h.advance_to(29.0 * MINUTE_MS), TimerOutcome::Ignored);
        assert_eq!(h.advance_to(30.0 * MINUTE_MS), TimerOutcome::PromptUser);
        assert_eq!(h.guard.state(), SessionState::Expired);
    }

    #[test]
    fn test_activity_restarts_window() {
        let mut h = Harness::start();
        h.activity(29.0 * MINUTE_MS);
        assert_eq!(h.advance_to(30.0 * MINUTE_MS), TimerOutcome::Ignored);
        assert_eq!(h.advance_to(58.9 * MINUTE_MS), TimerOutcome::Ignored);
        assert_eq!(h.advance_to(59.0 * MINUTE_MS), TimerOutcome::PromptUser);
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut guard = SessionGuard::default();
        let first = guard.arm(0.0);
        let second = guard.record_activity(10.0).unwrap();
        assert_eq!(guard.on_timer(first.generation, 40.0 * MINUTE_MS), TimerOutcome::Ignored);
        assert_eq!(
            guard.on_timer(second.generation, 40.0 * MINUTE_MS),
            TimerOutcome::PromptUser
        );
    }

    #[test]
    fn test_early_timer_reschedules_remainder() {
        let mut guard = SessionGuard::default();
        let countdown = guard.arm(0.0);
        assert_eq!(
            guard.on_timer(countdown.generation, 29.0 * MINUTE_MS),
            TimerOutcome::Reschedule(Countdown {
                generation: countdown.generation,
                delay: Duration::from_secs(60),
            })
        );
        assert_eq!(
            guard.state(),
            SessionState::Armed {
                generation: countdown.generation,
                deadline_ms: 30.0 * MINUTE_MS,
            }
        );
        assert_eq!(
            guard.on_timer(countdown.generation, 30.0 * MINUTE_MS),
            TimerOutcome::PromptUser
        );
    }

    #[test]
    fn test_clock_step_back_still_expires() {
        // Timer fires on schedule but the wall clock now reads a minute earlier
        let mut h = Harness::start();
        h.timer = Some((1, 30.0 * MINUTE_MS - 60_000.0));
        assert!(matches!(
            h.advance_to(30.0 * MINUTE_MS),
            TimerOutcome::Reschedule(_)
        ));
        assert!(h.timer.is_some());
        assert_eq!(h.advance_to(30.0 * MINUTE_MS), TimerOutcome::PromptUser);
        assert_eq!(h.guard.state(), SessionState::Expired);
    }

    #[test]
    fn test_remainder_never_exceeds_timeout() {
        let mut guard = SessionGuard::new(Duration::from_secs(60));
        let countdown = guard.arm(100_000.0);
        // Clock jumped far backwards
        match guard.on_timer(countdown.generation, 0.0) {
            TimerOutcome::Reschedule(next) => assert_eq!(next.delay, Duration::from_secs(60)),
            other => panic!("expected reschedule, got {:?}", other),
        }
    }

    #[test]
    fn test_timer_fires_once() {
        let mut guard = SessionGuard::default();
        let countdown = guard.arm(0.0);
        let at = 30.0 * MINUTE_MS;
        assert_eq!(guard.on_timer(countdown.generation, at), TimerOutcome::PromptUser);
        assert_eq!(guard.on_timer(countdown.generation, at), TimerOutcome::Ignored);
    }

    #[test]
    fn test_stay_logged_in_rearms() {
        let mut guard = SessionGuard::default();
        let countdown = guard.arm(0.0);
        guard.on_timer(countdown.generation, 30.0 * MINUTE_MS);

        match guard.resolve_prompt(true, 31.0 * MINUTE_MS) {
            PromptOutcome::Rearm(next) => {
                assert!(next.generation > countdown.generation);
                assert_eq!(next.delay, DEFAULT_TIMEOUT);
            }
            PromptOutcome::Logout => panic!("expected rearm"),
        }
        assert!(matches!(guard.state(), SessionState::Armed { .. }));
    }

    #[test]
    fn test_decline_logs_out() {
        let mut guard = SessionGuard::default();
        let countdown = guard.arm(0.0);
        guard.on_timer(countdown.generation, 30.0 * MINUTE_MS);
        assert_eq!(guard.resolve_prompt(false, 0.0), PromptOutcome::Logout);
        assert_eq!(guard.record_activity(0.0), None);
        assert_eq!(guard.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_activity_ignored_while_prompting() {
        let mut guard = SessionGuard::default();
        let countdown = guard.arm(0.0);
        guard.on_timer(countdown.generation, 30.0 * MINUTE_MS);
        assert_eq!(guard.record_activity(31.0 * MINUTE_MS), None);
        assert_eq!(guard.state(), SessionState::Expired);
    }
}
