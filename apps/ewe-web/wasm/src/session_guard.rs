//! Inactivity logout driven by `SessionGuard`

use crate::dom::{self, Listener};
use ewe_client_core::session::{Countdown, PromptOutcome, TimerOutcome, EXPIRY_PROMPT};
use ewe_client_core::{ClientConfig, SessionGuard, SessionState};
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, Window};

struct GuardInner {
    guard: RefCell<SessionGuard>,
    timer: RefCell<Option<Timeout>>,
    window: Window,
    logout_url: String,
}

/// Owns the single countdown timer and the activity listeners
pub struct SessionTimeout {
    inner: Rc<GuardInner>,
    _listeners: Vec<Listener>,
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

impl SessionTimeout {
    pub fn start(window: &Window, document: &Document, config: &ClientConfig) -> Result<Self, JsValue> {
        let inner = Rc::new(GuardInner {
            guard: RefCell::new(SessionGuard::new(config.session_timeout())),
            timer: RefCell::new(None),
            window: window.clone(),
            logout_url: config.logout_url.clone(),
        });

        let countdown = inner.guard.borrow_mut().arm(now_ms());
        inner.schedule(countdown);

        let mut listeners = Vec::with_capacity(config.activity_events.len());
        for event in &config.activity_events {
            let weak = Rc::downgrade(&inner);
            listeners.push(Listener::new(document, event, move |_event: Event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_activity();
                }
            })?);
        }

        Ok(Self {
            inner,
            _listeners: listeners,
        })
    }

    pub fn state(&self) -> SessionState {
        self.inner.guard.borrow().state()
    }
}

impl GuardInner {
    /// Replace the pending timer; dropping the old handle cancels it
    fn schedule(self: &Rc<Self>, countdown: Countdown) {
        let weak = Rc::downgrade(self);
        let generation = countdown.generation;
        let delay_ms = u32::try_from(countdown.delay.as_millis()).unwrap_or(u32::MAX);

        let timeout = Timeout::new(delay_ms, move || {
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation);
            }
        });
        *self.timer.borrow_mut() = Some(timeout);
    }

    fn on_activity(self: &Rc<Self>) {
        let countdown = self.guard.borrow_mut().record_activity(now_ms());
        if let Some(countdown) = countdown {
            self.schedule(countdown);
        }
    }

    fn expire(self: &Rc<Self>, generation: u64) {
        let outcome = self.guard.borrow_mut().on_timer(generation, now_ms());
        match outcome {
            TimerOutcome::PromptUser => {}
            TimerOutcome::Reschedule(countdown) => {
                self.schedule(countdown);
                return;
            }
            TimerOutcome::Ignored => return,
        }

        let stay = match self.window.confirm_with_message(EXPIRY_PROMPT) {
            Ok(stay) => stay,
            Err(err) => {
                dom::error("Session prompt failed:", &err);
                false
            }
        };

        let resolution = self.guard.borrow_mut().resolve_prompt(stay, now_ms());
        match resolution {
            PromptOutcome::Rearm(countdown) => self.schedule(countdown),
            PromptOutcome::Logout => {
                self.timer.borrow_mut().take();
                if let Err(err) = self.window.location().set_href(&self.logout_url) {
                    dom::error("Logout redirect failed:", &err);
                }
            }
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn generation(state: SessionState) -> u64 {
        match state {
            SessionState::Armed { generation, .. } => generation,
            other => panic!("expected armed session, got {:?}", other),
        }
    }

    #[wasm_bindgen_test]
    fn test_activity_restarts_countdown() {
        let window = dom::window().unwrap();
        let document = dom::document().unwrap();
        let session = SessionTimeout::start(&window, &document, &ClientConfig::default()).unwrap();
        let first = generation(session.state());

        document.dispatch_event(&Event::new("mousemove").unwrap()).unwrap();
        document.dispatch_event(&Event::new("keypress").unwrap()).unwrap();
        assert_eq!(generation(session.state()), first + 2);

        // Events outside the configured list are not activity
        document.dispatch_event(&Event::new("focus").unwrap()).unwrap();
        assert_eq!(generation(session.state()), first + 2);
    }

    #[wasm_bindgen_test]
    fn test_early_wake_keeps_a_countdown_pending() {
        let window = dom::window().unwrap();
        let document = dom::document().unwrap();
        let session = SessionTimeout::start(&window, &document, &ClientConfig::default()).unwrap();
        let live = generation(session.state());

        // Deadline is still 30 minutes away, so the guard must re-arm itself
        session.inner.timer.borrow_mut().take();
        session.inner.expire(live);

        assert_eq!(generation(session.state()), live);
        assert!(session.inner.timer.borrow().is_some());
    }

    #[wasm_bindgen_test]
    fn test_dropping_guard_detaches_listeners() {
        let window = dom::window().unwrap();
        let document = dom::document().unwrap();
        let session = SessionTimeout::start(&window, &document, &ClientConfig::default()).unwrap();
        let inner = Rc::downgrade(&session.inner);
        drop(session);
        assert!(inner.upgrade().is_none());
        document.dispatch_event(&Event::new("mousedown").unwrap()).unwrap();
    }
}
