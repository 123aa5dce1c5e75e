//! Periodic balance and notification refresh

use crate::dom;
use crate::http::HttpClient;
use crate::notifications::NotificationPresenter;
use ewe_client_core::{BalanceEnvelope, ClientConfig, NotificationEnvelope, PollCycle, PollKind};
use gloo_timers::callback::Interval;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

const BALANCE_SELECTOR: &str = "[data-balance]";
const BALANCE_ATTRIBUTE: &str = "data-balance";

type Apply = Rc<dyn Fn(&str) -> Result<usize, JsValue>>;

struct CycleHandle {
    cycle: Rc<RefCell<PollCycle>>,
    timer: Option<Interval>,
}

impl CycleHandle {
    fn start(kind: PollKind, config: &ClientConfig, url: String, http: HttpClient, apply: Apply) -> Self {
        let period = match kind {
            PollKind::Balances => config.balance_period(),
            PollKind::Notifications => config.notification_period(),
        };
        let cycle = Rc::new(RefCell::new(PollCycle::new(kind, period)));

        let tick_cycle = cycle.clone();
        let tick = move || {
            let Some(sequence) = tick_cycle.borrow_mut().begin_tick() else {
                return;
            };
            let cycle = tick_cycle.clone();
            let http = http.clone();
            let url = url.clone();
            let apply = apply.clone();

            spawn_local(async move {
                let result = http.get_text(&url).await;
                let mut state = cycle.borrow_mut();
                let current = state.finish_tick(sequence);
                match result {
                    Ok(body) if current => match apply(&body) {
                        Ok(_) => state.record_applied(),
                        Err(err) => {
                            state.record_failure();
                            dom::error(&format!("Error applying {} update:", kind), &err);
                        }
                    },
                    // Superseded or stopped while in flight
                    Ok(_) => {}
                    Err(err) => {
                        state.record_failure();
                        dom::error(&format!("Error updating {}:", kind), &err);
                    }
                }
            });
        };

        Self {
            cycle,
            timer: Some(Interval::new(period.as_millis() as u32, tick)),
        }
    }

    fn stop(&mut self) {
        self.cycle.borrow_mut().stop();
        // Dropping the interval clears it
        self.timer.take();
    }
}

/// The running refresh cycles; each can be stopped independently
pub struct LiveUpdates {
    balances: Option<CycleHandle>,
    notifications: CycleHandle,
}

impl LiveUpdates {
    /// Start notifications always, balances only when the page shows one
    pub fn start(
        config: &ClientConfig,
        document: &Document,
        http: HttpClient,
        presenter: NotificationPresenter,
    ) -> Result<Self, JsValue> {
        let balances = if document.query_selector(BALANCE_SELECTOR)?.is_some() {
            let page = document.clone();
            let apply: Apply = Rc::new(move |body: &str| apply_balances(&page, body));
            Some(CycleHandle::start(
                PollKind::Balances,
                config,
                config.balance_endpoint.clone(),
                http.clone(),
                apply,
            ))
        } else {
            None
        };

        let apply: Apply = Rc::new(move |body: &str| apply_notifications(&presenter, body));
        let notifications = CycleHandle::start(
            PollKind::Notifications,
            config,
            config.notifications_endpoint.clone(),
            http,
            apply,
        );

        Ok(Self {
            balances,
            notifications,
        })
    }

    fn handle(&self, kind: PollKind) -> Option<&CycleHandle> {
        match kind {
            PollKind::Balances => self.balances.as_ref(),
            PollKind::Notifications => Some(&self.notifications),
        }
    }

    pub fn is_running(&self, kind: PollKind) -> bool {
        self.handle(kind)
            .map_or(false, |handle| !handle.cycle.borrow().is_stopped())
    }

    pub fn stop_cycle(&mut self, kind: PollKind) {
        let handle = match kind {
            PollKind::Balances => self.balances.as_mut(),
            PollKind::Notifications => Some(&mut self.notifications),
        };
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    pub fn stop(&mut self) {
        self.stop_cycle(PollKind::Balances);
        self.stop_cycle(PollKind::Notifications);
    }
}

/// Write formatted balances into every matching element
pub fn apply_balances(document: &Document, body: &str) -> Result<usize, JsValue> {
    let updates = BalanceEnvelope::parse(body).map_err(dom::to_js)?.updates();
    if updates.is_empty() {
        return Ok(0);
    }

    let mut touched = 0;
    for element in dom::query_all(document, BALANCE_SELECTOR)? {
        let Some(key) = element.get_attribute(BALANCE_ATTRIBUTE) else {
            continue;
        };
        if let Some(update) = updates.iter().find(|update| update.key == key) {
            element.set_text_content(Some(&update.text));
            touched += 1;
        }
    }
    Ok(touched)
}

/// Show each server notification in order
pub fn apply_notifications(presenter: &NotificationPresenter, body: &str) -> Result<usize, JsValue> {
    let notifications = NotificationEnvelope::parse(body)
        .map_err(dom::to_js)?
        .into_notifications(presenter.default_duration_ms());
    for notification in &notifications {
        presenter.show(notification)?;
    }
    Ok(notifications.len())
}
