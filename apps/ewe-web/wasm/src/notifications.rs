//! Toast notifications
//!
//! Each notification is a card in a fixed stack container. The card slides in
//! after the enter delay, slides out when its duration elapses and is
//! detached once the exit animation has had time to run. Persistent cards
//! (duration 0) stay until their close button is clicked.
//!
//! The stack is bounded: showing a notification past the cap detaches the
//! oldest card at once and cancels its timers.

use crate::dom::{self, Listener};
use ewe_client_core::notify::{NotificationId, Timeline};
use ewe_client_core::{ClientConfig, Notification, NotificationStack};
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event};

pub const STACK_ID: &str = "ewe-notification-stack";
const STACK_CLASSES: &str = "fixed top-4 right-4 z-50 flex flex-col gap-2 w-full max-w-sm pointer-events-none";
const CARD_CLASSES: &str = "max-w-sm w-full bg-white shadow-lg rounded-lg pointer-events-auto ring-1 ring-black ring-opacity-5 transform transition-all duration-300 translate-x-full";
const OFFSCREEN_CLASS: &str = "translate-x-full";
const ID_ATTRIBUTE: &str = "data-notification-id";

struct Entry {
    element: Element,
    _timers: Vec<Timeout>,
    _close: Listener,
}

struct PresenterInner {
    stack: RefCell<NotificationStack>,
    entries: RefCell<HashMap<NotificationId, Entry>>,
    enter_delay_ms: u32,
    exit_delay_ms: u32,
    default_duration_ms: u32,
}

#[derive(Clone)]
pub struct NotificationPresenter {
    inner: Rc<PresenterInner>,
}

impl NotificationPresenter {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            inner: Rc::new(PresenterInner {
                stack: RefCell::new(NotificationStack::new(config.max_notifications)),
                entries: RefCell::new(HashMap::new()),
                enter_delay_ms: config.notification_enter_delay_ms,
                exit_delay_ms: config.notification_exit_delay_ms,
                default_duration_ms: config.notification_duration_ms,
            }),
        }
    }

    pub fn default_duration_ms(&self) -> u32 {
        self.inner.default_duration_ms
    }

    /// Number of cards currently attached
    pub fn len(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a card and schedule its lifecycle
    pub fn show(&self, notification: &Notification) -> Result<NotificationId, JsValue> {
        let document = dom::document()?;
        let (id, evicted) = self.inner.stack.borrow_mut().push();
        for old in evicted {
            self.inner.detach(old);
        }

        let (card, close_button) = build_card(&document, id, notification)?;
        stack_container(&document)?.append_child(&card)?;

        let weak = Rc::downgrade(&self.inner);
        let close = Listener::new(&close_button, "click", move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                inner.dismiss(id);
            }
        })?;

        let timeline = notification.timeline(self.inner.enter_delay_ms, self.inner.exit_delay_ms);
        let timers = schedule(&self.inner, id, &card, timeline);

        self.inner.entries.borrow_mut().insert(
            id,
            Entry {
                element: card,
                _timers: timers,
                _close: close,
            },
        );
        Ok(id)
    }

    /// Detach a card now; false if it was already gone
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.inner.dismiss(id)
    }

    /// Detach every card
    pub fn clear(&self) {
        let ids: Vec<NotificationId> = self.inner.entries.borrow().keys().copied().collect();
        for id in ids {
            self.inner.dismiss(id);
        }
    }
}

impl PresenterInner {
    fn dismiss(&self, id: NotificationId) -> bool {
        self.stack.borrow_mut().remove(id);
        self.detach(id)
    }

    /// Remove the element and drop its timers
    fn detach(&self, id: NotificationId) -> bool {
        let entry = self.entries.borrow_mut().remove(&id);
        match entry {
            Some(entry) => {
                entry.element.remove();
                true
            }
            None => false,
        }
    }
}

fn schedule(inner: &Rc<PresenterInner>, id: NotificationId, card: &Element, timeline: Timeline) -> Vec<Timeout> {
    let mut timers = Vec::with_capacity(3);

    let entering = card.clone();
    timers.push(Timeout::new(timeline.enter_at_ms, move || {
        dom::report("Failed to slide notification in:", entering.class_list().remove_1(OFFSCREEN_CLASS));
    }));

    if let Some(exit_at) = timeline.exit_at_ms {
        let leaving = card.clone();
        timers.push(Timeout::new(exit_at, move || {
            dom::report("Failed to slide notification out:", leaving.class_list().add_1(OFFSCREEN_CLASS));
        }));
    }

    if let Some(remove_at) = timeline.remove_at_ms {
        let weak: Weak<PresenterInner> = Rc::downgrade(inner);
        timers.push(Timeout::new(remove_at, move || {
            if let Some(inner) = weak.upgrade() {
                inner.dismiss(id);
            }
        }));
    }

    timers
}

fn stack_container(document: &Document) -> Result<Element, JsValue> {
    if let Some(existing) = document.get_element_by_id(STACK_ID) {
        return Ok(existing);
    }
    let container = document.create_element("div")?;
    container.set_id(STACK_ID);
    container.set_class_name(STACK_CLASSES);
    dom::body(document)?.append_child(&container)?;
    Ok(container)
}

/// Card element and its close button; the message is set as text
fn build_card(document: &Document, id: NotificationId, notification: &Notification) -> Result<(Element, Element), JsValue> {
    let card = document.create_element("div")?;
    card.set_class_name(CARD_CLASSES);
    card.set_attribute(ID_ATTRIBUTE, &id.to_string())?;
    card.set_attribute("role", "status")?;

    let body = document.create_element("div")?;
    body.set_class_name(&format!("p-4 {} border-l-4 rounded", notification.severity.classes()));

    let row = document.create_element("div")?;
    row.set_class_name("flex items-center");

    let text_box = document.create_element("div")?;
    text_box.set_class_name("flex-1");
    let message = document.create_element("p")?;
    message.set_class_name("text-sm font-medium");
    message.set_text_content(Some(&notification.message));
    text_box.append_child(&message)?;

    let close = document.create_element("button")?;
    close.set_attribute("type", "button")?;
    close.set_attribute("aria-label", "Close")?;
    close.set_class_name("ml-4 text-gray-400 hover:text-gray-600");
    let icon = document.create_element("i")?;
    icon.set_class_name("fas fa-times");
    close.append_child(&icon)?;

    row.append_child(&text_box)?;
    row.append_child(&close)?;
    body.append_child(&row)?;
    card.append_child(&body)?;

    Ok((card, close))
}
