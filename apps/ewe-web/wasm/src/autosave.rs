//! Debounced drafts for `form[data-autosave]`

use crate::dom::{self, Listener, LocalStore};
use ewe_client_core::{ClientConfig, Debouncer, DraftRecord, DraftStore};
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

const INDICATOR_SELECTOR: &str = ".save-indicator";
const INDICATOR_CLASSES: &str =
    "save-indicator fixed bottom-4 right-4 bg-green-500 text-white px-3 py-1 rounded text-sm";
const INDICATOR_TEXT: &str = "Auto-saved";

/// Input types that never carry form data
const SKIPPED_INPUT_TYPES: [&str; 5] = ["submit", "button", "reset", "image", "file"];

pub type Drafts = DraftStore<LocalStore>;

struct AutoSaveState {
    form: HtmlFormElement,
    drafts: Rc<Drafts>,
    debouncer: RefCell<Debouncer>,
    pending: RefCell<Option<Timeout>>,
    indicator_timer: RefCell<Option<Timeout>>,
    indicator_ms: u32,
}

/// Autosave for one form; dropping it cancels the pending write
pub struct AutoSave {
    state: Rc<AutoSaveState>,
    _listeners: Vec<Listener>,
}

impl AutoSave {
    /// Watch `form` for input.
    ///
    /// Attach after validation so the submit handler sees whether the
    /// submission was cancelled.
    pub fn attach(form: &HtmlFormElement, drafts: Rc<Drafts>, config: &ClientConfig) -> Result<Self, JsValue> {
        let state = Rc::new(AutoSaveState {
            form: form.clone(),
            drafts,
            debouncer: RefCell::new(Debouncer::new(config.autosave_quiet())),
            pending: RefCell::new(None),
            indicator_timer: RefCell::new(None),
            indicator_ms: config.save_indicator_ms,
        });

        let on_input = Rc::downgrade(&state);
        let input = Listener::new(form, "input", move |_event: Event| {
            if let Some(state) = on_input.upgrade() {
                state.schedule(Rc::downgrade(&state));
            }
        })?;

        let on_submit = Rc::downgrade(&state);
        let submit = Listener::new(form, "submit", move |event: Event| {
            if event.default_prevented() {
                return;
            }
            if let Some(state) = on_submit.upgrade() {
                state.discard();
            }
        })?;

        Ok(Self {
            state,
            _listeners: vec![input, submit],
        })
    }

    pub fn form_id(&self) -> String {
        self.state.form.id()
    }
}

impl AutoSaveState {
    fn schedule(&self, weak: Weak<AutoSaveState>) {
        let generation = self.debouncer.borrow_mut().trigger();
        let quiet_ms = self.debouncer.borrow().quiet().as_millis() as u32;

        let timeout = Timeout::new(quiet_ms, move || {
            if let Some(state) = weak.upgrade() {
                if state.debouncer.borrow_mut().fire(generation) {
                    state.save(Rc::downgrade(&state));
                }
            }
        });
        // Replacing the handle cancels the previous timer
        *self.pending.borrow_mut() = Some(timeout);
    }

    fn save(&self, weak: Weak<AutoSaveState>) {
        let result = snapshot(&self.form)
            .and_then(|record| self.drafts.save(&record).map_err(dom::to_js));
        match result {
            Ok(()) => {
                if let Err(err) = self.show_indicator(weak) {
                    dom::error("Failed to show save indicator:", &err);
                }
            }
            Err(err) => dom::error("Auto-save failed:", &err),
        }
    }

    fn show_indicator(&self, weak: Weak<AutoSaveState>) -> Result<(), JsValue> {
        let indicator = self.indicator()?;
        indicator.style().set_property("display", "block")?;

        let timeout = Timeout::new(self.indicator_ms, move || {
            if let Some(state) = weak.upgrade() {
                let hidden = state
                    .indicator()
                    .and_then(|indicator| indicator.style().set_property("display", "none"));
                dom::report("Failed to hide save indicator:", hidden);
            }
        });
        *self.indicator_timer.borrow_mut() = Some(timeout);
        Ok(())
    }

    /// The form's indicator, created on first use
    fn indicator(&self) -> Result<HtmlElement, JsValue> {
        if let Some(existing) = self.form.query_selector(INDICATOR_SELECTOR)? {
            return dom::as_html(&existing);
        }
        let document = dom::document()?;
        let indicator = document.create_element("div")?;
        indicator.set_class_name(INDICATOR_CLASSES);
        indicator.set_text_content(Some(INDICATOR_TEXT));
        self.form.append_child(&indicator)?;
        dom::as_html(&indicator)
    }

    /// Successful submission: drop the pending write and the stored draft
    fn discard(&self) {
        self.debouncer.borrow_mut().cancel();
        self.pending.borrow_mut().take();
        let form_id = self.form.id();
        if let Err(err) = self.drafts.clear(Some(&form_id)) {
            dom::warn(&format!("Failed to clear draft {}: {}", form_id, err));
        }
    }
}

/// Name and value a control contributes to a draft, if any
fn control_entry(element: &Element) -> Option<(String, String)> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        let kind = input.type_().to_ascii_lowercase();
        if input.disabled() || SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
            return None;
        }
        if (kind == "checkbox" || kind == "radio") && !input.checked() {
            return None;
        }
        return Some((input.name(), input.value()));
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return (!select.disabled()).then(|| (select.name(), select.value()));
    }
    if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        return (!textarea.disabled()).then(|| (textarea.name(), textarea.value()));
    }
    None
}

/// Current values of every named, enabled control
pub fn snapshot(form: &HtmlFormElement) -> Result<DraftRecord, JsValue> {
    let id = form.id();
    let mut record = DraftRecord::new(Some(&id));
    for control in dom::query_all_in(form, "input, select, textarea")? {
        if let Some((name, value)) = control_entry(&control) {
            if !name.is_empty() {
                record.insert(name, value);
            }
        }
    }
    Ok(record)
}
