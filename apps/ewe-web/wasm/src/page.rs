//! Smaller page behaviours wired through data attributes
//!
//! - `[data-theme-toggle]` flips the light/dark theme
//! - `[data-modal-open="id"]` / `[data-modal-close="id"]`, Escape closes all
//! - `[data-dropdown-toggle]` toggles `#dropdown`, outside clicks hide it
//! - `[data-tooltip]` shows a tooltip above the element while hovered
//! - `[data-copy]` copies its value (or text) to the clipboard
//! - `[data-confirm]` asks before letting the click through

use crate::dom::{self, Listener, LocalStore};
use crate::notifications::NotificationPresenter;
use ewe_client_core::theme::{DARK_CLASS, THEME_KEY};
use ewe_client_core::user::USER_DATA_ELEMENT_ID;
use ewe_client_core::{CurrentUser, KeyValueStore, Notification, Severity, Theme};
use js_sys::{Function, Promise, Reflect};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, Event, HtmlDocument, HtmlTextAreaElement, KeyboardEvent, Node, Window};

const HIDDEN_CLASS: &str = "hidden";
const DROPDOWN_ID: &str = "dropdown";
const OPEN_MODALS: &str = ".modal-overlay:not(.hidden)";
const FOCUSABLE: &str = "input, button, select, textarea, [tabindex]:not([tabindex=\"-1\"])";
const TOOLTIP_CLASSES: &str = "absolute bg-gray-800 text-white px-2 py-1 rounded text-xs z-50 tooltip";
const DEFAULT_CONFIRM: &str = "Are you sure?";
const COPIED_MESSAGE: &str = "Copied to clipboard!";
const COPY_FAILED_MESSAGE: &str = "Could not copy to clipboard";

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

pub fn load_theme(store: &LocalStore) -> Theme {
    match store.get(THEME_KEY) {
        Ok(stored) => Theme::from_stored(stored.as_deref()),
        Err(err) => {
            dom::warn(&format!("Could not read theme: {}", err));
            Theme::default()
        }
    }
}

/// Set the `<html>` class and remember the choice
pub fn apply_theme(document: &Document, store: &LocalStore, theme: Theme) -> Result<(), JsValue> {
    let root = document
        .document_element()
        .ok_or_else(|| JsValue::from_str("No root element"))?;
    if theme.is_dark() {
        root.class_list().add_1(DARK_CLASS)?;
    } else {
        root.class_list().remove_1(DARK_CLASS)?;
    }
    store.set(THEME_KEY, theme.as_str()).map_err(dom::to_js)
}

pub fn current_theme(document: &Document) -> Theme {
    let dark = document
        .document_element()
        .map_or(false, |root| root.class_list().contains(DARK_CLASS));
    if dark {
        Theme::Dark
    } else {
        Theme::Light
    }
}

pub fn toggle_theme(document: &Document, store: &LocalStore) -> Result<Theme, JsValue> {
    let next = current_theme(document).toggled();
    apply_theme(document, store, next)?;
    Ok(next)
}

// ---------------------------------------------------------------------------
// Modals
// ---------------------------------------------------------------------------

/// Show a modal, lock page scroll and focus its first control
pub fn open_modal(document: &Document, id: &str) -> Result<bool, JsValue> {
    let Some(modal) = document.get_element_by_id(id) else {
        return Ok(false);
    };
    modal.class_list().remove_1(HIDDEN_CLASS)?;
    dom::body(document)?.style().set_property("overflow", "hidden")?;

    if let Some(first) = modal.query_selector(FOCUSABLE)? {
        dom::as_html(&first)?.focus()?;
    }
    Ok(true)
}

pub fn close_modal(document: &Document, id: &str) -> Result<bool, JsValue> {
    let Some(modal) = document.get_element_by_id(id) else {
        return Ok(false);
    };
    modal.class_list().add_1(HIDDEN_CLASS)?;
    dom::body(document)?.style().set_property("overflow", "")?;
    Ok(true)
}

/// Hide every open modal overlay
pub fn close_open_modals(document: &Document) -> Result<usize, JsValue> {
    let open = dom::query_all(document, OPEN_MODALS)?;
    for modal in &open {
        modal.class_list().add_1(HIDDEN_CLASS)?;
    }
    dom::body(document)?.style().set_property("overflow", "")?;
    Ok(open.len())
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

async fn write_clipboard(window: &Window, text: &str) -> Result<(), JsValue> {
    let clipboard = Reflect::get(&window.navigator(), &"clipboard".into())?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(JsValue::from_str("Clipboard API unavailable"));
    }
    let write: Function = Reflect::get(&clipboard, &"writeText".into())?.dyn_into()?;
    let promise: Promise = write.call1(&clipboard, &JsValue::from_str(text))?.dyn_into()?;
    JsFuture::from(promise).await?;
    Ok(())
}

/// Older browsers: select a hidden textarea and run the copy command
fn copy_with_textarea(document: &Document, text: &str) -> Result<(), JsValue> {
    let html = document
        .dyn_ref::<HtmlDocument>()
        .ok_or_else(|| JsValue::from_str("Not an HTML document"))?;
    let textarea: HtmlTextAreaElement = document.create_element("textarea")?.dyn_into()?;
    textarea.set_value(text);
    textarea.set_attribute("readonly", "")?;
    let style = textarea.style();
    style.set_property("position", "fixed")?;
    style.set_property("opacity", "0")?;

    dom::body(document)?.append_child(&textarea)?;
    textarea.select();
    let copied = html.exec_command("copy");
    textarea.remove();

    match copied {
        Ok(true) => Ok(()),
        Ok(false) => Err(JsValue::from_str("copy command was rejected")),
        Err(err) => Err(err),
    }
}

/// Copy `text`, then tell the user how it went
pub async fn copy_text(presenter: &NotificationPresenter, text: &str, notice_ms: u32) -> Result<bool, JsValue> {
    let window = dom::window()?;
    let document = dom::document()?;

    let result = match write_clipboard(&window, text).await {
        Ok(()) => Ok(()),
        Err(err) => {
            dom::warn(&format!("Clipboard API failed, using fallback: {}", dom::describe(&err)));
            copy_with_textarea(&document, text)
        }
    };

    match result {
        Ok(()) => {
            presenter.show(&Notification::new(COPIED_MESSAGE, Severity::Success, notice_ms))?;
            Ok(true)
        }
        Err(err) => {
            dom::error("Copy failed:", &err);
            presenter.show(&Notification::new(COPY_FAILED_MESSAGE, Severity::Error, notice_ms))?;
            Ok(false)
        }
    }
}

/// Value a `[data-copy]` element copies
pub fn copy_source(element: &Element) -> String {
    match element.get_attribute("data-copy") {
        Some(value) if !value.is_empty() => value,
        _ => element.text_content().unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Tooltips
// ---------------------------------------------------------------------------

fn show_tooltip(window: &Window, document: &Document, element: &Element) -> Result<(), JsValue> {
    let text = element.get_attribute("data-tooltip").unwrap_or_default();
    let tooltip = document.create_element("div")?;
    tooltip.set_class_name(TOOLTIP_CLASSES);
    tooltip.set_text_content(Some(&text));
    dom::body(document)?.append_child(&tooltip)?;

    let tooltip = dom::as_html(&tooltip)?;
    let rect = element.get_bounding_client_rect();
    let left = rect.left() + rect.width() / 2.0 - f64::from(tooltip.offset_width()) / 2.0 + window.scroll_x()?;
    let top = rect.top() - f64::from(tooltip.offset_height()) - 5.0 + window.scroll_y()?;
    let style = tooltip.style();
    style.set_property("left", &format!("{}px", left))?;
    style.set_property("top", &format!("{}px", top))?;
    Ok(())
}

pub fn hide_tooltips(document: &Document) -> Result<(), JsValue> {
    for tooltip in dom::query_all(document, ".tooltip")? {
        tooltip.remove();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Current user
// ---------------------------------------------------------------------------

pub fn load_current_user(document: &Document) -> Option<CurrentUser> {
    let text = document.get_element_by_id(USER_DATA_ELEMENT_ID)?.text_content()?;
    let user = CurrentUser::from_embedded(&text);
    if user.is_none() {
        dom::warn("Error parsing user data");
    }
    user
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn on_each<F>(document: &Document, selector: &str, event: &str, listeners: &mut Vec<Listener>, handler: F) -> Result<(), JsValue>
where
    F: Fn(&Element, Event) + Clone + 'static,
{
    for element in dom::query_all(document, selector)? {
        let handler = handler.clone();
        let target = element.clone();
        listeners.push(Listener::new(&element, event, move |event: Event| handler(&target, event))?);
    }
    Ok(())
}

/// Listeners for the data-attribute behaviours above
pub struct PageControls {
    _listeners: Vec<Listener>,
}

impl PageControls {
    pub fn attach(
        document: &Document,
        store: Rc<LocalStore>,
        presenter: NotificationPresenter,
        copy_notice_ms: u32,
    ) -> Result<Self, JsValue> {
        let mut listeners = Vec::new();

        let page = document.clone();
        on_each(document, "[data-theme-toggle]", "click", &mut listeners, move |_, _| {
            if let Err(err) = toggle_theme(&page, &store) {
                dom::error("Theme toggle failed:", &err);
            }
        })?;

        let page = document.clone();
        on_each(document, "[data-modal-open]", "click", &mut listeners, move |element, event| {
            if let Some(id) = element.get_attribute("data-modal-open") {
                event.prevent_default();
                if let Err(err) = open_modal(&page, &id) {
                    dom::error("Failed to open modal:", &err);
                }
            }
        })?;

        let page = document.clone();
        on_each(document, "[data-modal-close]", "click", &mut listeners, move |element, event| {
            if let Some(id) = element.get_attribute("data-modal-close") {
                event.prevent_default();
                if let Err(err) = close_modal(&page, &id) {
                    dom::error("Failed to close modal:", &err);
                }
            }
        })?;

        let page = document.clone();
        listeners.push(Listener::new(document, "keydown", move |event: Event| {
            let escape = event
                .dyn_ref::<KeyboardEvent>()
                .map_or(false, |key| key.key() == "Escape");
            if escape {
                if let Err(err) = close_open_modals(&page) {
                    dom::error("Failed to close modals:", &err);
                }
            }
        })?);

        let page = document.clone();
        on_each(document, "[data-dropdown-toggle]", "click", &mut listeners, move |_, _| {
            if let Some(dropdown) = page.get_element_by_id(DROPDOWN_ID) {
                dom::report("Failed to toggle dropdown:", dropdown.class_list().toggle(HIDDEN_CLASS));
            }
        })?;

        let page = document.clone();
        listeners.push(Listener::new(document, "click", move |event: Event| {
            let Some(dropdown) = page.get_element_by_id(DROPDOWN_ID) else {
                return;
            };
            let Some(target) = event_element(&event) else {
                return;
            };
            let on_trigger = target.closest("[data-dropdown-toggle]").ok().flatten().is_some();
            let inside = dropdown.contains(Some(target.unchecked_ref::<Node>()));
            if !on_trigger && !inside {
                dom::report("Failed to close dropdown:", dropdown.class_list().add_1(HIDDEN_CLASS));
            }
        })?);

        let page = document.clone();
        on_each(document, "[data-tooltip]", "mouseenter", &mut listeners, move |element, _| {
            let shown = dom::window().and_then(|window| show_tooltip(&window, &page, element));
            if let Err(err) = shown {
                dom::error("Failed to show tooltip:", &err);
            }
        })?;

        let page = document.clone();
        on_each(document, "[data-tooltip]", "mouseleave", &mut listeners, move |_, _| {
            dom::report("Failed to hide tooltips:", hide_tooltips(&page));
        })?;

        on_each(document, "[data-copy]", "click", &mut listeners, move |element, _| {
            let text = copy_source(element);
            let presenter = presenter.clone();
            spawn_local(async move {
                if let Err(err) = copy_text(&presenter, &text, copy_notice_ms).await {
                    dom::error("Copy failed:", &err);
                }
            });
        })?;

        on_each(document, "[data-confirm]", "click", &mut listeners, |element, event| {
            let message = match element.get_attribute("data-confirm") {
                Some(message) if !message.is_empty() => message,
                _ => DEFAULT_CONFIRM.to_string(),
            };
            let confirmed = dom::window()
                .and_then(|window| window.confirm_with_message(&message))
                .unwrap_or(false);
            if !confirmed {
                event.prevent_default();
            }
        })?;

        Ok(Self {
            _listeners: listeners,
        })
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount(html: &str) -> Element {
        let document = dom::document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(html);
        dom::body(&document).unwrap().append_child(&root).unwrap();
        root
    }

    #[wasm_bindgen_test]
    fn test_theme_toggle_persists() {
        let document = dom::document().unwrap();
        let store = LocalStore::open(&dom::window().unwrap());
        apply_theme(&document, &store, Theme::Light).unwrap();

        assert_eq!(toggle_theme(&document, &store).unwrap(), Theme::Dark);
        assert!(document.document_element().unwrap().class_list().contains(DARK_CLASS));
        assert_eq!(load_theme(&store), Theme::Dark);

        assert_eq!(toggle_theme(&document, &store).unwrap(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[wasm_bindgen_test]
    fn test_modal_open_close_and_escape() {
        let root = mount(
            r#"<div id="withdraw-modal" class="modal-overlay hidden"><button id="first">OK</button></div>
               <div id="other-modal" class="modal-overlay"></div>"#,
        );
        let document = dom::document().unwrap();
        let body = dom::body(&document).unwrap();

        assert!(open_modal(&document, "withdraw-modal").unwrap());
        let modal = document.get_element_by_id("withdraw-modal").unwrap();
        assert!(!modal.class_list().contains(HIDDEN_CLASS));
        assert_eq!(body.style().get_property_value("overflow").unwrap(), "hidden");
        assert_eq!(document.active_element().map(|el| el.id()), Some("first".to_string()));

        assert_eq!(close_open_modals(&document).unwrap(), 2);
        assert!(modal.class_list().contains(HIDDEN_CLASS));
        assert_eq!(body.style().get_property_value("overflow").unwrap(), "");

        assert!(!open_modal(&document, "missing-modal").unwrap());
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_copy_source_prefers_attribute() {
        let root = mount(r#"<button data-copy="EWE1001">Copy</button><span data-copy="">REF-9</span>"#);
        let items = dom::query_all_in(&root, "[data-copy]").unwrap();
        assert_eq!(copy_source(&items[0]), "EWE1001");
        assert_eq!(copy_source(&items[1]), "REF-9");
        root.remove();
    }

    #[wasm_bindgen_test]
    fn test_user_data_parsed_once() {
        let root = mount(r#"<script type="application/json" id="user-data">{"id": 7, "username": "EWE1007"}</script>"#);
        let user = load_current_user(&dom::document().unwrap()).unwrap();
        assert_eq!(user.username.as_deref(), Some("EWE1007"));
        root.remove();
        assert!(load_current_user(&dom::document().unwrap()).is_none());
    }

    #[wasm_bindgen_test]
    fn test_dropdown_outside_click_hides() {
        let root = mount(
            r#"<button data-dropdown-toggle>Menu</button>
               <div id="dropdown" class="hidden"><a id="inside">Item</a></div>
               <p id="outside">Elsewhere</p>"#,
        );
        let document = dom::document().unwrap();
        let store = Rc::new(LocalStore::open(&dom::window().unwrap()));
        let presenter = NotificationPresenter::new(&ewe_client_core::ClientConfig::default());
        let _controls = PageControls::attach(&document, store, presenter, 2000).unwrap();

        let click = |id: &str| {
            let target = document.query_selector(id).unwrap().unwrap();
            dom::as_html(&target).unwrap().click();
        };
        let dropdown = document.get_element_by_id("dropdown").unwrap();

        click("[data-dropdown-toggle]");
        assert!(!dropdown.class_list().contains(HIDDEN_CLASS));
        click("#inside");
        assert!(!dropdown.class_list().contains(HIDDEN_CLASS));
        click("#outside");
        assert!(dropdown.class_list().contains(HIDDEN_CLASS));
        root.remove();
    }
}
