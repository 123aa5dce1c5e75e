//! DOM plumbing shared by the page components

use ewe_client_core::{ClientError, FieldDescriptor, KeyValueStore};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, NodeList, Storage, Window,
};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object available"))
}

pub fn body(document: &Document) -> Result<HtmlElement, JsValue> {
    document
        .body()
        .ok_or_else(|| JsValue::from_str("No body element available"))
}

pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

pub fn error(message: &str, err: &JsValue) {
    web_sys::console::error_2(&message.into(), err);
}

/// Log a failed DOM call under `context` and keep going
pub fn report<T>(context: &str, result: Result<T, JsValue>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error(context, &err);
            None
        }
    }
}

/// Human-readable text for a thrown JS value
pub fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub fn to_js(err: ClientError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// All elements in the document matching `selector`
pub fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, JsValue> {
    Ok(elements(document.query_selector_all(selector)?))
}

/// All descendants of `root` matching `selector`
pub fn query_all_in(root: &Element, selector: &str) -> Result<Vec<Element>, JsValue> {
    Ok(elements(root.query_selector_all(selector)?))
}

pub fn as_html(element: &Element) -> Result<HtmlElement, JsValue> {
    element
        .clone()
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str("Element is not an HTMLElement"))
}

/// Read an `input`, `select` or `textarea` into a validator descriptor
pub fn field_descriptor(element: &Element) -> Option<FieldDescriptor> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(FieldDescriptor {
            input_type: input.type_(),
            name: input.name(),
            required: input.required(),
            value: input.value(),
        });
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(FieldDescriptor {
            input_type: select.type_(),
            name: select.name(),
            required: select.required(),
            value: select.value(),
        });
    }
    if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        return Some(FieldDescriptor {
            input_type: textarea.type_(),
            name: textarea.name(),
            required: textarea.required(),
            value: textarea.value(),
        });
    }
    None
}

/// An event listener that is unregistered when dropped
pub struct Listener {
    target: EventTarget,
    event: String,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new<F>(target: &EventTarget, event: &str, handler: F) -> Result<Self, JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event: event.to_string(),
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let removed = self
            .target
            .remove_event_listener_with_callback(&self.event, self.closure.as_ref().unchecked_ref());
        report("Failed to remove event listener:", removed);
    }
}

/// `window.localStorage`, or nothing when the browser refuses access
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn open(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                error("localStorage unavailable:", &err);
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, ClientError> {
        self.storage
            .as_ref()
            .ok_or_else(|| ClientError::Storage("localStorage unavailable".to_string()))
    }
}

fn storage_error(err: JsValue) -> ClientError {
    ClientError::Storage(describe(&err))
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> ewe_client_core::Result<Option<String>> {
        match &self.storage {
            Some(storage) => storage.get_item(key).map_err(storage_error),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> ewe_client_core::Result<()> {
        self.storage()?.set_item(key, value).map_err(storage_error)
    }

    fn remove(&self, key: &str) -> ewe_client_core::Result<()> {
        self.storage()?.remove_item(key).map_err(storage_error)
    }
}
