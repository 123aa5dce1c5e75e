//! Application context owning every page component

use crate::autosave::{AutoSave, Drafts};
use crate::dom::{self, Listener, LocalStore};
use crate::forms::{self, FormValidation};
use crate::http::HttpClient;
use crate::notifications::NotificationPresenter;
use crate::page::{self, PageControls};
use crate::poller::LiveUpdates;
use crate::session_guard::SessionTimeout;
use ewe_client_core::config::CONFIG_ELEMENT_ID;
use ewe_client_core::{
    format_currency, format_date, ClientConfig, CurrentUser, DraftStore, Notification, RuleSet, Severity,
};
use js_sys::Promise;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Document, Event, HtmlFormElement};

/// Longest delay `setTimeout` honours before firing immediately
const MAX_TIMER_MS: u32 = i32::MAX as u32;

/// Display time from a JS number: zero, negative or NaN means persistent
pub(crate) fn duration_from_js(duration_ms: Option<f64>, default_duration_ms: u32) -> u32 {
    match duration_ms {
        None => default_duration_ms,
        Some(ms) if ms.is_nan() || ms <= 0.0 => 0,
        Some(ms) => ms.min(f64::from(MAX_TIMER_MS)) as u32,
    }
}

/// Notification built from loosely typed JS arguments
pub(crate) fn notification_from_args(
    message: String,
    kind: Option<&str>,
    duration_ms: Option<f64>,
    default_duration_ms: u32,
) -> Notification {
    let severity = kind.map(Severity::parse_lossy).unwrap_or_default();
    Notification::new(message, severity, duration_from_js(duration_ms, default_duration_ms))
}

/// Embedded overrides, or defaults when absent or invalid
pub(crate) fn config_from_text(text: Option<&str>) -> ClientConfig {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return ClientConfig::default();
    };
    match ClientConfig::from_json(text) {
        Ok(config) => config,
        Err(err) => {
            dom::warn(&format!("Ignoring invalid client config: {}", err));
            ClientConfig::default()
        }
    }
}

fn forms_matching(document: &Document, selector: &str) -> Result<Vec<HtmlFormElement>, JsValue> {
    Ok(dom::query_all(document, selector)?
        .into_iter()
        .filter_map(|element| element.dyn_into::<HtmlFormElement>().ok())
        .collect())
}

/// Everything the page runs, created once by [`boot`]
#[wasm_bindgen]
pub struct EweApp {
    config: ClientConfig,
    document: Document,
    store: Rc<LocalStore>,
    drafts: Rc<Drafts>,
    presenter: NotificationPresenter,
    http: HttpClient,
    live: Rc<RefCell<LiveUpdates>>,
    session: SessionTimeout,
    user: Option<CurrentUser>,
    _validations: Vec<FormValidation>,
    _autosaves: Vec<AutoSave>,
    _controls: PageControls,
    _pagehide: Listener,
}

/// Wire every component to the current page
#[wasm_bindgen]
pub fn boot() -> Result<EweApp, JsValue> {
    let window = dom::window()?;
    let document = dom::document()?;

    let config_text = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    let config = config_from_text(config_text.as_deref());

    let store = Rc::new(LocalStore::open(&window));
    let theme = page::load_theme(&store);
    if let Err(err) = page::apply_theme(&document, &store, theme) {
        dom::error("Failed to apply theme:", &err);
    }

    let presenter = NotificationPresenter::new(&config);
    let http = HttpClient::new(&window, &document)?;
    if !http.has_csrf_token() {
        dom::log("No CSRF token on page; state-changing requests will be sent without one");
    }

    // Validation first so autosave's submit handler sees cancelled submissions
    let rules = Rc::new(RuleSet::standard());
    let validations = forms_matching(&document, "form[data-validate]")?
        .iter()
        .map(|form| forms::attach_validation(form, rules.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let drafts = Rc::new(DraftStore::new(LocalStore::open(&window)));
    let autosaves = forms_matching(&document, "form[data-autosave]")?
        .iter()
        .map(|form| AutoSave::attach(form, drafts.clone(), &config))
        .collect::<Result<Vec<_>, _>>()?;

    let live = Rc::new(RefCell::new(LiveUpdates::start(
        &config,
        &document,
        http.clone(),
        presenter.clone(),
    )?));
    let session = SessionTimeout::start(&window, &document, &config)?;
    let controls = PageControls::attach(&document, store.clone(), presenter.clone(), config.copy_notice_ms)?;
    let user = page::load_current_user(&document);

    let on_hide = Rc::downgrade(&live);
    let pagehide = Listener::new(&window, "pagehide", move |_event: Event| {
        if let Some(live) = on_hide.upgrade() {
            live.borrow_mut().stop();
        }
    })?;

    dom::log(&format!(
        "EWE client initialized: {} validated forms, {} autosave forms",
        validations.len(),
        autosaves.len()
    ));

    Ok(EweApp {
        config,
        document,
        store,
        drafts,
        presenter,
        http,
        live,
        session,
        user,
        _validations: validations,
        _autosaves: autosaves,
        _controls: controls,
        _pagehide: pagehide,
    })
}

#[wasm_bindgen]
impl EweApp {
    /// Show a toast; `kind` is success/error/warning/info, unknown means info
    #[wasm_bindgen(js_name = showNotification)]
    pub fn show_notification(
        &self,
        message: String,
        kind: Option<String>,
        duration_ms: Option<f64>,
    ) -> Result<(), JsValue> {
        let notification = notification_from_args(
            message,
            kind.as_deref(),
            duration_ms,
            self.presenter.default_duration_ms(),
        );
        self.presenter.show(&notification).map(|_| ())
    }

    #[wasm_bindgen(js_name = openModal)]
    pub fn open_modal(&self, id: &str) -> Result<bool, JsValue> {
        page::open_modal(&self.document, id)
    }

    #[wasm_bindgen(js_name = closeModal)]
    pub fn close_modal(&self, id: &str) -> Result<bool, JsValue> {
        page::close_modal(&self.document, id)
    }

    /// Flip the theme and return the new one ("light" or "dark")
    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&self) -> Result<String, JsValue> {
        page::toggle_theme(&self.document, &self.store).map(|theme| theme.as_str().to_string())
    }

    #[wasm_bindgen(js_name = formatCurrency)]
    pub fn format_currency(&self, amount: f64) -> String {
        format_currency(amount)
    }

    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(&self, input: &str) -> Result<String, JsValue> {
        format_date(input).map_err(dom::to_js)
    }

    /// Resolves to `true` once copied, `false` if every method failed
    #[wasm_bindgen(js_name = copyToClipboard)]
    pub fn copy_to_clipboard(&self, text: String) -> Promise {
        let presenter = self.presenter.clone();
        let notice_ms = self.config.copy_notice_ms;
        future_to_promise(async move {
            page::copy_text(&presenter, &text, notice_ms)
                .await
                .map(JsValue::from_bool)
        })
    }

    /// Stored draft as a plain object, or `null`
    #[wasm_bindgen(js_name = restoreDraft)]
    pub fn restore_draft(&self, form_id: Option<String>) -> Result<JsValue, JsValue> {
        match self.drafts.load(form_id.as_deref()).map_err(dom::to_js)? {
            Some(record) => record
                .fields()
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = clearDraft)]
    pub fn clear_draft(&self, form_id: Option<String>) -> Result<(), JsValue> {
        self.drafts.clear(form_id.as_deref()).map_err(dom::to_js)
    }

    /// The embedded user, or `undefined` when the page has none
    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        match &self.user {
            Some(user) => user
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Fetch with the CSRF header where required; resolves to the body text
    pub fn send(&self, method: String, url: String, body: Option<String>) -> Promise {
        let http = self.http.clone();
        future_to_promise(async move { http.send(&method, &url, body).await.map(JsValue::from) })
    }

    #[wasm_bindgen(js_name = sessionState)]
    pub fn session_state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.state())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Stop both refresh cycles; also runs on `pagehide`
    pub fn shutdown(&self) {
        self.live.borrow_mut().stop();
        dom::log("EWE live updates stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_defaults() {
        let n = notification_from_args("Saved".to_string(), None, None, 5000);
        assert_eq!(n.severity, Severity::Info);
        assert_eq!(n.duration_ms, 5000);

        let n = notification_from_args("Oops".to_string(), Some("error"), Some(0.0), 5000);
        assert_eq!(n.severity, Severity::Error);
        assert!(n.is_persistent());
    }

    #[test]
    fn test_unknown_kind_is_info() {
        let n = notification_from_args("Hi".to_string(), Some("celebration"), Some(10.0), 5000);
        assert_eq!(n.severity, Severity::Info);
        assert_eq!(n.duration_ms, 10);
    }

    #[test]
    fn test_duration_from_js_number() {
        assert_eq!(duration_from_js(Some(-1.0), 5000), 0);
        assert_eq!(duration_from_js(Some(f64::NAN), 5000), 0);
        assert_eq!(duration_from_js(Some(1500.7), 5000), 1500);
        assert_eq!(duration_from_js(Some(1e12), 5000), MAX_TIMER_MS);
        assert_eq!(duration_from_js(Some(f64::INFINITY), 5000), MAX_TIMER_MS);
        assert_eq!(duration_from_js(None, 5000), 5000);
        assert!(notification_from_args("x".to_string(), None, Some(-250.0), 5000).is_persistent());
    }

    #[test]
    fn test_config_text_absent_or_blank() {
        assert_eq!(config_from_text(None), ClientConfig::default());
        assert_eq!(config_from_text(Some("\n  ")), ClientConfig::default());
        assert_eq!(
            config_from_text(Some(r#"{"max_notifications": 2}"#)).max_notifications,
            2
        );
    }
}
