//! Fetch wrapper that attaches the CSRF header where the server expects it

use ewe_client_core::csrf::{self, CSRF_INPUT_NAME};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlInputElement, Request, RequestCredentials, RequestInit, RequestMode, Response, Url, Window};

/// Token rendered by the server into the page, if any
pub fn read_csrf_token(document: &Document) -> Option<String> {
    let selector = format!("[name={}]", CSRF_INPUT_NAME);
    let element = document.query_selector(&selector).ok().flatten()?;
    let token = element.dyn_ref::<HtmlInputElement>()?.value();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct HttpClient {
    window: Window,
    origin: String,
    csrf_token: Option<String>,
}

impl HttpClient {
    pub fn new(window: &Window, document: &Document) -> Result<Self, JsValue> {
        Ok(Self {
            window: window.clone(),
            origin: window.location().origin()?,
            csrf_token: read_csrf_token(document),
        })
    }

    pub fn has_csrf_token(&self) -> bool {
        self.csrf_token.is_some()
    }

    /// Resolve `url` against the page and compare origins
    pub fn is_same_origin(&self, url: &str) -> bool {
        Url::new_with_base(url, &self.origin)
            .map(|resolved| resolved.origin() == self.origin)
            .unwrap_or(false)
    }

    pub fn build_request(&self, method: &str, url: &str, body: Option<&str>) -> Result<Request, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        opts.set_credentials(RequestCredentials::SameOrigin);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(url, &opts)?;
        if body.is_some() {
            request.headers().set("Content-Type", "application/json")?;
        }
        let same_origin = self.is_same_origin(url);
        if let Some((name, token)) = csrf::header_for(method, same_origin, self.csrf_token.as_deref()) {
            request.headers().set(name, token)?;
        }
        Ok(request)
    }

    /// Send a request and read the body as text; non-2xx is an error
    pub async fn fetch_text(&self, request: &Request) -> Result<String, JsValue> {
        let response = JsFuture::from(self.window.fetch_with_request(request)).await?;
        let response: Response = response.dyn_into()?;

        if !response.ok() {
            return Err(JsValue::from_str(&format!(
                "{} {} failed: {}",
                request.method(),
                request.url(),
                response.status()
            )));
        }

        let text = JsFuture::from(response.text()?).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("Response body is not text"))
    }

    pub async fn get_text(&self, url: &str) -> Result<String, JsValue> {
        let request = self.build_request("GET", url, None)?;
        self.fetch_text(&request).await
    }

    /// Any method, with an optional JSON body
    pub async fn send(&self, method: &str, url: &str, body: Option<String>) -> Result<String, JsValue> {
        let request = self.build_request(method, url, body.as_deref())?;
        self.fetch_text(&request).await
    }
}
