//! Browser bindings for the EWE member pages
//!
//! All behaviour lives in Rust; the page only loads the module and calls
//! `boot()` once the DOM is ready. Components are attached through data
//! attributes rendered by the server templates.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { boot } from './pkg/ewe_web_wasm.js';
//!
//! await init();
//! const app = boot();
//!
//! app.showNotification('Profile updated', 'success');
//! app.openModal('withdraw-modal');
//! const draft = app.restoreDraft('profile');
//! const body = await app.send('POST', '/api/withdraw/', JSON.stringify({ amount: 500 }));
//! ```
//!
//! ## Page hooks
//!
//! | Markup                         | Behaviour                                   |
//! |--------------------------------|---------------------------------------------|
//! | `form[data-validate]`          | field validation on blur and submit         |
//! | `form[data-autosave]`          | debounced local drafts                      |
//! | `[data-balance="key"]`         | live balance refresh                        |
//! | `[data-theme-toggle]`          | light/dark switch                           |
//! | `[data-modal-open="id"]`       | open a modal                                |
//! | `[data-dropdown-toggle]`       | toggle `#dropdown`                          |
//! | `[data-tooltip]`               | hover tooltip                               |
//! | `[data-copy]`                  | copy to clipboard                           |
//! | `[data-confirm]`               | confirm before the default action           |

pub mod app;
pub mod autosave;
pub mod dom;
pub mod forms;
pub mod http;
pub mod logging;
pub mod notifications;
pub mod page;
pub mod poller;
pub mod session_guard;

use wasm_bindgen::prelude::*;

pub use app::{boot, EweApp};

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if !logging::init(tracing::Level::INFO) {
        dom::warn("tracing subscriber already installed");
    }
    dom::log("EWE MLM Platform module loaded");
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
