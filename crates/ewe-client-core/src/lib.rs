//! Core logic for the EWE browser client
//!
//! Everything here is free of DOM access so it can be tested on the host.
//! The wasm app reads the page, feeds these types, and applies their
//! decisions back to the DOM.
//!
//! - [`validation`] / [`form`]: field rules and submit verdicts
//! - [`draft`] / [`debounce`]: debounced local drafts
//! - [`poll`]: balance and notification polling
//! - [`notify`]: notification model and bounded stack
//! - [`session`]: inactivity timeout
//! - [`csrf`], [`theme`], [`user`], [`format`]: page helpers

pub mod config;
pub mod csrf;
pub mod debounce;
pub mod draft;
pub mod error;
pub mod form;
pub mod format;
pub mod notify;
pub mod poll;
pub mod session;
pub mod theme;
pub mod user;
pub mod validation;

pub use config::ClientConfig;
pub use debounce::{Debouncer, RequestSequence};
pub use draft::{draft_key, DraftRecord, DraftStore, KeyValueStore, MemoryStore};
pub use error::{ClientError, Result};
pub use form::{validate_required_fields, FieldFeedback, FormVerdict};
pub use format::{format_balance, format_currency, format_date};
pub use notify::{Notification, NotificationStack, Severity};
pub use poll::{BalanceEnvelope, NotificationEnvelope, PollCycle, PollKind};
pub use session::{SessionGuard, SessionState};
pub use theme::Theme;
pub use user::CurrentUser;
pub use validation::{validate, FieldDescriptor, FieldRule, RuleSet, ValidationResult};
