//! Notification model, lifecycle timings and the bounded stack

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;

pub const DEFAULT_DURATION_MS: u32 = 5000;
pub const ENTER_DELAY_MS: u32 = 100;
pub const EXIT_DELAY_MS: u32 = 300;
pub const DEFAULT_MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Unknown names fall back to `Info`
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Tailwind classes for the inner panel
    pub fn classes(&self) -> &'static str {
        match self {
            Severity::Success => "bg-green-50 border-green-400 text-green-800",
            Severity::Error => "bg-red-50 border-red-400 text-red-800",
            Severity::Warning => "bg-yellow-50 border-yellow-400 text-yellow-800",
            Severity::Info => "bg-blue-50 border-blue-400 text-blue-800",
        }
    }
}

impl FromStr for Severity {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(ClientError::UnknownSeverity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// 0 keeps the notification until it is closed by hand
    pub duration_ms: u32,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity, duration_ms: u32) -> Self {
        Self {
            message: message.into(),
            severity,
            duration_ms,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info, DEFAULT_DURATION_MS)
    }

    pub fn is_persistent(&self) -> bool {
        self.duration_ms == 0
    }

    pub fn timeline(&self, enter_delay_ms: u32, exit_delay_ms: u32) -> Timeline {
        Timeline {
            enter_at_ms: enter_delay_ms,
            exit_at_ms: (!self.is_persistent()).then_some(self.duration_ms),
            remove_at_ms: (!self.is_persistent())
                .then(|| self.duration_ms.saturating_add(exit_delay_ms)),
        }
    }
}

/// Offsets from creation at which the presenter acts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeline {
    /// Slide-in class removed
    pub enter_at_ms: u32,
    /// Slide-out class added; `None` for persistent notifications
    pub exit_at_ms: Option<u32>,
    /// Element detached; `None` for persistent notifications
    pub remove_at_ms: Option<u32>,
}

impl Timeline {
    /// Whether the element is still in the DOM `elapsed_ms` after creation
    pub fn is_attached_at(&self, elapsed_ms: u32) -> bool {
        self.remove_at_ms.map_or(true, |remove_at| elapsed_ms < remove_at)
    }
}

pub type NotificationId = u64;

/// Ids of live notifications, oldest first, bounded by `max_visible`
#[derive(Debug, Clone)]
pub struct NotificationStack {
    max_visible: usize,
    next_id: NotificationId,
    live: VecDeque<NotificationId>,
}

impl NotificationStack {
    pub fn new(max_visible: usize) -> Self {
        Self {
            max_visible: max_visible.max(1),
            next_id: 1,
            live: VecDeque::new(),
        }
    }

    /// Allocate an id for a new notification.
    ///
    /// Returns the new id and the ids evicted to stay within the cap; the
    /// caller must detach those elements.
    pub fn push(&mut self) -> (NotificationId, Vec<NotificationId>) {
        let mut evicted = Vec::new();
        while self.live.len() >= self.max_visible {
            if let Some(oldest) = self.live.pop_front() {
                evicted.push(oldest);
            }
        }
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "evicting oldest notifications");
        }

        let id = self.next_id;
        self.next_id += 1;
        self.live.push_back(id);
        (id, evicted)
    }

    /// Forget a notification; false if it was already gone
    pub fn remove(&mut self, id: NotificationId) -> bool {
        match self.live.iter().position(|live| *live == id) {
            Some(index) => {
                self.live.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.live.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }
}

impl Default for NotificationStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE)
    }
}
