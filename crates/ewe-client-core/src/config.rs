//! Client configuration
//!
//! Every field has a default matching the server's conventions, so a page
//! only needs to embed the values it wants to change:
//!
//! ```html
//! <script type="application/json" id="ewe-config">
//!   { "balance_period_ms": 15000, "max_notifications": 3 }
//! </script>
//! ```

use crate::error::{ClientError, Result};
use crate::session::ACTIVITY_EVENTS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Id of the optional `<script>` element carrying overrides
pub const CONFIG_ELEMENT_ID: &str = "ewe-config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub balance_endpoint: String,
    pub notifications_endpoint: String,
    pub balance_period_ms: u32,
    pub notification_period_ms: u32,
    /// Quiet period before a draft is written
    pub autosave_quiet_ms: u32,
    pub save_indicator_ms: u32,
    pub notification_duration_ms: u32,
    pub notification_enter_delay_ms: u32,
    pub notification_exit_delay_ms: u32,
    pub max_notifications: usize,
    pub copy_notice_ms: u32,
    pub session_timeout_ms: u32,
    pub logout_url: String,
    /// DOM events that restart the session countdown
    pub activity_events: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            balance_endpoint: "/api/balance-update/".to_string(),
            notifications_endpoint: "/api/notifications/".to_string(),
            balance_period_ms: 30_000,
            notification_period_ms: 60_000,
            autosave_quiet_ms: 1_000,
            save_indicator_ms: 2_000,
            notification_duration_ms: 5_000,
            notification_enter_delay_ms: 100,
            notification_exit_delay_ms: 300,
            max_notifications: 5,
            copy_notice_ms: 2_000,
            session_timeout_ms: 30 * 60 * 1000,
            logout_url: "/auth/logout/".to_string(),
            activity_events: ACTIVITY_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate overrides
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Use embedded overrides when present and valid, defaults otherwise
    pub fn from_embedded(json: Option<&str>) -> Self {
        let Some(json) = json.map(str::trim).filter(|j| !j.is_empty()) else {
            return Self::default();
        };

        match Self::from_json(json) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default client config");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("balance_period_ms", self.balance_period_ms),
            ("notification_period_ms", self.notification_period_ms),
            ("session_timeout_ms", self.session_timeout_ms),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ClientError::InvalidConfig(format!("{} must be positive", name)));
        }
        if self.max_notifications == 0 {
            return Err(ClientError::InvalidConfig(
                "max_notifications must be positive".to_string(),
            ));
        }
        if self.logout_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "logout_url must not be empty".to_string(),
            ));
        }
        if self.activity_events.iter().any(|e| e.trim().is_empty()) {
            return Err(ClientError::InvalidConfig(
                "activity_events must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }

    pub fn balance_period(&self) -> Duration {
        Duration::from_millis(self.balance_period_ms.into())
    }

    pub fn notification_period(&self) -> Duration {
        Duration::from_millis(self.notification_period_ms.into())
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms.into())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms.into())
    }
}
