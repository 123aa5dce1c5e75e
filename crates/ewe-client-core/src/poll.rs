//! Live update polling: response envelopes and per-cycle bookkeeping

use crate::debounce::RequestSequence;
use crate::error::Result;
use crate::format::{format_balance, parse_amount};
use crate::notify::{Notification, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Which of the two independent loops a tick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollKind {
    Balances,
    Notifications,
}

impl fmt::Display for PollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollKind::Balances => write!(f, "balances"),
            PollKind::Notifications => write!(f, "notifications"),
        }
    }
}

/// `{ success, balances: { key: number | "numeric string" } }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub balances: BTreeMap<String, serde_json::Value>,
}

/// One entry of the notifications payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerNotification {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `{ success, notifications: [ { message, type } ] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notifications: Vec<ServerNotification>,
}

/// Text to write into every `[data-balance="<key>"]` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub key: String,
    pub text: String,
}

impl BalanceEnvelope {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Updates to apply, or nothing when the server reported failure.
    ///
    /// Values that are not numeric are skipped so the previous display stays.
    pub fn updates(&self) -> Vec<BalanceUpdate> {
        if !self.success {
            return Vec::new();
        }

        self.balances
            .iter()
            .filter_map(|(key, value)| match parse_amount(value) {
                Ok(amount) => Some(BalanceUpdate {
                    key: key.clone(),
                    text: format_balance(amount),
                }),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "skipping balance");
                    None
                }
            })
            .collect()
    }
}

impl NotificationEnvelope {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Notifications in server order; duplicates are kept
    pub fn into_notifications(self, duration_ms: u32) -> Vec<Notification> {
        if !self.success {
            return Vec::new();
        }

        self.notifications
            .into_iter()
            .map(|n| {
                let severity = n
                    .kind
                    .as_deref()
                    .map(Severity::parse_lossy)
                    .unwrap_or_default();
                Notification::new(n.message, severity, duration_ms)
            })
            .collect()
    }
}

/// State for one repeating fetch-and-apply loop
///
/// Ticks never stop the loop on failure and never overlap: while a request
/// is outstanding further ticks are skipped. Each tick is numbered; a
/// response is only applied if its number is still the latest and the cycle
/// is running.
#[derive(Debug, Clone)]
pub struct PollCycle {
    kind: PollKind,
    period: Duration,
    sequence: RequestSequence,
    in_flight: Option<u64>,
    skipped: u64,
    stopped: bool,
    applied: u64,
    failures: u64,
}

impl PollCycle {
    pub fn new(kind: PollKind, period: Duration) -> Self {
        Self {
            kind,
            period,
            sequence: RequestSequence::new(),
            in_flight: None,
            skipped: 0,
            stopped: false,
            applied: 0,
            failures: 0,
        }
    }

    pub fn kind(&self) -> PollKind {
        self.kind
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a tick, returning its sequence number.
    ///
    /// `None` once stopped or while the previous request is still out.
    pub fn begin_tick(&mut self) -> Option<u64> {
        if self.stopped {
            return None;
        }
        if let Some(outstanding) = self.in_flight {
            self.skipped += 1;
            tracing::debug!(cycle = %self.kind, outstanding, "previous poll still in flight");
            return None;
        }
        let sequence = self.sequence.issue();
        self.in_flight = Some(sequence);
        Some(sequence)
    }

    /// The request for `sequence` settled; returns whether its response may
    /// be applied
    pub fn finish_tick(&mut self, sequence: u64) -> bool {
        if self.in_flight == Some(sequence) {
            self.in_flight = None;
        }
        self.should_apply(sequence)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ticks dropped because a request was still outstanding
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Whether a response for `sequence` may touch the DOM
    pub fn should_apply(&self, sequence: u64) -> bool {
        if self.stopped {
            return false;
        }
        let current = self.sequence.is_current(sequence);
        if !current {
            tracing::debug!(
                cycle = %self.kind,
                sequence,
                latest = self.sequence.latest(),
                "discarding stale poll response"
            );
        }
        current
    }

    pub fn record_applied(&mut self) {
        self.applied += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_balance_updates() {
        let envelope = BalanceEnvelope::parse(
            r#"{"success": true, "balances": {"account": "1500.5", "today": 20}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.updates(),
            vec![
                BalanceUpdate {
                    key: "account".to_string(),
                    text: "₹1500.50".to_string(),
                },
                BalanceUpdate {
                    key: "today".to_string(),
                    text: "₹20.00".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_balance_failure_applies_nothing() {
        let envelope =
            BalanceEnvelope::parse(r#"{"success": false, "balances": {"account": 1}}"#).unwrap();
        assert!(envelope.updates().is_empty());
    }

    #[test]
    fn test_balance_non_numeric_skipped() {
        let envelope = BalanceEnvelope::parse(
            r#"{"success": true, "balances": {"account": "n/a", "total": "10"}}"#,
        )
        .unwrap();
        let keys: Vec<String> = envelope.updates().into_iter().map(|u| u.key).collect();
        assert_eq!(keys, vec!["total".to_string()]);
    }

    #[test]
    fn test_malformed_envelope_is_error() {
        assert!(BalanceEnvelope::parse("<html>").is_err());
        assert!(NotificationEnvelope::parse("").is_err());
    }

    #[test]
    fn test_missing_success_treated_as_failure() {
        let envelope = BalanceEnvelope::parse(r#"{"balances": {"a": 1}}"#).unwrap();
        assert!(envelope.updates().is_empty());
    }

    #[test]
    fn test_notifications_in_order_with_duplicates() {
        let envelope = NotificationEnvelope::parse(
            r#"{"success": true, "notifications": [
                {"message": "Payout sent", "type": "success"},
                {"message": "Payout sent", "type": "success"},
                {"message": "KYC pending", "type": "urgent"},
                {"message": "Hello"}
            ]}"#,
        )
        .unwrap();
        let notifications = envelope.into_notifications(5000);
        let summary: Vec<(&str, Severity)> = notifications
            .iter()
            .map(|n| (n.message.as_str(), n.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Payout sent", Severity::Success),
                ("Payout sent", Severity::Success),
                ("KYC pending", Severity::Info),
                ("Hello", Severity::Info),
            ]
        );
    }

    #[test]
    fn test_ticks_do_not_overlap() {
        let mut cycle = PollCycle::new(PollKind::Balances, Duration::from_secs(30));
        let first = cycle.begin_tick().unwrap();
        assert_eq!(cycle.begin_tick(), None);
        assert!(cycle.is_in_flight());
        assert!(cycle.finish_tick(first));
        assert!(!cycle.is_in_flight());
        assert!(cycle.begin_tick().is_some());
        assert_eq!(cycle.skipped(), 1);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut cycle = PollCycle::new(PollKind::Balances, Duration::from_secs(30));
        let old = cycle.sequence.issue();
        let latest = cycle.begin_tick().unwrap();
        assert!(!cycle.finish_tick(old));
        assert!(cycle.is_in_flight());
        assert!(cycle.finish_tick(latest));
    }

    #[test]
    fn test_slow_endpoint_still_updates() {
        // 30 s period, every response takes 31 s
        let period_ms = 30_000u64;
        let latency_ms = 31_000u64;
        let mut cycle = PollCycle::new(PollKind::Balances, Duration::from_millis(period_ms));
        let mut outstanding: Option<(u64, u64)> = None;

        for tick in 1..=20u64 {
            let now = tick * period_ms;
            if let Some((sequence, done_at)) = outstanding {
                if done_at <= now {
                    if cycle.finish_tick(sequence) {
                        cycle.record_applied();
                    }
                    outstanding = None;
                }
            }
            if let Some(sequence) = cycle.begin_tick() {
                outstanding = Some((sequence, now + latency_ms));
            }
        }

        assert_eq!(cycle.applied(), 9);
        assert_eq!(cycle.skipped(), 10);
    }

    #[test]
    fn test_stopped_cycle_issues_and_applies_nothing() {
        let mut cycle = PollCycle::new(PollKind::Notifications, Duration::from_secs(60));
        let in_flight = cycle.begin_tick().unwrap();
        cycle.stop();
        assert!(!cycle.finish_tick(in_flight));
        assert_eq!(cycle.begin_tick(), None);
    }

    #[test]
    fn test_cycles_are_independent() {
        let mut balances = PollCycle::new(PollKind::Balances, Duration::from_secs(30));
        let mut notifications = PollCycle::new(PollKind::Notifications, Duration::from_secs(60));

        balances.record_failure();
        balances.stop();

        let tick = notifications.begin_tick().unwrap();
        assert!(notifications.finish_tick(tick));
        notifications.record_applied();
        assert_eq!(notifications.applied(), 1);
        assert_eq!(balances.failures(), 1);
        assert!(!notifications.is_stopped());
    }

    #[test]
    fn test_failure_does_not_stop_cycle() {
        let mut cycle = PollCycle::new(PollKind::Balances, Duration::from_secs(30));
        let tick = cycle.begin_tick().unwrap();
        cycle.finish_tick(tick);
        cycle.record_failure();
        assert!(cycle.begin_tick().is_some());
    }
}
