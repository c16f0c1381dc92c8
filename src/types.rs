use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

/// The delivery material of one browser push subscription: the relay
/// endpoint plus the two encryption keys the relay requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

impl Subscription {
    /// A subscription missing any of its three fields cannot be delivered
    /// to and is skipped by the dispatcher.
    pub fn is_deliverable(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.p256dh.trim().is_empty()
            && !self.auth.trim().is_empty()
    }
}

/// One stored row: a subscription plus its registration metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSubscription {
    pub subscription: Subscription,
    pub device_info: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredSubscription {
    /// Label used in delivery results: the free-text device info when the
    /// client sent one, otherwise the endpoint itself.
    pub fn device_label(&self) -> String {
        match self.device_info.as_deref() {
            Some(info) if !info.trim().is_empty() => info.to_string(),
            _ => self.subscription.endpoint.clone(),
        }
    }
}

/// The JSON document delivered to a device and rendered by the service
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    /// Unix milliseconds at build time, for ordering and display.
    pub timestamp: i64,
}

pub const DEFAULT_ICON: &str = "/static/icons/icon-192.png";
pub const DEFAULT_BADGE: &str = "/static/icons/badge-72.png";
pub const USER_TAG: &str = "fluxo-notification";
pub const BROADCAST_TAG: &str = "fluxo-broadcast";

impl NotificationPayload {
    pub fn for_user(title: &str, body: &str, data: Option<JsonValue>, now: OffsetDateTime) -> Self {
        Self::with_tag(USER_TAG, title, body, data, now)
    }

    pub fn broadcast(title: &str, body: &str, data: Option<JsonValue>, now: OffsetDateTime) -> Self {
        Self::with_tag(BROADCAST_TAG, title, body, data, now)
    }

    fn with_tag(
        tag: &str,
        title: &str,
        body: &str,
        data: Option<JsonValue>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            tag: tag.to_string(),
            require_interaction: true,
            data,
            timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

/// Outcome of one send attempt to one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub user: String,
    pub device: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of one dispatch operation. `sent + failed == total` always
/// holds; skipped (undeliverable) subscriptions are counted nowhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<DeliveryResult>,
}

impl DeliveryReport {
    pub fn record_success(&mut self, user: &str, device: String) {
        self.sent += 1;
        self.total += 1;
        self.results.push(DeliveryResult {
            user: user.to_string(),
            device,
            status: DeliveryStatus::Success,
            error: None,
        });
    }

    pub fn record_failure(&mut self, user: &str, device: String, error: String) {
        self.failed += 1;
        self.total += 1;
        self.results.push(DeliveryResult {
            user: user.to_string(),
            device,
            status: DeliveryStatus::Failed,
            error: Some(error),
        });
    }

    pub fn success(&self) -> bool {
        self.sent > 0
    }
}
