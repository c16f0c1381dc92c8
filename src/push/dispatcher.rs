use crate::ports;
use crate::ports::push::SendError;
use crate::ports::store::StoreError;
use crate::types::{DeliveryReport, NotificationPayload, StoredSubscription};

use serde_json::Value as JsonValue;
use std::time::Duration;

/// Outbound throttle: the dispatcher pauses between consecutive sends so a
/// broadcast does not burst the push relay. Zero means no pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendRate {
    per_second: u32,
}

impl SendRate {
    pub fn per_second(per_second: u32) -> Self {
        Self { per_second }
    }

    pub fn unthrottled() -> Self {
        Self::per_second(0)
    }

    fn pause(&self) -> Option<Duration> {
        (self.per_second > 0).then(|| Duration::from_millis(1000 / u64::from(self.per_second)))
    }
}

impl Default for SendRate {
    // Matches the 100ms pause the relay tolerates comfortably.
    fn default() -> Self {
        Self::per_second(10)
    }
}

/// Result of a single-user dispatch. A user without subscriptions is a
/// reportable condition for the caller, not an error.
#[derive(Debug)]
pub enum UserDispatch {
    NoSubscriptions,
    Delivered(DeliveryReport),
}

pub(crate) async fn notify_user_with<St, S, T>(
    store: &St,
    sender: &S,
    time: &T,
    rate: SendRate,
    user_id: &str,
    title: &str,
    body: &str,
    data: Option<JsonValue>,
) -> Result<UserDispatch, StoreError>
where
    St: ports::SubscriptionStore,
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let devices = store.list_for(user_id).await?;
    if devices.is_empty() {
        return Ok(UserDispatch::NoSubscriptions);
    }

    let payload = NotificationPayload::for_user(title, body, data, time.now());
    let targets: Vec<(String, StoredSubscription)> = devices
        .into_iter()
        .map(|stored| (user_id.to_string(), stored))
        .collect();
    let report = deliver(store, sender, time, rate, &payload, targets).await;
    Ok(UserDispatch::Delivered(report))
}

pub(crate) async fn notify_all_with<St, S, T>(
    store: &St,
    sender: &S,
    time: &T,
    rate: SendRate,
    title: &str,
    body: &str,
    data: Option<JsonValue>,
) -> Result<DeliveryReport, StoreError>
where
    St: ports::SubscriptionStore,
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let targets = store.list_all().await?;
    let payload = NotificationPayload::broadcast(title, body, data, time.now());
    Ok(deliver(store, sender, time, rate, &payload, targets).await)
}

/// Sequential per-device delivery in store order. One device's failure
/// never aborts the batch; endpoints the relay reports gone are evicted
/// best-effort.
async fn deliver<St, S, T>(
    store: &St,
    sender: &S,
    time: &T,
    rate: SendRate,
    payload: &NotificationPayload,
    targets: Vec<(String, StoredSubscription)>,
) -> DeliveryReport
where
    St: ports::SubscriptionStore,
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    let message = serde_json::to_string(payload).expect("payload serialization");
    let mut report = DeliveryReport::default();
    let mut sent_any = false;

    for (user, stored) in targets {
        // Undeliverable records are skipped outright: neither sent nor
        // failed.
        if !stored.subscription.is_deliverable() {
            continue;
        }

        if sent_any && let Some(pause) = rate.pause() {
            time.sleep(pause).await;
        }
        sent_any = true;

        match sender.send(&stored.subscription, &message).await {
            Ok(()) => report.record_success(&user, stored.device_label()),
            Err(err) => {
                report.record_failure(&user, stored.device_label(), err.to_string());
                if err == SendError::EndpointGone {
                    evict(store, &user, &stored.subscription.endpoint).await;
                }
            }
        }
    }

    report
}

/// Eviction is an optimization, not a correctness requirement; its own
/// failure is logged and swallowed.
async fn evict<St: ports::SubscriptionStore>(store: &St, user: &str, endpoint: &str) {
    match store.remove(endpoint).await {
        Ok(true) => eprintln!("push eviction: removed gone endpoint for '{user}'"),
        Ok(false) => {}
        Err(err) => eprintln!("push eviction failed for '{user}', subscription kept: {err}"),
    }
}
