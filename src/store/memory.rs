use crate::ports::store::{RegisterOutcome, StoreError, SubscriptionStore, validate_registration};
use crate::types::{StoredSubscription, Subscription};

use std::collections::BTreeMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

/// In-memory subscription store. BTreeMap so that `list_all` has a stable
/// user order for broadcast dispatch. No locking subtlety: every operation
/// takes the one mutex for its full duration.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<BTreeMap<String, Vec<StoredSubscription>>>>,
}

impl SubscriptionStore for MemoryStore {
    type RegisterFut<'a>
        = Ready<Result<RegisterOutcome, StoreError>>
    where
        Self: 'a;
    type ListForFut<'a>
        = Ready<Result<Vec<StoredSubscription>, StoreError>>
    where
        Self: 'a;
    type ListAllFut<'a>
        = Ready<Result<Vec<(String, StoredSubscription)>, StoreError>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = Ready<Result<bool, StoreError>>
    where
        Self: 'a;
    type CountUsersFut<'a>
        = Ready<Result<usize, StoreError>>
    where
        Self: 'a;

    fn register<'a>(
        &'a self,
        user_id: &'a str,
        subscription: Subscription,
        device_info: Option<String>,
    ) -> Self::RegisterFut<'a> {
        if let Err(err) = validate_registration(user_id, &subscription) {
            return ready(Err(err));
        }

        let mut users = self.users.lock().expect("subscription map lock");
        let record = StoredSubscription {
            subscription,
            device_info,
            updated_at: OffsetDateTime::now_utc(),
        };
        let devices = users.entry(user_id.to_string()).or_default();
        let existing = devices
            .iter_mut()
            .find(|stored| stored.subscription.endpoint == record.subscription.endpoint);
        let replaced = match existing {
            Some(stored) => {
                *stored = record;
                true
            }
            None => {
                devices.push(record);
                false
            }
        };

        ready(Ok(RegisterOutcome {
            replaced,
            total_devices: devices.len(),
            total_users: users.len(),
        }))
    }

    fn list_for<'a>(&'a self, user_id: &'a str) -> Self::ListForFut<'a> {
        let users = self.users.lock().expect("subscription map lock");
        ready(Ok(users.get(user_id).cloned().unwrap_or_default()))
    }

    fn list_all<'a>(&'a self) -> Self::ListAllFut<'a> {
        let users = self.users.lock().expect("subscription map lock");
        let all = users
            .iter()
            .flat_map(|(user_id, devices)| {
                devices
                    .iter()
                    .map(|stored| (user_id.clone(), stored.clone()))
            })
            .collect();
        ready(Ok(all))
    }

    fn remove<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a> {
        let mut users = self.users.lock().expect("subscription map lock");
        let mut removed = false;
        users.retain(|_, devices| {
            devices.retain(|stored| {
                let matches = stored.subscription.endpoint == endpoint;
                removed |= matches;
                !matches
            });
            !devices.is_empty()
        });
        ready(Ok(removed))
    }

    fn count_users<'a>(&'a self) -> Self::CountUsersFut<'a> {
        let users = self.users.lock().expect("subscription map lock");
        ready(Ok(users.len()))
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn subscription(endpoint: &str) -> Subscription {
        Subscription {
            endpoint: endpoint.to_string(),
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
        }
    }

    #[tokio::test]
    async fn register__should_replace_same_endpoint_for_same_user() {
        // Given
        let store = MemoryStore::default();
        store
            .register("alice", subscription("https://push.example/e1"), None)
            .await
            .expect("first register");

        // When
        let outcome = store
            .register(
                "alice",
                subscription("https://push.example/e1"),
                Some("Chrome on desktop".to_string()),
            )
            .await
            .expect("second register");

        // Then
        assert!(outcome.replaced);
        assert_eq!(outcome.total_devices, 1);
        let devices = store.list_for("alice").await.expect("list");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_info.as_deref(), Some("Chrome on desktop"));
    }

    #[tokio::test]
    async fn register__should_append_distinct_endpoints() {
        // Given
        let store = MemoryStore::default();

        // When
        store
            .register("alice", subscription("https://push.example/e1"), None)
            .await
            .expect("register e1");
        let outcome = store
            .register("alice", subscription("https://push.example/e2"), None)
            .await
            .expect("register e2");

        // Then
        assert!(!outcome.replaced);
        assert_eq!(outcome.total_devices, 2);
        assert_eq!(store.list_for("alice").await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn register__should_reject_empty_user_and_endpoint() {
        // Given
        let store = MemoryStore::default();

        // Then
        assert!(matches!(
            store
                .register(" ", subscription("https://push.example/e1"), None)
                .await,
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.register("alice", subscription(""), None).await,
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(store.count_users().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn remove__should_drop_subscription_and_empty_user() {
        // Given
        let store = MemoryStore::default();
        store
            .register("alice", subscription("https://push.example/e1"), None)
            .await
            .expect("register");

        // When
        let removed = store.remove("https://push.example/e1").await.expect("remove");

        // Then
        assert!(removed);
        assert!(store.list_for("alice").await.expect("list").is_empty());
        assert_eq!(store.count_users().await.expect("count"), 0);
        assert!(!store.remove("https://push.example/e1").await.expect("second remove"));
    }

    #[tokio::test]
    async fn list_all__should_group_by_user_in_stable_order() {
        // Given
        let store = MemoryStore::default();
        store
            .register("bob", subscription("https://push.example/b1"), None)
            .await
            .expect("register bob");
        store
            .register("alice", subscription("https://push.example/a1"), None)
            .await
            .expect("register alice");

        // When
        let all = store.list_all().await.expect("list all");

        // Then
        let order: Vec<&str> = all.iter().map(|(user, _)| user.as_str()).collect();
        assert_eq!(order, vec!["alice", "bob"]);
    }
}
