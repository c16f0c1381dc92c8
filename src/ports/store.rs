use crate::types::{StoredSubscription, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The registration itself is malformed; the caller's fault.
    Invalid(&'static str),
    /// The backing store failed; the whole request fails.
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Invalid(reason) => f.write_str(reason),
            StoreError::Backend(reason) => write!(f, "subscription store failure: {reason}"),
        }
    }
}

/// Counts reported back to the subscriber after a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// True when an existing record for the same (user, endpoint) pair was
    /// replaced rather than a new one appended.
    pub replaced: bool,
    pub total_devices: usize,
    pub total_users: usize,
}

/// Mapping from user id to that user's set of push subscriptions.
///
/// Endpoints are unique within one user's set: registering an endpoint the
/// user already has replaces the stored record. Removal is keyed by
/// endpoint alone, which is unique per browser installation in practice.
pub trait SubscriptionStore: Clone + Send + Sync + 'static {
    type RegisterFut<'a>: Future<Output = Result<RegisterOutcome, StoreError>> + Send + 'a
    where
        Self: 'a;
    type ListForFut<'a>: Future<Output = Result<Vec<StoredSubscription>, StoreError>> + Send + 'a
    where
        Self: 'a;
    type ListAllFut<'a>: Future<Output = Result<Vec<(String, StoredSubscription)>, StoreError>>
        + Send
        + 'a
    where
        Self: 'a;
    type RemoveFut<'a>: Future<Output = Result<bool, StoreError>> + Send + 'a
    where
        Self: 'a;
    type CountUsersFut<'a>: Future<Output = Result<usize, StoreError>> + Send + 'a
    where
        Self: 'a;

    fn register<'a>(
        &'a self,
        user_id: &'a str,
        subscription: Subscription,
        device_info: Option<String>,
    ) -> Self::RegisterFut<'a>;

    fn list_for<'a>(&'a self, user_id: &'a str) -> Self::ListForFut<'a>;

    /// Every subscription across every user, grouped by user, in the
    /// store's stable order. Used for broadcast dispatch.
    fn list_all<'a>(&'a self) -> Self::ListAllFut<'a>;

    /// Deletes the subscription with this endpoint. Returns whether a
    /// record existed.
    fn remove<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a>;

    fn count_users<'a>(&'a self) -> Self::CountUsersFut<'a>;
}

/// Shared registration precondition for every store implementation.
pub(crate) fn validate_registration(
    user_id: &str,
    subscription: &Subscription,
) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::Invalid("userId must not be empty"));
    }
    if subscription.endpoint.trim().is_empty() {
        return Err(StoreError::Invalid("subscription endpoint must not be empty"));
    }
    Ok(())
}
