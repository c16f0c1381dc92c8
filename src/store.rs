use crate::ports::store::{RegisterOutcome, StoreError, SubscriptionStore};
use crate::types::{StoredSubscription, Subscription};

use std::path::Path;
use std::pin::Pin;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// The configured store backend. Memory is the default and forgets every
/// subscription on restart; clients re-register on next app load. Sqlite
/// survives restarts and is selected with `--database`.
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub async fn open_sqlite(path: &Path) -> Result<Self, StoreError> {
        Ok(Store::Sqlite(SqliteStore::open(path).await?))
    }
}

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

impl SubscriptionStore for Store {
    type RegisterFut<'a>
        = BoxFut<'a, RegisterOutcome>
    where
        Self: 'a;
    type ListForFut<'a>
        = BoxFut<'a, Vec<StoredSubscription>>
    where
        Self: 'a;
    type ListAllFut<'a>
        = BoxFut<'a, Vec<(String, StoredSubscription)>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = BoxFut<'a, bool>
    where
        Self: 'a;
    type CountUsersFut<'a>
        = BoxFut<'a, usize>
    where
        Self: 'a;

    fn register<'a>(
        &'a self,
        user_id: &'a str,
        subscription: Subscription,
        device_info: Option<String>,
    ) -> Self::RegisterFut<'a> {
        match self {
            Store::Memory(store) => Box::pin(store.register(user_id, subscription, device_info)),
            Store::Sqlite(store) => Box::pin(store.register(user_id, subscription, device_info)),
        }
    }

    fn list_for<'a>(&'a self, user_id: &'a str) -> Self::ListForFut<'a> {
        match self {
            Store::Memory(store) => Box::pin(store.list_for(user_id)),
            Store::Sqlite(store) => Box::pin(store.list_for(user_id)),
        }
    }

    fn list_all<'a>(&'a self) -> Self::ListAllFut<'a> {
        match self {
            Store::Memory(store) => Box::pin(store.list_all()),
            Store::Sqlite(store) => Box::pin(store.list_all()),
        }
    }

    fn remove<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a> {
        match self {
            Store::Memory(store) => Box::pin(store.remove(endpoint)),
            Store::Sqlite(store) => Box::pin(store.remove(endpoint)),
        }
    }

    fn count_users<'a>(&'a self) -> Self::CountUsersFut<'a> {
        match self {
            Store::Memory(store) => Box::pin(store.count_users()),
            Store::Sqlite(store) => Box::pin(store.count_users()),
        }
    }
}
