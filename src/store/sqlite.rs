use crate::ports::store::{RegisterOutcome, StoreError, SubscriptionStore, validate_registration};
use crate::types::{StoredSubscription, Subscription};

use std::path::Path;
use std::pin::Pin;
use time::OffsetDateTime;
use tokio_rusqlite::{Connection, params, rusqlite};

/// Persisted subscription store: one row per (user, device) pair, so a user
/// keeps receiving notifications on every registered device across server
/// restarts.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS push_subscriptions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    endpoint    TEXT NOT NULL,
    p256dh      TEXT NOT NULL,
    auth        TEXT NOT NULL,
    device_info TEXT,
    updated_at  INTEGER NOT NULL,
    UNIQUE (user_id, endpoint)
);
CREATE INDEX IF NOT EXISTS idx_push_subscriptions_user
    ON push_subscriptions (user_id);
";

impl SqliteStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| backend(err.into()))?;
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(backend)?;
        Ok(Self { conn })
    }
}

fn backend(err: tokio_rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn stored_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredSubscription> {
    let updated_at: i64 = row.get("updated_at")?;
    Ok(StoredSubscription {
        subscription: Subscription {
            endpoint: row.get("endpoint")?,
            p256dh: row.get("p256dh")?,
            auth: row.get("auth")?,
        },
        device_info: row.get("device_info")?,
        updated_at: OffsetDateTime::from_unix_timestamp(updated_at)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH),
    })
}

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

impl SubscriptionStore for SqliteStore {
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
        Box::pin(async move {
            validate_registration(user_id, &subscription)?;
            let user_id = user_id.to_string();
            let now = OffsetDateTime::now_utc().unix_timestamp();
            self.conn
                .call(move |conn| {
                    let existing: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM push_subscriptions
                         WHERE user_id = ?1 AND endpoint = ?2",
                        params![user_id, subscription.endpoint],
                        |row| row.get(0),
                    )?;

                    conn.execute(
                        "INSERT INTO push_subscriptions
                             (user_id, endpoint, p256dh, auth, device_info, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                         ON CONFLICT (user_id, endpoint) DO UPDATE SET
                             p256dh = excluded.p256dh,
                             auth = excluded.auth,
                             device_info = excluded.device_info,
                             updated_at = excluded.updated_at",
                        params![
                            user_id,
                            subscription.endpoint,
                            subscription.p256dh,
                            subscription.auth,
                            device_info,
                            now
                        ],
                    )?;

                    let total_devices: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM push_subscriptions WHERE user_id = ?1",
                        params![user_id],
                        |row| row.get(0),
                    )?;
                    let total_users: i64 = conn.query_row(
                        "SELECT COUNT(DISTINCT user_id) FROM push_subscriptions",
                        [],
                        |row| row.get(0),
                    )?;

                    Ok(RegisterOutcome {
                        replaced: existing > 0,
                        total_devices: total_devices as usize,
                        total_users: total_users as usize,
                    })
                })
                .await
                .map_err(backend)
        })
    }

    fn list_for<'a>(&'a self, user_id: &'a str) -> Self::ListForFut<'a> {
        Box::pin(async move {
            let user_id = user_id.to_string();
            self.conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(
                        "SELECT endpoint, p256dh, auth, device_info, updated_at
                         FROM push_subscriptions
                         WHERE user_id = ?1
                         ORDER BY id",
                    )?;
                    let devices = stmt
                        .query_map(params![user_id], stored_from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    Ok(devices)
                })
                .await
                .map_err(backend)
        })
    }

    fn list_all<'a>(&'a self) -> Self::ListAllFut<'a> {
        Box::pin(async move {
            self.conn
                .call(|conn| {
                    let mut stmt = conn.prepare(
                        "SELECT user_id, endpoint, p256dh, auth, device_info, updated_at
                         FROM push_subscriptions
                         ORDER BY user_id, id",
                    )?;
                    let all = stmt
                        .query_map([], |row| {
                            let user_id: String = row.get("user_id")?;
                            Ok((user_id, stored_from_row(row)?))
                        })?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    Ok(all)
                })
                .await
                .map_err(backend)
        })
    }

    fn remove<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a> {
        Box::pin(async move {
            let endpoint = endpoint.to_string();
            self.conn
                .call(move |conn| {
                    let deleted = conn.execute(
                        "DELETE FROM push_subscriptions WHERE endpoint = ?1",
                        params![endpoint],
                    )?;
                    Ok(deleted > 0)
                })
                .await
                .map_err(backend)
        })
    }

    fn count_users<'a>(&'a self) -> Self::CountUsersFut<'a> {
        Box::pin(async move {
            self.conn
                .call(|conn| {
                    let count: i64 = conn.query_row(
                        "SELECT COUNT(DISTINCT user_id) FROM push_subscriptions",
                        [],
                        |row| row.get(0),
                    )?;
                    Ok(count as usize)
                })
                .await
                .map_err(backend)
        })
    }
}
