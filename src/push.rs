use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::ports::store::StoreError;
use crate::state::AppState;
use crate::types::DeliveryReport;

use serde_json::Value as JsonValue;

pub(crate) mod dispatcher;
pub mod vapid;

pub use dispatcher::{SendRate, UserDispatch};
pub use vapid::{VapidCredentials, VapidKeys, generate_vapid_credentials};

#[derive(Debug)]
pub enum NotifyError {
    Sender(String),
    Store(StoreError),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Sender(reason) => write!(f, "failed to init web-push: {reason}"),
            NotifyError::Store(err) => err.fmt(f),
        }
    }
}

pub(crate) async fn notify_user(
    state: &AppState,
    user_id: &str,
    title: &str,
    body: &str,
    data: Option<JsonValue>,
) -> Result<UserDispatch, NotifyError> {
    let sender = WebPushSender::new(state.vapid.clone())
        .map_err(|err| NotifyError::Sender(err.to_string()))?;
    dispatcher::notify_user_with(
        &state.store,
        &sender,
        &TokioTimeProvider,
        state.config.send_rate(),
        user_id,
        title,
        body,
        data,
    )
    .await
    .map_err(NotifyError::Store)
}

pub(crate) async fn notify_all(
    state: &AppState,
    title: &str,
    body: &str,
    data: Option<JsonValue>,
) -> Result<DeliveryReport, NotifyError> {
    let sender = WebPushSender::new(state.vapid.clone())
        .map_err(|err| NotifyError::Sender(err.to_string()))?;
    dispatcher::notify_all_with(
        &state.store,
        &sender,
        &TokioTimeProvider,
        state.config.send_rate(),
        title,
        body,
        data,
    )
    .await
    .map_err(NotifyError::Store)
}
