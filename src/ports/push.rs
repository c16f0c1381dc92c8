use crate::types::Subscription;

/// Classified failure of one push send. The dispatcher only needs one
/// distinction: endpoints the relay reports as permanently gone (HTTP
/// 404/410) are evicted from the store, everything else is left in place
/// for the next dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    EndpointGone,
    Failed(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::EndpointGone => f.write_str("endpoint no longer exists at the push relay"),
            SendError::Failed(reason) => f.write_str(reason),
        }
    }
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), SendError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, message: &'a str) -> Self::Fut<'a>;
}
